// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Tied repetition votes become RS erasures.
//!
//! With an even repetition factor, flipping exactly half the copies of a bit
//! produces a tie. The byte holding that bit is then decoded as an erasure,
//! which costs one parity symbol instead of two.

use book_stego::stego::armor::embedding::{embed_bit, extract_bit};
use book_stego::stego::frame::HEADER_BITS;
use book_stego::{decode, derive_keystream, encode, CoverImage, EmbedParams, StegoError};
use image::{Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const BOOK: &str = "In a hole in the ground there lived a hobbit. Not a nasty, dirty, wet \
hole, filled with the ends of worms and an oozy smell, nor yet a dry, bare, sandy hole with \
nothing in it to sit down on or to eat: it was a hobbit-hole, and that means comfort.";

const MESSAGE: &str = "tie breaker";

fn params() -> EmbedParams {
    EmbedParams { strength: 150.0, parity_symbols: 16, repetition: 2 }
}

fn cover() -> Vec<u8> {
    let mut rng = ChaCha20Rng::seed_from_u64(31);
    let img = RgbImage::from_fn(256, 256, |_, _| {
        let l: u8 = rng.gen_range(70..=180);
        Rgb([l, l, l])
    });
    CoverImage::Rgb(img).to_png().unwrap()
}

/// Flip the first copy of the first bit of each listed codeword byte.
fn tie_bytes(stego: &[u8], bytes: impl IntoIterator<Item = usize>) -> Vec<u8> {
    let p = params();
    let mut img = CoverImage::from_bytes(stego).unwrap();
    let grid = img.luma_grid();
    let order = derive_keystream(BOOK, grid.total_blocks()).unwrap();

    let codeword_len = MESSAGE.len() + p.parity_symbols;
    let bit_count = codeword_len * 8;
    for byte in bytes {
        // Copy 0 of bit `8 * byte`.
        let slot = order.order()[HEADER_BITS + 8 * byte];
        assert!(slot < grid.total_blocks() && bit_count > 8 * byte);
        let (br, bc) = grid.coords(slot);
        let current = img.block_luma(br, bc);
        let mut target = current;
        embed_bit(&mut target, 1 - extract_bit(&current, p.strength), p.strength);
        img.apply_block(br, bc, &current, &target);
    }
    img.to_png().unwrap()
}

#[test]
fn ties_within_parity_are_corrected() {
    let stego = encode(&cover(), MESSAGE, BOOK, &params()).unwrap();
    let damaged = tie_bytes(&stego, 0..16);

    let decoded = decode(&damaged, BOOK, &params()).unwrap();
    assert_eq!(decoded.text, MESSAGE);
    assert_eq!(decoded.quality.vote_ties, 16);
    assert_eq!(decoded.quality.rs_erasures, 16);
    assert_eq!(decoded.quality.rs_errors_corrected, 0);
    assert!(decoded.quality.integrity_percent < 100);
}

#[test]
fn ties_beyond_parity_are_uncorrectable() {
    let stego = encode(&cover(), MESSAGE, BOOK, &params()).unwrap();
    let damaged = tie_bytes(&stego, 0..17);

    assert!(matches!(decode(&damaged, BOOK, &params()), Err(StegoError::Uncorrectable)));
}

#[test]
fn odd_repetition_never_ties() {
    let p = EmbedParams { repetition: 3, ..params() };
    let stego = encode(&cover(), MESSAGE, BOOK, &p).unwrap();
    let decoded = decode(&stego, BOOK, &p).unwrap();
    assert_eq!(decoded.quality.vote_ties, 0);
    assert_eq!(decoded.quality.rs_erasures, 0);
}
