// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! The reference text is the key: any other text must not recover the
//! message.

use book_stego::{decode, decode_with_book, derive_keystream, encode, BookCipher, CoverImage, EmbedParams, StegoError};
use image::{Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const BOOK: &str = "Call me Ishmael. Some years ago - never mind how long precisely - having \
little or no money in my purse, and nothing particular to interest me on shore, I thought I \
would sail about a little and see the watery part of the world. It is a way I have of driving \
off the spleen and regulating the circulation.";

fn rgb_cover(w: u32, h: u32, seed: u64) -> Vec<u8> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let img = RgbImage::from_fn(w, h, |_, _| {
        let l: u8 = rng.gen_range(70..=180);
        Rgb([l, l, l])
    });
    CoverImage::Rgb(img).to_png().unwrap()
}

/// Wrong key must end in a typed error or, at worst, different text.
fn assert_not_recovered(result: Result<book_stego::DecodedMessage, StegoError>, message: &str) {
    match result {
        Ok(decoded) => assert_ne!(decoded.text, message, "wrong book recovered the message"),
        Err(StegoError::Uncorrectable | StegoError::InvalidText | StegoError::TruncatedPayload) => {}
        Err(e) => panic!("unexpected error kind: {e}"),
    }
}

#[test]
fn unrelated_book_fails() {
    let cover = rgb_cover(640, 480, 11);
    let params = EmbedParams::default();
    let message = "meet at noon";
    let stego = encode(&cover, message, BOOK, &params).unwrap();

    let other = "Happy families are all alike; every unhappy family is unhappy in its own way.";
    assert_not_recovered(decode(&stego, other, &params), message);
}

#[test]
fn empty_message_needs_the_right_book() {
    let cover = rgb_cover(256, 256, 13);
    let params = EmbedParams { parity_symbols: 8, repetition: 3, ..EmbedParams::default() };
    let stego = encode(&cover, "", BOOK, &params).unwrap();
    assert_eq!(decode(&stego, BOOK, &params).unwrap().text, "");

    let other = "It was the best of times, it was the worst of times.";
    let result = decode(&stego, other, &params);
    assert!(
        matches!(
            result,
            Err(StegoError::Uncorrectable | StegoError::InvalidText | StegoError::TruncatedPayload)
        ),
        "{result:?}"
    );
}

#[test]
fn single_character_edit_fails() {
    let cover = rgb_cover(640, 480, 12);
    let params = EmbedParams::default();
    let message = "meet at noon";
    let stego = encode(&cover, message, BOOK, &params).unwrap();

    let edited = BOOK.replacen("Ishmael", "Ishmaal", 1);
    assert_not_recovered(decode(&stego, &edited, &params), message);

    let truncated = &BOOK[..BOOK.len() - 1];
    assert_not_recovered(decode(&stego, truncated, &params), message);
}

#[test]
fn same_book_recovers() {
    let cover = rgb_cover(640, 480, 13);
    let params = EmbedParams::default();
    let stego = encode(&cover, "meet at noon", BOOK, &params).unwrap();

    let book = BookCipher::new(BOOK).unwrap();
    assert_eq!(decode_with_book(&stego, &book, &params).unwrap().text, "meet at noon");
}

#[test]
fn mismatched_parameters_fail() {
    let cover = rgb_cover(640, 480, 14);
    let stego = encode(&cover, "meet at noon", BOOK, &EmbedParams::default()).unwrap();

    let other = EmbedParams { repetition: 5, ..EmbedParams::default() };
    assert_not_recovered(decode(&stego, BOOK, &other), "meet at noon");
}

#[test]
fn keystream_is_reproducible_and_key_dependent() {
    let a = derive_keystream(BOOK, 4800).unwrap();
    let b = derive_keystream(BOOK, 4800).unwrap();
    assert_eq!(a, b);

    let c = derive_keystream(&BOOK.replacen('.', "!", 1), 4800).unwrap();
    let same = a.order().iter().zip(c.order()).filter(|(x, y)| x == y).count();
    assert!(same < 20, "{same} positions shared between different books");
}

#[test]
fn source_stats_report() {
    let stats = BookCipher::new("aab c").unwrap().stats();
    assert_eq!(stats.length, 5);
    assert_eq!(stats.unique_character_count, 4);
    assert_eq!(
        serde_json::to_string(&stats).unwrap(),
        r#"{"length":5,"uniqueCharacterCount":4}"#
    );
}
