// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Encode and decode pipelines.
//!
//! Encode: UTF-8 bytes -> RS codeword -> bits -> keyed whitening ->
//! repetition spread over the keyed slot order (after the 24 header slots)
//! -> one QIM bit per 8×8 luma block -> settle -> PNG.
//!
//! Decode: image -> per-block bits -> header from the first 24 keyed slots
//! -> majority vote per codeword bit (ties become RS erasures) -> remove
//! whitening -> RS decode -> UTF-8.
//!
//! Header and codeword bits are whitened with the book's mask, so a block
//! grid that reads all zeros (flat areas, covers without a message, carriers
//! wiped by heavy compression) does not parse as an empty message.

use serde::Serialize;
use tracing::{debug, trace};

use crate::raster::{CoverImage, LumaGrid};
use crate::stego::armor::ecc::{self, RsDecodeStats};
use crate::stego::armor::embedding::{coefficient_margin, embed_bit, extract_bit};
use crate::stego::armor::repetition::{self, Vote, VoteQuality};
use crate::stego::book::BookCipher;
use crate::stego::error::StegoError;
use crate::stego::frame::{self, HEADER_BITS, MAX_MESSAGE_LEN};
use crate::stego::params::EmbedParams;

/// Re-embed passes for blocks that read back wrong after pixel rounding and
/// clamping.
const SETTLE_PASSES: usize = 3;

/// Confidence report for a successful decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeQuality {
    /// RS symbol errors located and corrected.
    pub rs_errors_corrected: usize,
    /// RS symbols handed in as erasures (bytes holding a tied vote).
    pub rs_erasures: usize,
    /// Errors correctable without erasures across all RS blocks.
    pub rs_error_capacity: usize,
    /// Codeword bits whose repetition vote was an exact tie.
    pub vote_ties: usize,
    /// Codeword bits whose copies all agreed.
    pub unanimous_votes: usize,
    /// Mean fraction of copies agreeing with the majority (0.5..=1.0).
    pub mean_vote_agreement: f64,
    /// Mean distance of the read carriers from a decision boundary:
    /// 1.0 on a lattice point, 0.0 on a boundary.
    pub carrier_margin: f64,
    /// 100 = pristine, 0 = barely recovered.
    pub integrity_percent: u8,
}

impl DecodeQuality {
    fn from_stats(
        stats: &RsDecodeStats,
        votes: &VoteQuality,
        bit_count: usize,
        parity_len: usize,
        carrier_margin: f64,
    ) -> Self {
        let rs_health = if parity_len == 0 {
            1.0
        } else {
            1.0 - stats.max_block_errata as f64 / parity_len as f64
        };
        let mean_agreement = if bit_count == 0 { 1.0 } else { votes.mean_agreement };
        // Agreement 0.5 is a coin flip, 1.0 is unanimous.
        let vote_health = (mean_agreement - 0.5) * 2.0;
        let integrity = (rs_health.min(vote_health) * 100.0).round().clamp(0.0, 100.0) as u8;

        Self {
            rs_errors_corrected: stats.errors_corrected,
            rs_erasures: stats.erasures_filled,
            rs_error_capacity: stats.error_capacity,
            vote_ties: votes.ties,
            unanimous_votes: votes.unanimous,
            mean_vote_agreement: mean_agreement,
            carrier_margin,
            integrity_percent: integrity,
        }
    }
}

/// A recovered message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedMessage {
    pub text: String,
    /// UTF-8 length of `text`, as announced by the header.
    pub byte_len: usize,
    pub quality: DecodeQuality,
}

/// Hide `message` in a cover image, keyed by `reference_text`.
///
/// Returns a lossless PNG with the same dimensions and channel layout as the
/// cover.
///
/// # Errors
/// - [`StegoError::InvalidParameter`] if `params` fail validation.
/// - [`StegoError::InvalidKeyMaterial`] if `reference_text` is empty.
/// - [`StegoError::MalformedInput`] if the cover cannot be decoded.
/// - [`StegoError::CapacityExceeded`] if the message does not fit.
/// - [`StegoError::OutputEncoding`] if writing the PNG fails.
pub fn encode(
    image_bytes: &[u8],
    message: &str,
    reference_text: &str,
    params: &EmbedParams,
) -> Result<Vec<u8>, StegoError> {
    params.validate()?;
    let book = BookCipher::new(reference_text)?;
    encode_with_book(image_bytes, message, &book, params)
}

/// [`encode`] with an already indexed reference text.
pub fn encode_with_book(
    image_bytes: &[u8],
    message: &str,
    book: &BookCipher,
    params: &EmbedParams,
) -> Result<Vec<u8>, StegoError> {
    params.validate()?;
    let mut cover = CoverImage::from_bytes(image_bytes)?;
    let grid = cover.luma_grid();
    let capacity = grid.total_blocks();

    let payload = message.as_bytes();
    if payload.len() > MAX_MESSAGE_LEN {
        return Err(StegoError::CapacityExceeded);
    }
    let required = frame::required_blocks(payload.len(), params).ok_or(StegoError::CapacityExceeded)?;
    if required > capacity {
        debug!(required, capacity, "message does not fit");
        return Err(StegoError::CapacityExceeded);
    }

    let codeword = ecc::encode_symbols(payload, params.parity_symbols);
    let keystream = book.keystream(capacity)?;
    let order = keystream.order();

    let mut header = frame::encode_header(payload.len());
    let mut bits = repetition::bytes_to_bits(&codeword);
    let mask = book.whitening(HEADER_BITS + bits.len());
    for (bit, &m) in header.iter_mut().chain(bits.iter_mut()).zip(&mask) {
        *bit ^= m;
    }
    let assignments = repetition::spread(&bits, params.repetition, order, HEADER_BITS)?;

    debug!(
        blocks = capacity,
        message_bytes = payload.len(),
        codeword_bytes = codeword.len(),
        used_blocks = required,
        "embedding payload"
    );

    let placements: Vec<(usize, u8)> = order[..HEADER_BITS]
        .iter()
        .copied()
        .zip(header)
        .chain(assignments.placements(&bits))
        .collect();

    let unsettled = embed_placements(&mut cover, &grid, &placements, params.strength);
    if unsettled > 0 {
        debug!(unsettled, "blocks still reading the wrong bit after settling");
    }

    cover.to_png()
}

/// Write every `(slot, bit)` into the cover, then re-embed blocks that read
/// back wrong. Returns the number of blocks that never settled.
fn embed_placements(cover: &mut CoverImage, grid: &LumaGrid, placements: &[(usize, u8)], strength: f64) -> usize {
    for &(slot, bit) in placements {
        let (br, bc) = grid.coords(slot);
        let original = grid.block(slot);
        let mut target = *original;
        embed_bit(&mut target, bit, strength);
        cover.apply_block(br, bc, original, &target);
    }

    let mut pending = misread(cover, grid, placements, strength);
    for pass in 0..SETTLE_PASSES {
        if pending.is_empty() {
            break;
        }
        trace!(pass, blocks = pending.len(), "settling");
        for &(slot, bit) in &pending {
            let (br, bc) = grid.coords(slot);
            let current = cover.block_luma(br, bc);
            let mut target = current;
            embed_bit(&mut target, bit, strength);
            cover.apply_block(br, bc, &current, &target);
        }
        pending = misread(cover, grid, &pending, strength);
    }
    pending.len()
}

fn misread(cover: &CoverImage, grid: &LumaGrid, placements: &[(usize, u8)], strength: f64) -> Vec<(usize, u8)> {
    placements
        .iter()
        .copied()
        .filter(|&(slot, bit)| {
            let (br, bc) = grid.coords(slot);
            extract_bit(&cover.block_luma(br, bc), strength) != bit
        })
        .collect()
}

/// Recover a message hidden by [`encode`] with the same reference text and
/// parameters.
///
/// # Errors
/// - [`StegoError::InvalidParameter`] if `params` fail validation.
/// - [`StegoError::InvalidKeyMaterial`] if `reference_text` is empty.
/// - [`StegoError::MalformedInput`] if the image cannot be decoded.
/// - [`StegoError::TruncatedPayload`] if the header announces more data than
///   the image can hold or the decoded length disagrees with it.
/// - [`StegoError::Uncorrectable`] if RS correction fails.
/// - [`StegoError::InvalidText`] if the recovered bytes are not UTF-8.
pub fn decode(image_bytes: &[u8], reference_text: &str, params: &EmbedParams) -> Result<DecodedMessage, StegoError> {
    params.validate()?;
    let book = BookCipher::new(reference_text)?;
    decode_with_book(image_bytes, &book, params)
}

/// [`decode`] with an already indexed reference text.
pub fn decode_with_book(
    image_bytes: &[u8],
    book: &BookCipher,
    params: &EmbedParams,
) -> Result<DecodedMessage, StegoError> {
    params.validate()?;
    let cover = CoverImage::from_bytes(image_bytes)?;
    let grid = cover.luma_grid();
    let capacity = grid.total_blocks();
    if capacity < HEADER_BITS {
        return Err(StegoError::TruncatedPayload);
    }

    let keystream = book.keystream(capacity)?;
    let order = keystream.order();
    let observed = extract_all(&grid, params.strength);

    let header_mask = book.whitening(HEADER_BITS);
    let mut header = [0u8; HEADER_BITS];
    for ((bit, &slot), &m) in header.iter_mut().zip(&order[..HEADER_BITS]).zip(&header_mask) {
        *bit = observed[slot] ^ m;
    }
    let message_len = frame::decode_header(&header);
    trace!(message_len, "header");

    let required = frame::required_blocks(message_len, params).ok_or(StegoError::TruncatedPayload)?;
    if required > capacity {
        debug!(message_len, required, capacity, "header announces more than the image holds");
        return Err(StegoError::TruncatedPayload);
    }

    let codeword_len = ecc::rs_encoded_len(message_len, params.parity_symbols);
    let assignments = repetition::assign(codeword_len * 8, params.repetition, order, HEADER_BITS)?;
    let (mut votes, vote_quality) = repetition::collapse(&observed, &assignments);
    let mask = book.whitening(HEADER_BITS + assignments.bit_count());
    for (vote, &m) in votes.iter_mut().zip(&mask[HEADER_BITS..]) {
        if let Vote::Bit(b) = vote {
            *b ^= m;
        }
    }
    let (symbols, erasures) = repetition::votes_to_symbols(&votes);

    let (payload, stats) = ecc::decode_symbols(&symbols, params.parity_symbols, &erasures)?;
    debug!(
        errors = stats.errors_corrected,
        erasures = stats.erasures_filled,
        ties = vote_quality.ties,
        "payload recovered"
    );

    if payload.len() != message_len {
        return Err(StegoError::TruncatedPayload);
    }
    let margin = mean_carrier_margin(&grid, order[..HEADER_BITS].iter().chain(assignments.slots()), params.strength);
    let quality = DecodeQuality::from_stats(
        &stats,
        &vote_quality,
        assignments.bit_count(),
        params.parity_symbols,
        margin,
    );
    let text = String::from_utf8(payload).map_err(|_| StegoError::InvalidText)?;

    Ok(DecodedMessage {
        text,
        byte_len: message_len,
        quality,
    })
}

/// Mean [`coefficient_margin`] over `slots`, scaled to 0.0..=1.0.
fn mean_carrier_margin<'a>(grid: &LumaGrid, slots: impl Iterator<Item = &'a usize>, strength: f64) -> f64 {
    let (sum, count) = slots.fold((0.0, 0usize), |(sum, count), &slot| {
        (sum + coefficient_margin(grid.block(slot), strength), count + 1)
    });
    if count == 0 {
        0.0
    } else {
        2.0 * sum / count as f64
    }
}

/// Hard bit of every block, in block-raster order.
#[cfg(feature = "parallel")]
fn extract_all(grid: &LumaGrid, strength: f64) -> Vec<u8> {
    use rayon::prelude::*;
    grid.blocks().par_iter().map(|block| extract_bit(block, strength)).collect()
}

/// Hard bit of every block, in block-raster order.
#[cfg(not(feature = "parallel"))]
fn extract_all(grid: &LumaGrid, strength: f64) -> Vec<u8> {
    grid.blocks().iter().map(|block| extract_bit(block, strength)).collect()
}
