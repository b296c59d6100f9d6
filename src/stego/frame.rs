// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Payload frame layout.
//!
//! ```text
//! keyed slots [0, 24)            message byte length (big-endian, 24 bits)
//! keyed slots [24, 24 + 8·R·E)   RS codeword bits, R copies each
//! ```
//!
//! The length header is written once, one bit per block, without RS
//! protection or repetition. `E` is the RS codeword length for the header's
//! message length, so the header alone fixes the whole layout.

use crate::stego::armor::ecc::rs_encoded_len;
use crate::stego::params::EmbedParams;

/// Bits in the length header.
pub const HEADER_BITS: usize = 24;

/// Largest message length the header can express.
pub const MAX_MESSAGE_LEN: usize = (1 << HEADER_BITS) - 1;

/// Header bits for a message of `len` bytes, MSB first.
///
/// Callers check `len <= MAX_MESSAGE_LEN` first; higher bits are dropped.
pub fn encode_header(len: usize) -> [u8; HEADER_BITS] {
    debug_assert!(len <= MAX_MESSAGE_LEN);
    let mut bits = [0u8; HEADER_BITS];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = ((len >> (HEADER_BITS - 1 - i)) & 1) as u8;
    }
    bits
}

/// Message length from header bits, MSB first. Only the low bit of each
/// entry is used.
pub fn decode_header(bits: &[u8; HEADER_BITS]) -> usize {
    bits.iter().fold(0usize, |acc, &b| (acc << 1) | (b & 1) as usize)
}

/// Blocks needed to carry a message of `len` bytes: `24 + 8·R·E`.
///
/// `None` if the count overflows `usize`.
pub fn required_blocks(len: usize, params: &EmbedParams) -> Option<usize> {
    let codeword_len = rs_encoded_len(len, params.parity_symbols);
    codeword_len
        .checked_mul(8)?
        .checked_mul(params.repetition)?
        .checked_add(HEADER_BITS)
}
