// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Capacity estimation.
//!
//! Capacity depends only on the image dimensions and the parameters: every
//! whole 8×8 block carries one bit. After the 24 header bits, the remaining
//! blocks hold `A = (blocks - 24) / (8·R)` codeword bytes. The largest
//! message whose RS codeword fits in `A` bytes is the reported capacity.

use serde::Serialize;

use crate::raster::block_count;
use crate::stego::armor::ecc::rs_encoded_len;
use crate::stego::error::StegoError;
use crate::stego::frame::{HEADER_BITS, MAX_MESSAGE_LEN};
use crate::stego::params::EmbedParams;

/// Capacity report for an image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityInfo {
    /// Whole 8×8 blocks (embedding slots).
    pub block_count: usize,
    /// Largest message, in UTF-8 bytes, that fits at these parameters.
    pub max_message_bytes: usize,
}

/// Capacity of a `width × height` image at the default parameters.
pub fn capacity(width: u32, height: u32) -> CapacityInfo {
    let blocks = block_count(width, height);
    CapacityInfo {
        block_count: blocks,
        max_message_bytes: max_message_bytes(blocks, &EmbedParams::default()),
    }
}

/// Capacity of a `width × height` image at the given parameters.
///
/// # Errors
/// [`StegoError::InvalidParameter`] if `params` fail validation.
pub fn capacity_with(width: u32, height: u32, params: &EmbedParams) -> Result<CapacityInfo, StegoError> {
    params.validate()?;
    let blocks = block_count(width, height);
    Ok(CapacityInfo {
        block_count: blocks,
        max_message_bytes: max_message_bytes(blocks, params),
    })
}

/// Largest message length whose frame fits in `blocks` slots.
///
/// Assumes `params` are valid. Returns 0 when even the parity of an empty
/// message does not fit.
pub fn max_message_bytes(blocks: usize, params: &EmbedParams) -> usize {
    let parity = params.parity_symbols;
    let codeword_bytes = blocks.saturating_sub(HEADER_BITS) / params.repetition.max(1).saturating_mul(8);

    let data_per_block = 255usize.saturating_sub(parity);
    let full_blocks = codeword_bytes / 255;
    let tail = codeword_bytes % 255;
    let len = full_blocks * data_per_block + tail.saturating_sub(parity);

    debug_assert!(len == 0 || rs_encoded_len(len, parity) <= codeword_bytes);
    len.min(MAX_MESSAGE_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stego::frame::required_blocks;

    #[test]
    fn small_image_has_no_room() {
        // 1024 blocks carry (1024 - 24) / 56 = 17 codeword bytes, less than
        // the 64 parity bytes.
        let info = capacity(256, 256);
        assert_eq!(info.block_count, 1024);
        assert_eq!(info.max_message_bytes, 0);
    }

    #[test]
    fn vga_capacity() {
        let info = capacity(640, 480);
        assert_eq!(info.block_count, 4800);
        assert_eq!(info.max_message_bytes, 85 - 64);
    }

    #[test]
    fn partial_blocks_and_tiny_images() {
        assert_eq!(capacity(7, 7), CapacityInfo { block_count: 0, max_message_bytes: 0 });
        assert_eq!(capacity(647, 487).block_count, 4800);
    }

    #[test]
    fn single_block_formula_matches_a_minus_parity() {
        let p = EmbedParams::default();
        for blocks in (24..14_000).step_by(97) {
            let a = (blocks - 24) / 56;
            assert_eq!(max_message_bytes(blocks, &p), a.saturating_sub(64), "blocks={blocks}");
        }
    }

    #[test]
    fn boundary_is_exact_across_block_counts() {
        let p = EmbedParams { repetition: 1, parity_symbols: 32, ..EmbedParams::default() };
        for blocks in [24 + 8 * 300, 24 + 8 * 510, 24 + 8 * 511 + 7, 24 + 8 * 800, 24 + 8 * 1000] {
            let max = max_message_bytes(blocks, &p);
            assert!(max > 0);
            assert!(required_blocks(max, &p).unwrap() <= blocks, "blocks={blocks}");
            assert!(required_blocks(max + 1, &p).unwrap() > blocks, "blocks={blocks}");
        }
    }

    #[test]
    fn no_parity_uses_every_byte() {
        let p = EmbedParams { parity_symbols: 0, repetition: 1, ..EmbedParams::default() };
        assert_eq!(max_message_bytes(24 + 8 * 1000, &p), 1000);
    }

    #[test]
    fn capped_at_header_range() {
        let p = EmbedParams { parity_symbols: 0, repetition: 1, ..EmbedParams::default() };
        assert_eq!(max_message_bytes(usize::MAX, &p), MAX_MESSAGE_LEN);
    }

    #[test]
    fn invalid_params_rejected() {
        let p = EmbedParams { repetition: 0, ..EmbedParams::default() };
        assert!(matches!(capacity_with(640, 480, &p), Err(StegoError::InvalidParameter(_))));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&capacity(640, 480)).unwrap();
        assert_eq!(json, r#"{"blockCount":4800,"maxMessageBytes":21}"#);
    }
}
