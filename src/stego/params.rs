// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Embedding parameters.
//!
//! Parameters are not written into the image. Encoder and decoder must agree
//! on them out of band; a mismatch garbles the header or the votes and the
//! decode fails (or, rarely, recovers different text).

use serde::{Deserialize, Serialize};

use crate::stego::armor::ecc::MAX_PARITY;
use crate::stego::error::StegoError;

/// Default QIM lattice step for the carrier coefficient.
pub const DEFAULT_STRENGTH: f64 = 150.0;

/// Default RS parity symbols per 255-symbol block.
pub const DEFAULT_PARITY_SYMBOLS: usize = 64;

/// Default number of copies of every protected bit.
pub const DEFAULT_REPETITION: usize = 7;

/// Tunable knobs of the codec.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedParams {
    /// QIM lattice step. Larger values survive harsher recompression at the
    /// cost of visible distortion.
    pub strength: f64,
    /// RS parity symbols per block (`0..=254`).
    pub parity_symbols: usize,
    /// Copies of every bit (`>= 1`). Even values turn tied votes into RS
    /// erasures.
    pub repetition: usize,
}

impl Default for EmbedParams {
    fn default() -> Self {
        Self {
            strength: DEFAULT_STRENGTH,
            parity_symbols: DEFAULT_PARITY_SYMBOLS,
            repetition: DEFAULT_REPETITION,
        }
    }
}

impl EmbedParams {
    /// # Errors
    /// [`StegoError::InvalidParameter`] naming the first out-of-range field.
    pub fn validate(&self) -> Result<(), StegoError> {
        if !self.strength.is_finite() || self.strength <= 0.0 {
            return Err(StegoError::InvalidParameter("strength must be a positive finite number"));
        }
        if self.parity_symbols > MAX_PARITY {
            return Err(StegoError::InvalidParameter("parity symbols must be at most 254"));
        }
        if self.repetition == 0 {
            return Err(StegoError::InvalidParameter("repetition must be at least 1"));
        }
        Ok(())
    }
}
