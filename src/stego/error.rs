// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the steganography pipeline.
//!
//! [`StegoError`] covers all failure modes from image parsing through key
//! derivation, error correction and text recovery. Every failure is a
//! recoverable value; nothing in the codec panics on untrusted input.

use core::fmt;

use crate::stego::armor::ecc::RsDecodeError;

/// Errors that can occur during steganographic encoding or decoding.
#[derive(Debug)]
pub enum StegoError {
    /// The reference text is empty, the key domain is empty, or a character
    /// was looked up that does not occur in the reference text.
    InvalidKeyMaterial,
    /// The message is too large for the cover image at the given parameters.
    CapacityExceeded,
    /// Reed-Solomon correction capacity was exhausted.
    Uncorrectable,
    /// The recovered bytes are not valid UTF-8.
    InvalidText,
    /// The embedded length header is inconsistent with the image or the
    /// recovered data.
    TruncatedPayload,
    /// The input bytes could not be parsed as an image.
    MalformedInput(image::ImageError),
    /// Writing the lossless output image failed.
    OutputEncoding(image::ImageError),
    /// An embedding parameter is out of range.
    InvalidParameter(&'static str),
}

impl fmt::Display for StegoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKeyMaterial => write!(f, "invalid key material (empty or mismatched reference text)"),
            Self::CapacityExceeded => write!(f, "message too large for this image"),
            Self::Uncorrectable => write!(f, "too many errors to correct (image altered or wrong reference text?)"),
            Self::InvalidText => write!(f, "extracted text is not valid UTF-8"),
            Self::TruncatedPayload => write!(f, "embedded length does not match recoverable data"),
            Self::MalformedInput(e) => write!(f, "cannot read image: {e}"),
            Self::OutputEncoding(e) => write!(f, "cannot write output image: {e}"),
            Self::InvalidParameter(what) => write!(f, "invalid parameter: {what}"),
        }
    }
}

impl std::error::Error for StegoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedInput(e) | Self::OutputEncoding(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RsDecodeError> for StegoError {
    fn from(_: RsDecodeError) -> Self {
        Self::Uncorrectable
    }
}
