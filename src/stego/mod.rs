// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Steganographic encoding and decoding.
//!
//! The reference text (`book`) decides which blocks carry which bits; the
//! `armor` layers make those bits survive lossy re-encoding. `pipeline` ties
//! them together behind [`encode`] and [`decode`].

pub mod armor;
pub mod book;
pub mod capacity;
pub mod error;
pub mod frame;
pub mod params;
mod pipeline;

pub use book::{derive_keystream, BookCipher, KeyStream, SourceStats};
pub use capacity::{capacity, capacity_with, CapacityInfo};
pub use error::StegoError;
pub use params::EmbedParams;
pub use pipeline::{decode, decode_with_book, encode, encode_with_book, DecodeQuality, DecodedMessage};
