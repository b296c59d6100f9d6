// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # book-stego
//!
//! Hides UTF-8 text in bitmap images so that it survives JPEG re-compression
//! and lossless re-saves. Which blocks carry the message is decided by a
//! shared reference text (the "book"); only a holder of the same text can
//! find and read it.
//!
//! Every whole 8×8 luma block carries one bit, quantized into a mid-frequency
//! DCT coefficient. The message is protected by Reed-Solomon coding and bit
//! repetition with majority voting. Output is always a lossless PNG.
//!
//! This is not a confidentiality layer: the text is not encrypted and the
//! embedding does not try to hide from steganalysis.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use book_stego::{encode, decode, EmbedParams};
//!
//! let cover = std::fs::read("photo.png").unwrap();
//! let book = std::fs::read_to_string("moby-dick.txt").unwrap();
//! let params = EmbedParams::default();
//! let stego = encode(&cover, "Hello world!", &book, &params).unwrap();
//! let decoded = decode(&stego, &book, &params).unwrap();
//! assert_eq!(decoded.text, "Hello world!");
//! ```

pub mod raster;
pub mod stego;

pub use raster::{block_count, CoverImage, LumaGrid};
pub use stego::{capacity, capacity_with, CapacityInfo};
pub use stego::{decode, decode_with_book, encode, encode_with_book, DecodeQuality, DecodedMessage};
pub use stego::{derive_keystream, BookCipher, KeyStream, SourceStats};
pub use stego::{EmbedParams, StegoError};
