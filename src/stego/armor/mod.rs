// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Robustness layers.
//!
//! - **Reed-Solomon** (`ecc`): symbol-level errors-and-erasures correction
//! - **Repetition** (`repetition`): every protected bit written to several
//!   keyed blocks, recovered by majority vote
//! - **QIM embedding** (`embedding`): one bit per 8×8 block in a
//!   mid-frequency DCT coefficient
//!
//! The pipeline: frame -> RS encode -> repeat R× -> QIM embed.

pub mod ecc;
pub mod embedding;
pub mod repetition;
