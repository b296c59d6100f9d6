// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Book-cipher key schedule.
//!
//! A [`BookCipher`] indexes a shared reference text by character: for every
//! distinct character it stores the ascending list of positions where that
//! character occurs. The key stream is produced by walking the book: each
//! draw reads the character under a cursor derived from the running state,
//! looks up that character's occurrence list, picks one occurrence and
//! folds it back into the state. Only a holder of the exact same text
//! reproduces the walk.
//!
//! [`BookCipher::keystream`] turns the walk into a permutation of
//! `[0, domain_size)` with a Fisher-Yates shuffle. As in the coefficient
//! permutation this design grew out of, `gen_range` is called on `u32`, not
//! `usize`, so 32-bit and 64-bit targets consume identical entropy and
//! produce identical permutations.
//!
//! A second walk, salted differently, yields [`BookCipher::whitening`]: the
//! keyed bit mask XORed over every frame bit.
//!
//! The cipher is immutable once built and holds no global state; callers that
//! reuse a reference text across requests may keep one `BookCipher` and share
//! it between threads.

use std::collections::HashMap;

use rand::{Rng, RngCore};
use serde::Serialize;

use crate::stego::error::StegoError;

/// Summary of a reference text, reported when a book is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStats {
    /// Length in Unicode scalar values.
    pub length: usize,
    /// Number of distinct characters.
    pub unique_character_count: usize,
}

/// A reference text with its character index.
#[derive(Debug, Clone)]
pub struct BookCipher {
    chars: Vec<char>,
    /// Occurrence-list slot of the character at each position.
    slot_at: Vec<usize>,
    /// Ascending positions per distinct character, in first-seen order.
    occurrences: Vec<Vec<usize>>,
    slot_of: HashMap<char, usize>,
    /// FNV-1a digest of the whole text.
    digest: u64,
}

impl BookCipher {
    /// Index a reference text.
    ///
    /// # Errors
    /// [`StegoError::InvalidKeyMaterial`] if `text` is empty.
    pub fn new(text: &str) -> Result<Self, StegoError> {
        if text.is_empty() {
            return Err(StegoError::InvalidKeyMaterial);
        }

        let chars: Vec<char> = text.chars().collect();
        let mut slot_of: HashMap<char, usize> = HashMap::new();
        let mut occurrences: Vec<Vec<usize>> = Vec::new();
        let mut slot_at = Vec::with_capacity(chars.len());

        for (pos, &ch) in chars.iter().enumerate() {
            let slot = *slot_of.entry(ch).or_insert_with(|| {
                occurrences.push(Vec::new());
                occurrences.len() - 1
            });
            occurrences[slot].push(pos);
            slot_at.push(slot);
        }

        Ok(Self {
            chars,
            slot_at,
            occurrences,
            slot_of,
            digest: fnv1a64(text.as_bytes()),
        })
    }

    /// Length of the text in characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Always false: an empty text is rejected by [`BookCipher::new`].
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Positions of `ch` in the text, ascending.
    ///
    /// # Errors
    /// [`StegoError::InvalidKeyMaterial`] if `ch` does not occur in the text.
    pub fn positions(&self, ch: char) -> Result<&[usize], StegoError> {
        self.slot_of
            .get(&ch)
            .map(|&slot| self.occurrences[slot].as_slice())
            .ok_or(StegoError::InvalidKeyMaterial)
    }

    pub fn stats(&self) -> SourceStats {
        SourceStats {
            length: self.chars.len(),
            unique_character_count: self.occurrences.len(),
        }
    }

    /// Derive the keyed permutation of `[0, domain_size)`.
    ///
    /// # Errors
    /// [`StegoError::InvalidKeyMaterial`] if `domain_size` is zero or does not
    /// fit the portable `u32` sampling range.
    pub fn keystream(&self, domain_size: usize) -> Result<KeyStream, StegoError> {
        if domain_size == 0 || domain_size as u64 > u32::MAX as u64 {
            return Err(StegoError::InvalidKeyMaterial);
        }

        let mut order: Vec<usize> = (0..domain_size).collect();
        let mut walk = self.walk(splitmix64(domain_size as u64));
        for i in (1..domain_size).rev() {
            let j = walk.gen_range(0..=(i as u32)) as usize;
            order.swap(i, j);
        }
        Ok(KeyStream { order })
    }

    /// Keyed whitening bits (0 or 1) for a frame of `bit_count` bits.
    ///
    /// The sequence does not depend on `bit_count`: a shorter call returns a
    /// prefix of a longer one. Frame bits are XORed with it before embedding,
    /// so an all-zero read is never a valid frame and a wrong book reads
    /// noise.
    pub fn whitening(&self, bit_count: usize) -> Vec<u8> {
        let mut walk = self.walk(WHITENING_SALT);
        let mut bits = Vec::with_capacity(bit_count);
        while bits.len() < bit_count {
            let word = walk.next_u64();
            let take = (bit_count - bits.len()).min(64);
            bits.extend((0..take).map(|i| ((word >> (63 - i)) & 1) as u8));
        }
        bits
    }

    fn walk(&self, salt: u64) -> BookWalk<'_> {
        BookWalk {
            book: self,
            state: splitmix64(self.digest ^ salt),
            step: 0,
        }
    }
}

/// Walk salt of the whitening sequence; key streams salt with the domain size.
const WHITENING_SALT: u64 = 0x5748_4954_454E_5F31;

/// Convenience wrapper: index `text` and derive its permutation.
pub fn derive_keystream(text: &str, domain_size: usize) -> Result<KeyStream, StegoError> {
    BookCipher::new(text)?.keystream(domain_size)
}

/// Keyed slot order: a permutation of `[0, len)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStream {
    order: Vec<usize>,
}

impl KeyStream {
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Pseudorandom walk through a book.
struct BookWalk<'a> {
    book: &'a BookCipher,
    state: u64,
    step: u64,
}

impl BookWalk<'_> {
    fn advance(&mut self) -> u64 {
        let book = self.book;
        let cursor = (self.state % book.chars.len() as u64) as usize;
        let occ = &book.occurrences[book.slot_at[cursor]];
        let pick = occ[((self.state >> 32) % occ.len() as u64) as usize];
        let ch = book.chars[pick] as u64;

        self.step = self.step.wrapping_add(1);
        self.state = splitmix64(self.state ^ (pick as u64).rotate_left(23) ^ (ch << 40) ^ self.step);
        self.state
    }
}

impl RngCore for BookWalk<'_> {
    fn next_u32(&mut self) -> u32 {
        (self.advance() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.advance()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.advance().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xCBF2_9CE4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}

/// SplitMix64 finalizer.
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
