// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Repetition coding with hard majority voting.
//!
//! Every RS-encoded bit is written to `r` distinct embedding slots taken
//! from the keyed slot order. Copy `j` of bit `i` uses keyed position
//! `offset + j * bit_count + i`, so the copies of one bit are a whole
//! bitstream apart in keyed order and fall on unrelated image blocks.
//!
//! On extraction each bit is recovered by majority vote. An exact tie (only
//! possible for even `r`) is not guessed: the bit is marked erased and the
//! byte containing it is handed to the RS decoder as a symbol erasure.

use crate::stego::error::StegoError;

/// Slot reservation for a repeated bitstream.
#[derive(Debug, Clone)]
pub struct Assignments {
    repetition: usize,
    bit_count: usize,
    /// `slots[copy * bit_count + bit]`.
    slots: Vec<usize>,
}

impl Assignments {
    pub fn repetition(&self) -> usize {
        self.repetition
    }

    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    /// Total slots used: `bit_count * repetition`.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// The `repetition` slots carrying copies of `bit`.
    pub fn slots_for(&self, bit: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.repetition).map(move |copy| self.slots[copy * self.bit_count + bit])
    }

    /// All reserved slots in keyed order.
    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    /// `(slot, bit value)` pairs for embedding `bits` under this assignment.
    pub fn placements<'a>(&'a self, bits: &'a [u8]) -> impl Iterator<Item = (usize, u8)> + 'a {
        debug_assert_eq!(bits.len(), self.bit_count);
        self.slots
            .iter()
            .enumerate()
            .map(move |(i, &slot)| (slot, bits[i % self.bit_count]))
    }
}

/// Reserve `bit_count * repetition` slots from `order`, starting at `offset`.
///
/// # Errors
/// - [`StegoError::InvalidParameter`] if `repetition == 0`.
/// - [`StegoError::CapacityExceeded`] if `order` has too few slots left.
pub fn assign(
    bit_count: usize,
    repetition: usize,
    order: &[usize],
    offset: usize,
) -> Result<Assignments, StegoError> {
    if repetition == 0 {
        return Err(StegoError::InvalidParameter("repetition must be at least 1"));
    }
    let needed = bit_count
        .checked_mul(repetition)
        .ok_or(StegoError::CapacityExceeded)?;
    let end = offset.checked_add(needed).ok_or(StegoError::CapacityExceeded)?;
    if end > order.len() {
        return Err(StegoError::CapacityExceeded);
    }

    Ok(Assignments {
        repetition,
        bit_count,
        slots: order[offset..end].to_vec(),
    })
}

/// Spread a bitstream over keyed slots.
///
/// Equivalent to [`assign`] for `bits.len()` bits; use
/// [`Assignments::placements`] to enumerate the writes.
pub fn spread(
    bits: &[u8],
    repetition: usize,
    order: &[usize],
    offset: usize,
) -> Result<Assignments, StegoError> {
    assign(bits.len(), repetition, order, offset)
}

/// Result of a majority vote for one logical bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Bit(u8),
    /// Exactly half the copies said 0 and half said 1.
    Erased,
}

/// Vote statistics for signal quality measurement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoteQuality {
    /// Bits whose vote ended in a tie.
    pub ties: usize,
    /// Bits where every copy agreed.
    pub unanimous: usize,
    /// Mean fraction of copies agreeing with the winning value (0.5..=1.0).
    pub mean_agreement: f64,
}

/// Majority-vote every logical bit from per-slot observations.
///
/// `observed[slot]` is the hard bit extracted from that slot.
pub fn collapse(observed: &[u8], assignments: &Assignments) -> (Vec<Vote>, VoteQuality) {
    let r = assignments.repetition;
    let mut votes = Vec::with_capacity(assignments.bit_count);
    let mut quality = VoteQuality::default();
    let mut agreement_sum = 0.0;

    for bit in 0..assignments.bit_count {
        let ones = assignments
            .slots_for(bit)
            .filter(|&slot| observed[slot] & 1 == 1)
            .count();
        let zeros = r - ones;

        let vote = match ones.cmp(&zeros) {
            core::cmp::Ordering::Greater => Vote::Bit(1),
            core::cmp::Ordering::Less => Vote::Bit(0),
            core::cmp::Ordering::Equal => Vote::Erased,
        };
        if vote == Vote::Erased {
            quality.ties += 1;
        }
        if ones == 0 || zeros == 0 {
            quality.unanimous += 1;
        }
        agreement_sum += ones.max(zeros) as f64 / r as f64;
        votes.push(vote);
    }

    if assignments.bit_count > 0 {
        quality.mean_agreement = agreement_sum / assignments.bit_count as f64;
    }
    (votes, quality)
}

/// Pack voted bits MSB-first into bytes.
///
/// Erased bits are written as 0 and the index of every byte holding an
/// erased bit is returned as a symbol erasure.
pub fn votes_to_symbols(votes: &[Vote]) -> (Vec<u8>, Vec<usize>) {
    let mut bytes = vec![0u8; votes.len().div_ceil(8)];
    let mut erasures = Vec::new();

    for (i, vote) in votes.iter().enumerate() {
        match *vote {
            Vote::Bit(b) => bytes[i / 8] |= (b & 1) << (7 - i % 8),
            Vote::Erased => {
                if erasures.last() != Some(&(i / 8)) {
                    erasures.push(i / 8);
                }
            }
        }
    }
    (bytes, erasures)
}

/// Unpack bytes into bits, MSB first.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1))
        .collect()
}
