// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Reed-Solomon error correction over GF(2^8).
//!
//! Implements RS(255, 255 - p) with the primitive polynomial 0x11D
//! (x^8+x^4+x^3+x^2+1) and first consecutive root α^0. Encoding is
//! systematic; payloads longer than one block are split into several
//! codewords, and short (or empty) payloads use a shortened code.
//!
//! Decoding handles errors and erasures together: the erasure locator seeds
//! Berlekamp-Massey, Chien search finds all errata positions and Forney
//! computes their magnitudes. A block decodes iff
//! `2 * errors + erasures <= p`.

/// Primitive polynomial for GF(2^8): x^8 + x^4 + x^3 + x^2 + 1 = 0x11D.
const PRIM_POLY: u16 = 0x11D;

/// Maximum RS block size.
const N_MAX: usize = 255;

/// Largest supported parity length (leaves one data symbol per block).
pub const MAX_PARITY: usize = N_MAX - 1;

// --- GF(2^8) Arithmetic ---

/// Precomputed log and exp tables for GF(2^8).
struct GfTables {
    exp: [u8; 512],
    log: [u8; 256],
}

fn build_gf_tables() -> GfTables {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];

    let mut x: u16 = 1;
    for i in 0..255u16 {
        exp[i as usize] = x as u8;
        exp[(i + 255) as usize] = x as u8; // wrap-around for easy modular access
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIM_POLY;
        }
    }
    exp[510] = exp[0];
    exp[511] = exp[1];

    GfTables { exp, log }
}

fn gf_tables() -> &'static GfTables {
    use std::sync::OnceLock;
    static TABLES: OnceLock<GfTables> = OnceLock::new();
    TABLES.get_or_init(build_gf_tables)
}

/// GF(2^8) multiplication.
fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = gf_tables();
    let log_sum = t.log[a as usize] as usize + t.log[b as usize] as usize;
    t.exp[log_sum]
}

/// GF(2^8) addition (same as XOR).
fn gf_add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// GF(2^8) multiplicative inverse. Callers never pass zero.
fn gf_inv(a: u8) -> u8 {
    debug_assert_ne!(a, 0, "cannot invert zero in GF(2^8)");
    let t = gf_tables();
    t.exp[255 - t.log[a as usize] as usize]
}

/// α^e for any exponent (reduced mod 255).
fn alpha_pow(e: usize) -> u8 {
    gf_tables().exp[e % 255]
}

/// α^-e for any exponent.
fn alpha_inv_pow(e: usize) -> u8 {
    gf_tables().exp[(255 - e % 255) % 255]
}

/// Evaluate polynomial at x. poly[0] is the highest-degree coefficient.
fn poly_eval(poly: &[u8], x: u8) -> u8 {
    let mut result = 0u8;
    for &coeff in poly {
        result = gf_add(gf_mul(result, x), coeff);
    }
    result
}

/// Multiply two polynomials. poly[0] is highest-degree coefficient.
fn poly_mul(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut result = vec![0u8; a.len() + b.len() - 1];
    for (i, &ac) in a.iter().enumerate() {
        for (j, &bc) in b.iter().enumerate() {
            result[i + j] = gf_add(result[i + j], gf_mul(ac, bc));
        }
    }
    result
}

/// Evaluate polynomial in ascending power format at x.
fn eval_asc(poly: &[u8], x: u8) -> u8 {
    let mut result = 0u8;
    let mut x_pow = 1u8;
    for &coeff in poly {
        result = gf_add(result, gf_mul(coeff, x_pow));
        x_pow = gf_mul(x_pow, x);
    }
    result
}

// --- Generator Polynomial ---

/// Build the RS generator polynomial g(x) = prod_{i=0}^{p-1} (x - alpha^i).
/// Returns coefficients from highest to lowest degree.
fn build_gen_poly(parity_len: usize) -> Vec<u8> {
    let mut gpoly = vec![1u8];
    for i in 0..parity_len {
        gpoly = poly_mul(&gpoly, &[1, alpha_pow(i)]);
    }
    gpoly
}

// --- Layout ---

fn data_per_block(parity_len: usize) -> usize {
    N_MAX - parity_len
}

/// Data lengths of the blocks a payload of `data_len` bytes is split into.
/// Always at least one block, so an empty payload still carries parity.
fn block_data_lens(data_len: usize, parity_len: usize) -> impl Iterator<Item = usize> {
    let k = data_per_block(parity_len);
    let num_blocks = data_len.div_ceil(k).max(1);
    (0..num_blocks).map(move |b| (data_len - (b * k).min(data_len)).min(k))
}

/// Return the RS-encoded length for a given data length.
pub fn rs_encoded_len(data_len: usize, parity_len: usize) -> usize {
    let k = data_per_block(parity_len);
    data_len + data_len.div_ceil(k).max(1) * parity_len
}

/// Inverse of [`rs_encoded_len`]: the payload length that produces a codeword
/// of `encoded_len` bytes, or `None` if no payload length does.
pub fn rs_data_len(encoded_len: usize, parity_len: usize) -> Option<usize> {
    if parity_len > MAX_PARITY {
        return None;
    }
    let k = data_per_block(parity_len);
    let full = encoded_len / N_MAX;
    let rem = encoded_len % N_MAX;
    match (full, rem) {
        (0, 0) => (parity_len == 0).then_some(0),
        (_, 0) => Some(full * k),
        (0, r) if r == parity_len => Some(0),
        (_, r) if r > parity_len => Some(full * k + r - parity_len),
        _ => None,
    }
}

// --- Encoding ---

/// RS-encode a single data block (systematic encoding).
///
/// Returns `data.len() + gpoly.len() - 1` bytes: the data followed by the
/// parity symbols. Shortened blocks behave as if zero-padded at the front.
fn rs_encode_block(data: &[u8], gpoly: &[u8]) -> Vec<u8> {
    let parity_len = gpoly.len() - 1;
    let mut encoded = Vec::with_capacity(data.len() + parity_len);
    encoded.extend_from_slice(data);
    if parity_len == 0 {
        return encoded;
    }

    let mut shift_reg = vec![0u8; parity_len];
    for &byte in data {
        let feedback = gf_add(byte, shift_reg[0]);
        for j in 0..parity_len - 1 {
            shift_reg[j] = gf_add(shift_reg[j + 1], gf_mul(feedback, gpoly[j + 1]));
        }
        shift_reg[parity_len - 1] = gf_mul(feedback, gpoly[parity_len]);
    }

    encoded.extend_from_slice(&shift_reg);
    encoded
}

/// RS-encode a payload with `parity_len` parity symbols per block.
///
/// The payload is split into `255 - parity_len` byte blocks; the result is
/// the concatenation of `data || parity` for each block. An empty payload
/// yields a single parity-only block.
///
/// # Panics
/// Panics if `parity_len > 254`. Callers validate parameters first.
pub fn encode_symbols(payload: &[u8], parity_len: usize) -> Vec<u8> {
    assert!(parity_len <= MAX_PARITY, "parity_len {parity_len} exceeds {MAX_PARITY}");

    let gpoly = build_gen_poly(parity_len);
    let mut encoded = Vec::with_capacity(rs_encoded_len(payload.len(), parity_len));
    let mut offset = 0;
    for len in block_data_lens(payload.len(), parity_len) {
        encoded.extend_from_slice(&rs_encode_block(&payload[offset..offset + len], &gpoly));
        offset += len;
    }
    encoded
}

// --- Decoding ---

/// Error returned when RS decoding fails (too many errata).
#[derive(Debug, PartialEq)]
pub struct RsDecodeError;

impl core::fmt::Display for RsDecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Reed-Solomon: too many errors to correct")
    }
}

impl std::error::Error for RsDecodeError {}

/// Statistics from RS decoding across all blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RsDecodeStats {
    /// Symbol errors located and corrected (erasures excluded).
    pub errors_corrected: usize,
    /// Erased symbols handed in by the caller.
    pub erasures_filled: usize,
    /// Number of RS blocks decoded.
    pub num_blocks: usize,
    /// Largest `2 * errors + erasures` seen in any single block.
    pub max_block_errata: usize,
    /// Errors correctable without erasures: `num_blocks * parity_len / 2`.
    pub error_capacity: usize,
}

/// Compute syndromes S_0 .. S_{p-1} for a full 255-symbol block (FCR=0).
fn compute_syndromes(full_block: &[u8], parity_len: usize) -> Vec<u8> {
    (0..parity_len).map(|i| poly_eval(full_block, alpha_pow(i))).collect()
}

/// Locator X = α^(n-1-k) of array index `k` in a full block.
fn locator_exponent(array_pos: usize) -> usize {
    N_MAX - 1 - array_pos
}

/// Γ(x) = prod (1 + X_j x) over erased positions, ascending power.
fn erasure_locator(erased_array_pos: &[usize]) -> Vec<u8> {
    let mut gamma = vec![1u8];
    for &pos in erased_array_pos {
        let x = alpha_pow(locator_exponent(pos));
        let mut next = vec![0u8; gamma.len() + 1];
        for (i, &g) in gamma.iter().enumerate() {
            next[i] = gf_add(next[i], g);
            next[i + 1] = gf_add(next[i + 1], gf_mul(g, x));
        }
        gamma = next;
    }
    gamma
}

fn trim_asc(mut poly: Vec<u8>) -> Vec<u8> {
    while poly.len() > 1 && poly.last() == Some(&0) {
        poly.pop();
    }
    poly
}

/// Berlekamp-Massey seeded with the erasure locator.
///
/// Returns the errata locator Λ(x) in ascending power (Λ_0 = 1) and the
/// final linear-complexity estimate L.
fn berlekamp_massey_erasures(syndromes: &[u8], gamma: &[u8]) -> (Vec<u8>, usize) {
    let rho = gamma.len() - 1;
    let mut lambda = gamma.to_vec();
    let mut b = gamma.to_vec();
    let mut ell = rho;

    for r in rho..syndromes.len() {
        let mut delta = 0u8;
        for (j, &l) in lambda.iter().enumerate().take(r + 1) {
            delta = gf_add(delta, gf_mul(l, syndromes[r - j]));
        }

        // x * B(x)
        let mut xb = Vec::with_capacity(b.len() + 1);
        xb.push(0);
        xb.extend_from_slice(&b);

        if delta == 0 {
            b = xb;
            continue;
        }

        let mut next = lambda.clone();
        if next.len() < xb.len() {
            next.resize(xb.len(), 0);
        }
        for (i, &coef) in xb.iter().enumerate() {
            next[i] = gf_add(next[i], gf_mul(delta, coef));
        }

        if 2 * ell <= r + rho {
            let inv = gf_inv(delta);
            b = lambda.iter().map(|&c| gf_mul(c, inv)).collect();
            ell = r + 1 + rho - ell;
        } else {
            b = xb;
        }
        lambda = next;
    }

    (trim_asc(lambda), ell)
}

/// Chien search: find roots of Λ(x) over the full block.
///
/// Returns array positions of the errata, or `None` if the number of roots
/// does not match the locator degree.
fn chien_search(lambda_asc: &[u8]) -> Option<Vec<usize>> {
    let degree = lambda_asc.len() - 1;
    let mut found = Vec::with_capacity(degree);
    for exp in 0..N_MAX {
        if eval_asc(lambda_asc, alpha_inv_pow(exp)) == 0 {
            found.push(N_MAX - 1 - exp);
        }
    }
    (found.len() == degree).then_some(found)
}

/// Forney algorithm: errata magnitudes for FCR=0.
///
/// e_l = X_l * Ω(X_l^{-1}) / Λ'(X_l^{-1}) with Ω = S(x)·Λ(x) mod x^p.
fn forney(lambda_asc: &[u8], syndromes: &[u8], positions: &[usize]) -> Option<Vec<u8>> {
    let two_t = syndromes.len();

    let mut omega = vec![0u8; two_t];
    for (i, &l) in lambda_asc.iter().enumerate().take(two_t) {
        for (j, &s) in syndromes.iter().enumerate().take(two_t - i) {
            omega[i + j] = gf_add(omega[i + j], gf_mul(l, s));
        }
    }

    // Formal derivative: only odd powers survive in characteristic 2.
    let mut lambda_prime = vec![0u8; lambda_asc.len().saturating_sub(1).max(1)];
    for i in (1..lambda_asc.len()).step_by(2) {
        lambda_prime[i - 1] = lambda_asc[i];
    }

    positions
        .iter()
        .map(|&pos| {
            let exp = locator_exponent(pos);
            let x_inv = alpha_inv_pow(exp);
            let denom = eval_asc(&lambda_prime, x_inv);
            if denom == 0 {
                return None;
            }
            let num = eval_asc(&omega, x_inv);
            Some(gf_mul(alpha_pow(exp), gf_mul(num, gf_inv(denom))))
        })
        .collect()
}

/// Per-block outcome: (errors corrected, erasures).
type BlockOutcome = (usize, usize);

/// RS-decode one block with errors and erasures.
///
/// `erased` holds indices into `received`.
fn rs_decode_block(
    received: &[u8],
    data_len: usize,
    parity_len: usize,
    erased: &[usize],
) -> Result<(Vec<u8>, BlockOutcome), RsDecodeError> {
    debug_assert_eq!(received.len(), data_len + parity_len);

    if erased.len() > parity_len {
        return Err(RsDecodeError);
    }
    if parity_len == 0 {
        return Ok((received[..data_len].to_vec(), (0, 0)));
    }

    // Shortened codes: prepend zeros to make a full 255-symbol block.
    let padding = N_MAX - received.len();
    let mut full_block = vec![0u8; N_MAX];
    full_block[padding..].copy_from_slice(received);

    let syndromes = compute_syndromes(&full_block, parity_len);
    if syndromes.iter().all(|&s| s == 0) {
        return Ok((received[..data_len].to_vec(), (0, erased.len())));
    }

    let erased_full: Vec<usize> = erased.iter().map(|&e| e + padding).collect();
    let gamma = erasure_locator(&erased_full);
    let (lambda, ell) = berlekamp_massey_erasures(&syndromes, &gamma);
    let degree = lambda.len() - 1;

    let rho = erased.len();
    if degree != ell || degree < rho || 2 * (degree - rho) + rho > parity_len {
        return Err(RsDecodeError);
    }

    let positions = chien_search(&lambda).ok_or(RsDecodeError)?;
    let magnitudes = forney(&lambda, &syndromes, &positions).ok_or(RsDecodeError)?;

    let mut corrected = full_block;
    for (&pos, &mag) in positions.iter().zip(&magnitudes) {
        if pos < padding {
            // Errata in the zero-padded region of a shortened code.
            return Err(RsDecodeError);
        }
        corrected[pos] = gf_add(corrected[pos], mag);
    }

    if compute_syndromes(&corrected, parity_len).iter().any(|&s| s != 0) {
        return Err(RsDecodeError);
    }

    Ok((
        corrected[padding..padding + data_len].to_vec(),
        (degree - rho, rho),
    ))
}

/// RS-decode a codeword produced by [`encode_symbols`].
///
/// The block layout is inferred from the codeword length. `erasures` are
/// symbol indices into the whole codeword that are known to be unreliable;
/// duplicates are ignored.
///
/// # Errors
/// Returns [`RsDecodeError`] if the codeword length is impossible for this
/// parity length, or any block has `2 * errors + erasures > parity_len`.
pub fn decode_symbols(
    codeword: &[u8],
    parity_len: usize,
    erasures: &[usize],
) -> Result<(Vec<u8>, RsDecodeStats), RsDecodeError> {
    let total_data_len = rs_data_len(codeword.len(), parity_len).ok_or(RsDecodeError)?;

    let mut erasures = erasures.to_vec();
    erasures.sort_unstable();
    erasures.dedup();

    let mut decoded = Vec::with_capacity(total_data_len);
    let mut stats = RsDecodeStats::default();
    let mut offset = 0;

    for data_len in block_data_lens(total_data_len, parity_len) {
        let block_len = data_len + parity_len;
        let block = &codeword[offset..offset + block_len];
        let erased: Vec<usize> = erasures
            .iter()
            .filter(|&&e| e >= offset && e < offset + block_len)
            .map(|&e| e - offset)
            .collect();

        let (data, (errors, erased_count)) = rs_decode_block(block, data_len, parity_len, &erased)?;
        decoded.extend_from_slice(&data);

        stats.errors_corrected += errors;
        stats.erasures_filled += erased_count;
        stats.num_blocks += 1;
        stats.max_block_errata = stats.max_block_errata.max(2 * errors + erased_count);

        offset += block_len;
    }

    stats.error_capacity = stats.num_blocks * (parity_len / 2);
    Ok((decoded, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 37 + 11) as u8).collect()
    }

    #[test]
    fn gf_inverse_roundtrip() {
        for a in 1..=255u8 {
            assert_eq!(gf_mul(a, gf_inv(a)), 1, "a={a}");
        }
    }

    #[test]
    fn generator_has_expected_roots() {
        let g = build_gen_poly(16);
        assert_eq!(g.len(), 17);
        for i in 0..16 {
            assert_eq!(poly_eval(&g, alpha_pow(i)), 0, "alpha^{i} must be a root");
        }
    }

    #[test]
    fn encoded_len_matches_layout() {
        assert_eq!(rs_encoded_len(0, 64), 64);
        assert_eq!(rs_encoded_len(12, 64), 76);
        assert_eq!(rs_encoded_len(191, 64), 255);
        assert_eq!(rs_encoded_len(192, 64), 255 + 1 + 64);
        assert_eq!(rs_encoded_len(0, 0), 0);
        assert_eq!(rs_encoded_len(300, 0), 300);
        for len in [0, 1, 12, 190, 191, 192, 500, 1000] {
            assert_eq!(encode_symbols(&sample_payload(len), 64).len(), rs_encoded_len(len, 64));
        }
    }

    #[test]
    fn data_len_inverts_encoded_len() {
        for parity in [0, 2, 32, 64, 200, 254] {
            for len in [0, 1, 2, 50, 190, 191, 192, 253, 254, 255, 256, 600] {
                let encoded = rs_encoded_len(len, parity);
                assert_eq!(rs_data_len(encoded, parity), Some(len), "len={len}, parity={parity}");
            }
        }
        assert_eq!(rs_data_len(10, 64), None);
        assert_eq!(rs_data_len(255 + 64, 64), None); // trailing empty block
        assert_eq!(rs_data_len(0, 64), None);
    }

    #[test]
    fn clean_roundtrip() {
        let payload = b"Hello world!".to_vec();
        let encoded = encode_symbols(&payload, 64);
        assert_eq!(&encoded[..payload.len()], &payload[..], "systematic");
        let (decoded, stats) = decode_symbols(&encoded, 64, &[]).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(stats.errors_corrected, 0);
        assert_eq!(stats.num_blocks, 1);
        assert_eq!(stats.error_capacity, 32);
    }

    #[test]
    fn empty_payload_is_protected() {
        let encoded = encode_symbols(&[], 8);
        assert_eq!(encoded.len(), 8);
        let (decoded, _) = decode_symbols(&encoded, 8, &[]).unwrap();
        assert!(decoded.is_empty());

        let mut corrupted = encoded.clone();
        corrupted[3] ^= 0x40;
        let (decoded, stats) = decode_symbols(&corrupted, 8, &[]).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(stats.errors_corrected, 1);
    }

    #[test]
    fn corrects_up_to_half_parity_errors() {
        let payload = sample_payload(100);
        let mut encoded = encode_symbols(&payload, 64);
        for i in 0..32 {
            encoded[i * 5] ^= 0xA5;
        }
        let (decoded, stats) = decode_symbols(&encoded, 64, &[]).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(stats.errors_corrected, 32);
        assert_eq!(stats.max_block_errata, 64);
    }

    #[test]
    fn too_many_errors_fail() {
        let payload = sample_payload(100);
        let mut encoded = encode_symbols(&payload, 64);
        for i in 0..40 {
            encoded[i * 4] ^= 0x3C;
        }
        assert_eq!(decode_symbols(&encoded, 64, &[]), Err(RsDecodeError));
    }

    #[test]
    fn corrects_full_parity_of_erasures() {
        let payload = sample_payload(60);
        let encoded = encode_symbols(&payload, 16);
        let mut corrupted = encoded.clone();
        let erased: Vec<usize> = (0..16).map(|i| i * 4 + 1).collect();
        for &e in &erased {
            corrupted[e] = 0;
        }
        let (decoded, stats) = decode_symbols(&corrupted, 16, &erased).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(stats.erasures_filled, 16);
        assert_eq!(stats.errors_corrected, 0);
    }

    #[test]
    fn erasure_plus_errors_within_bound() {
        // 2 * 5 errors + 6 erasures = 16 = parity.
        let payload = sample_payload(80);
        let encoded = encode_symbols(&payload, 16);
        let mut corrupted = encoded.clone();
        let erased = [0usize, 7, 20, 33, 50, 90];
        for &e in &erased {
            corrupted[e] ^= 0xFF;
        }
        for e in [3usize, 15, 41, 60, 77] {
            corrupted[e] ^= 0x11;
        }
        let (decoded, stats) = decode_symbols(&corrupted, 16, &erased).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(stats.errors_corrected, 5);
        assert_eq!(stats.erasures_filled, 6);
    }

    #[test]
    fn erasures_beyond_parity_fail() {
        let payload = sample_payload(40);
        let encoded = encode_symbols(&payload, 8);
        let erased: Vec<usize> = (0..9).collect();
        assert_eq!(decode_symbols(&encoded, 8, &erased), Err(RsDecodeError));
    }

    #[test]
    fn erased_but_intact_symbols_decode_cleanly() {
        let payload = sample_payload(30);
        let encoded = encode_symbols(&payload, 8);
        let (decoded, stats) = decode_symbols(&encoded, 8, &[1, 2, 3]).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(stats.errors_corrected, 0);
    }

    #[test]
    fn multi_block_roundtrip_with_errors() {
        let payload = sample_payload(500); // 3 blocks at parity 64
        let mut encoded = encode_symbols(&payload, 64);
        // 10 errors in each block.
        for block in 0..3 {
            for i in 0..10 {
                encoded[block * 255 + i * 7] ^= 0x5A;
            }
        }
        let erased = [255 + 200, 2 * 255 + 3];
        let (decoded, stats) = decode_symbols(&encoded, 64, &erased).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(stats.num_blocks, 3);
        assert_eq!(stats.errors_corrected, 30);
        assert_eq!(stats.error_capacity, 96);
    }

    #[test]
    fn zero_parity_passthrough() {
        let payload = sample_payload(20);
        let encoded = encode_symbols(&payload, 0);
        assert_eq!(encoded, payload);
        assert_eq!(decode_symbols(&encoded, 0, &[]).unwrap().0, payload);
        assert_eq!(decode_symbols(&encoded, 0, &[4]), Err(RsDecodeError));
    }

    #[test]
    fn impossible_codeword_length_rejected() {
        assert_eq!(decode_symbols(&[0u8; 10], 64, &[]), Err(RsDecodeError));
    }
}
