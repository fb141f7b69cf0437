//! DCT-based perceptual hashing.
//!
//! The hasher takes the `grid`×`grid` grayscale frame produced by the loader,
//! runs an orthonormal 2D DCT-II over it, keeps the `block`×`block` lowest
//! frequencies minus the DC term, and emits one bit per kept coefficient:
//! set when the coefficient is above the median of the kept coefficients.
//!
//! Only the first `block` frequencies of each axis are evaluated. Because the
//! transform is separable, this yields exactly the top-left corner of the
//! full transform without computing the discarded high frequencies.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::common::errors::DedupError;

/// Transform sizes. Every image in one run must share the same values,
/// otherwise fingerprints are not comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashParams {
    /// Side of the grayscale grid (N)
    pub grid: u32,
    /// Side of the retained low-frequency block (K)
    pub block: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self { grid: 32, block: 8 }
    }
}

impl HashParams {
    /// Fingerprint length: K×K coefficients minus the DC term
    pub fn bit_len(&self) -> usize {
        (self.block * self.block) as usize - 1
    }

    pub fn validate(&self) -> Result<(), DedupError> {
        if self.block < 2 {
            return Err(DedupError::config(format!(
                "hash block must be at least 2, got {}",
                self.block
            )));
        }
        if self.block > self.grid {
            return Err(DedupError::config(format!(
                "hash block ({}) cannot exceed grid ({})",
                self.block, self.grid
            )));
        }
        if self.grid > 256 {
            return Err(DedupError::config(format!(
                "hash grid must be at most 256, got {}",
                self.grid
            )));
        }
        Ok(())
    }
}

/// Square grayscale sample grid, row-major, values in 0..=255
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    side: usize,
    pixels: Vec<f64>,
}

impl Frame {
    /// Returns `None` when `pixels` is not `side * side` long
    pub fn new(side: usize, pixels: Vec<f64>) -> Option<Self> {
        (side > 0 && pixels.len() == side * side).then_some(Self { side, pixels })
    }

    /// Caller guarantees `pixels.len() == side * side`
    pub(crate) fn square(side: usize, pixels: Vec<f64>) -> Self {
        debug_assert_eq!(pixels.len(), side * side);
        Self { side, pixels }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }
}

/// Fixed-length bit vector, packed little-endian into 64-bit words
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    words: Vec<u64>,
    len: usize,
}

impl Fingerprint {
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut words = vec![0u64; bits.len().div_ceil(64)];
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                words[i / 64] |= 1u64 << (i % 64);
            }
        }
        Self {
            words,
            len: bits.len(),
        }
    }

    /// Number of bits
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bit(&self, i: usize) -> bool {
        i < self.len && self.words[i / 64] & (1u64 << (i % 64)) != 0
    }

    pub(crate) fn words(&self) -> &[u64] {
        &self.words
    }

    /// Hex rendering, most significant word first
    pub fn to_hex(&self) -> String {
        self.words
            .iter()
            .rev()
            .map(|w| format!("{:016x}", w))
            .collect()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({}b:{})", self.len, self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Computes fingerprints for frames of one fixed size.
///
/// The cosine basis is built once and shared across threads.
#[derive(Debug, Clone)]
pub struct PerceptualHasher {
    params: HashParams,
    /// `block` rows of `grid` basis values, orthonormal scaling applied
    basis: Vec<f64>,
}

impl PerceptualHasher {
    pub fn new(params: HashParams) -> Self {
        let n = params.grid as usize;
        let k = params.block as usize;
        let mut basis = Vec::with_capacity(k * n);
        for u in 0..k {
            let alpha = if u == 0 {
                (1.0 / n as f64).sqrt()
            } else {
                (2.0 / n as f64).sqrt()
            };
            for x in 0..n {
                let angle = (2 * x + 1) as f64 * u as f64 * PI / (2.0 * n as f64);
                basis.push(alpha * angle.cos());
            }
        }
        Self { params, basis }
    }

    pub fn params(&self) -> HashParams {
        self.params
    }

    pub fn bit_len(&self) -> usize {
        self.params.bit_len()
    }

    /// Low-frequency DCT coefficients, row-major `block`×`block`, DC first
    pub fn low_frequencies(&self, frame: &Frame) -> Vec<f64> {
        let n = self.params.grid as usize;
        let k = self.params.block as usize;
        debug_assert_eq!(frame.side(), n);
        let px = frame.pixels();

        // Rows: temp[y][v] = sum_x px[y][x] * basis[v][x]
        let mut temp = vec![0.0; n * k];
        for y in 0..n {
            let row = &px[y * n..(y + 1) * n];
            for v in 0..k {
                let b = &self.basis[v * n..(v + 1) * n];
                temp[y * k + v] = row.iter().zip(b).map(|(p, c)| p * c).sum();
            }
        }

        // Columns: out[u][v] = sum_y temp[y][v] * basis[u][y]
        let mut out = vec![0.0; k * k];
        for u in 0..k {
            let b = &self.basis[u * n..(u + 1) * n];
            for v in 0..k {
                out[u * k + v] = (0..n).map(|y| temp[y * k + v] * b[y]).sum();
            }
        }
        out
    }

    /// Fingerprint a frame of `grid`×`grid` samples
    pub fn hash(&self, frame: &Frame) -> Fingerprint {
        let coefficients = self.low_frequencies(frame);
        let ac = &coefficients[1..];
        let median = median(ac);
        let bits: Vec<bool> = ac.iter().map(|&c| c > median).collect();
        Fingerprint::from_bits(&bits)
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_from_fn(n: usize, f: impl Fn(usize, usize) -> f64) -> Frame {
        let mut px = Vec::with_capacity(n * n);
        for y in 0..n {
            for x in 0..n {
                px.push(f(x, y));
            }
        }
        Frame::new(n, px).unwrap()
    }

    #[test]
    fn default_fingerprint_is_63_bits() {
        let hasher = PerceptualHasher::new(HashParams::default());
        let frame = frame_from_fn(32, |x, y| ((x * 7 + y * 13) % 256) as f64);
        assert_eq!(hasher.hash(&frame).len(), 63);
    }

    #[test]
    fn dc_coefficient_is_scaled_mean() {
        let hasher = PerceptualHasher::new(HashParams::default());
        let frame = frame_from_fn(32, |_, _| 100.0);
        let coeffs = hasher.low_frequencies(&frame);
        // Orthonormal DC of a constant N×N grid is N * value
        assert!((coeffs[0] - 3200.0).abs() < 1e-6);
        assert!(coeffs[1..].iter().all(|c| c.abs() < 1e-6));
    }

    #[test]
    fn brightness_shift_does_not_change_hash() {
        let hasher = PerceptualHasher::new(HashParams::default());
        let texture = |x: usize, y: usize| ((x * 73_856_093 ^ y * 19_349_663) % 200) as f64;
        let base = frame_from_fn(32, texture);
        let brighter = frame_from_fn(32, |x, y| texture(x, y) + 40.0);
        assert_eq!(hasher.hash(&base), hasher.hash(&brighter));
    }

    #[test]
    fn median_splits_bits_roughly_in_half() {
        let hasher = PerceptualHasher::new(HashParams::default());
        let frame = frame_from_fn(32, |x, y| ((x * x + 3 * y) % 251) as f64);
        let fp = hasher.hash(&frame);
        let ones = (0..fp.len()).filter(|&i| fp.bit(i)).count();
        assert!(ones <= 32, "at most half the bits can exceed the median, got {ones}");
    }

    #[test]
    fn params_validation() {
        assert!(HashParams::default().validate().is_ok());
        assert!(HashParams { grid: 32, block: 1 }.validate().is_err());
        assert!(HashParams { grid: 4, block: 8 }.validate().is_err());
        assert!(HashParams { grid: 512, block: 8 }.validate().is_err());
        assert_eq!(HashParams { grid: 16, block: 4 }.bit_len(), 15);
    }

    #[test]
    fn fingerprint_bits_round_trip_beyond_one_word() {
        let bits: Vec<bool> = (0..99).map(|i| i % 3 == 0).collect();
        let fp = Fingerprint::from_bits(&bits);
        assert_eq!(fp.len(), 99);
        assert!((0..99).all(|i| fp.bit(i) == bits[i]));
        assert!(!fp.bit(200));
    }
}
