use super::perceptual::Fingerprint;

/// Count of differing bit positions.
///
/// Fingerprints of different lengths come from different hash parameters and
/// are never comparable; they are treated as maximally distant.
pub fn hamming_distance(a: &Fingerprint, b: &Fingerprint) -> u32 {
    if a.len() != b.len() {
        return a.len().max(b.len()) as u32;
    }
    a.words()
        .iter()
        .zip(b.words())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum()
}

/// Largest distance still counted as a match for a similarity percentage.
///
/// `round((100 - S) / 100 * bit_len)`; S is clamped to 0..=100 so S=100 only
/// accepts identical fingerprints and S=0 accepts everything.
pub fn threshold_from_similarity(similarity: u8, bit_len: usize) -> u32 {
    let s = similarity.min(100) as f64;
    ((100.0 - s) / 100.0 * bit_len as f64).round() as u32
}

/// Similarity of a distance as a rounded 0-100 score
pub fn similarity_score(distance: u32, bit_len: usize) -> u8 {
    if bit_len == 0 {
        return 100;
    }
    let d = distance.min(bit_len as u32) as f64;
    (100.0 - d / bit_len as f64 * 100.0).round() as u8
}
