//! Triplet complexity scoring, shared between the DUST filter and the hash
//! populator's word filtering.
//!
//! The score over a stretch of 2-bit codes counts repeated triplets:
//! `raw = sum over triplets of c*(c-1)/2`, normalized per position as
//! `10 * raw / (triplets - 1)`. A window made of one repeated base scores
//! `5 * triplets`; a window where every triplet is distinct scores 0. The
//! score is a pure function of the window contents, independent of where
//! the window sits in the sequence.

/// Number of distinct triplets over the 2-bit nucleotide alphabet.
pub const TRIPLET_STATES: usize = 64;

/// Raw repeated-triplet count over a window of 2-bit codes.
pub fn triplet_raw_score(codes: &[u8]) -> u32 {
    if codes.len() < 3 {
        return 0;
    }
    let mut counts = [0u32; TRIPLET_STATES];
    let mut raw = 0u32;
    let mut triplet = ((codes[0] & 3) as usize) << 2 | (codes[1] & 3) as usize;
    for &c in &codes[2..] {
        triplet = ((triplet << 2) | (c & 3) as usize) & 0x3F;
        raw += counts[triplet];
        counts[triplet] += 1;
    }
    raw
}

/// DUST-style per-position score of a window of 2-bit codes.
pub fn window_score(codes: &[u8]) -> f64 {
    let triplets = codes.len().saturating_sub(2);
    if triplets < 2 {
        return 0.0;
    }
    10.0 * triplet_raw_score(codes) as f64 / (triplets - 1) as f64
}

/// Complexity of a packed 2-bit word, on the scale used by the populator's
/// `max_simplicity` ceiling (window score divided by 10, so the customary
/// ceiling of 2.0 admits words whose triplet repetition stays moderate).
pub fn word_complexity(word: u64, width: usize) -> f64 {
    let mut codes = vec![0u8; width];
    let mut w = word;
    for i in (0..width).rev() {
        codes[i] = (w & 3) as u8;
        w >>= 2;
    }
    window_score(&codes) / 10.0
}
