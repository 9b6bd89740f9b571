//! SEG filter for masking low-complexity regions in protein sequences.
//!
//! Works over NCBISTDAA codes. A sliding window of `window` residues gets a
//! Shannon-entropy score (bits, over the 20-letter subalphabet); positions
//! whose window entropy drops to `locut` trigger a segment that extends in
//! both directions while entropy stays at or below `hicut`. Segments are
//! trimmed to their minimum-entropy core (losing at most `maxtrim`
//! residues), and segments with more than `maxbogus` non-standard residues
//! are discarded outright.

use crate::error::{Result, SeedError};
use crate::utils::dust::{FilterKind, MaskedInterval};

/// SEG parameters.
#[derive(Debug, Clone)]
pub struct SegParams {
    /// Window size in residues.
    pub window: usize,
    /// Trigger entropy: a window at or below this starts a segment.
    pub locut: f64,
    /// Extension entropy: a segment extends while windows stay at or
    /// below this.
    pub hicut: f64,
    /// Stride between trigger positions.
    pub period: usize,
    /// When merging, high-complexity gaps shorter than this are absorbed.
    pub hilenmin: usize,
    /// Merge segments (overlaps always; short gaps per `hilenmin`).
    pub overlaps: bool,
    /// Most residues the trim step may cut from a segment.
    pub maxtrim: usize,
    /// Most non-standard residues tolerated per window and per segment.
    pub maxbogus: usize,
}

impl Default for SegParams {
    fn default() -> Self {
        Self {
            window: 12,
            locut: 2.2,
            hicut: 2.5,
            period: 1,
            hilenmin: 0,
            overlaps: false,
            maxtrim: 50,
            maxbogus: 2,
        }
    }
}

impl SegParams {
    pub fn validate(&self) -> Result<()> {
        if self.window < 2 {
            return Err(SeedError::invalid(
                "seg",
                "window",
                format!("must be at least 2, got {}", self.window),
            ));
        }
        if self.locut < 0.0 {
            return Err(SeedError::invalid(
                "seg",
                "locut",
                format!("must be non-negative, got {}", self.locut),
            ));
        }
        if self.hicut < self.locut {
            return Err(SeedError::invalid(
                "seg",
                "hicut",
                format!("must be >= locut ({} < {})", self.hicut, self.locut),
            ));
        }
        if self.period == 0 {
            return Err(SeedError::invalid("seg", "period", "must be positive"));
        }
        Ok(())
    }
}

/// Map an NCBISTDAA code to the 20-letter SEG alphabet, `None` for bogus
/// residues (gap, B, X, Z, U, *, O, J).
#[inline]
fn alpha_index(code: u8) -> Option<usize> {
    match code {
        1 => Some(0),                          // A
        3..=20 => Some((code - 2) as usize),   // C..W
        22 => Some(19),                        // Y
        _ => None,
    }
}

/// Shannon entropy in bits of a residue-count vector.
fn entropy_bits(counts: &[u32; 20]) -> f64 {
    let total: u32 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let mut h = 0.0f64;
    for &c in counts {
        if c > 0 {
            let p = c as f64 / total;
            h -= p * p.log2();
        }
    }
    h
}

/// SEG masker over NCBISTDAA-encoded sequences.
pub struct SegMasker {
    params: SegParams,
    downset: usize,
    upset: usize,
}

impl SegMasker {
    pub fn new(params: SegParams) -> Result<Self> {
        params.validate()?;
        let downset = (params.window + 1) / 2 - 1;
        let upset = params.window - downset;
        Ok(Self {
            params,
            downset,
            upset,
        })
    }

    pub fn with_defaults() -> Self {
        let params = SegParams::default();
        let downset = (params.window + 1) / 2 - 1;
        let upset = params.window - downset;
        Self {
            params,
            downset,
            upset,
        }
    }

    /// Mask `seq` (NCBISTDAA codes); intervals come back shifted by
    /// `offset`, sorted and non-overlapping. The input is never mutated.
    pub fn mask_sequence(&self, seq: &[u8], offset: usize) -> Vec<MaskedInterval> {
        let mut segments = self.find_segments(seq);
        segments = self.merge_segments(segments);
        let result: Vec<MaskedInterval> = segments
            .into_iter()
            .map(|(s, e)| MaskedInterval::new(s + offset, e + offset, FilterKind::Seg))
            .collect();
        log::debug!(
            "seg: {} interval(s) over {} residues (window={}, locut={}, hicut={})",
            result.len(),
            seq.len(),
            self.params.window,
            self.params.locut,
            self.params.hicut
        );
        result
    }

    /// Per-position window entropy, -1.0 where the window is invalid
    /// (out of range or more than `maxbogus` bogus residues).
    fn entropy_array(&self, seq: &[u8]) -> Vec<f64> {
        let len = seq.len();
        let mut h = vec![-1.0f64; len];
        if len < self.params.window {
            return h;
        }
        let first = self.downset;
        let last = len - self.upset;
        for i in first..=last {
            let ws = i - self.downset;
            let we = ws + self.params.window;
            let mut counts = [0u32; 20];
            let mut bogus = 0usize;
            for &aa in &seq[ws..we] {
                match alpha_index(aa) {
                    Some(idx) => counts[idx] += 1,
                    None => bogus += 1,
                }
            }
            if bogus <= self.params.maxbogus {
                h[i] = entropy_bits(&counts);
            }
        }
        h
    }

    /// Inclusive low-complexity segments, window-triggered and trimmed.
    fn find_segments(&self, seq: &[u8]) -> Vec<(usize, usize)> {
        let len = seq.len();
        let mut segments = Vec::new();
        if len < self.params.window {
            return segments;
        }
        let h = self.entropy_array(seq);
        let first = self.downset;
        let last = len - self.upset;
        let mut lowlim = first;

        let mut i = first;
        while i <= last {
            if h[i] >= 0.0 && h[i] <= self.params.locut {
                let loi = self.extend_left(i, lowlim, &h);
                let hii = self.extend_right(i, last, &h);
                let leftend = loi - self.downset;
                let rightend = hii + self.upset - 1;
                let (leftend, rightend) = self.trim(seq, leftend, rightend);

                if self.segment_bogus(seq, leftend, rightend) <= self.params.maxbogus {
                    segments.push((leftend, rightend));
                }

                i = hii.min(rightend + self.downset);
                lowlim = i + 1;
                i += 1;
            } else {
                i += self.params.period;
            }
        }
        segments
    }

    fn extend_left(&self, i: usize, limit: usize, h: &[f64]) -> usize {
        let mut j = i;
        while j > limit {
            let v = h[j - 1];
            if v < 0.0 || v > self.params.hicut {
                break;
            }
            j -= 1;
        }
        j
    }

    fn extend_right(&self, i: usize, limit: usize, h: &[f64]) -> usize {
        let mut j = i;
        while j < limit {
            let v = h[j + 1];
            if v < 0.0 || v > self.params.hicut {
                break;
            }
            j += 1;
        }
        j
    }

    /// Shrink `[leftend, rightend]` to the minimum-entropy subwindow, giving
    /// up at most `maxtrim` residues. Longer subwindows win entropy ties.
    fn trim(&self, seq: &[u8], leftend: usize, rightend: usize) -> (usize, usize) {
        let seg_len = rightend - leftend + 1;
        let minlen = seg_len.saturating_sub(self.params.maxtrim).max(1);
        if minlen >= seg_len {
            return (leftend, rightend);
        }

        let mut best = (leftend, rightend);
        let mut best_entropy = f64::MAX;
        for cur_len in (minlen..=seg_len).rev() {
            let mut counts = [0u32; 20];
            for &aa in &seq[leftend..leftend + cur_len] {
                if let Some(idx) = alpha_index(aa) {
                    counts[idx] += 1;
                }
            }
            let mut start = leftend;
            loop {
                let e = entropy_bits(&counts);
                if e < best_entropy {
                    best_entropy = e;
                    best = (start, start + cur_len - 1);
                }
                if start + cur_len > rightend {
                    break;
                }
                if let Some(idx) = alpha_index(seq[start]) {
                    counts[idx] -= 1;
                }
                if let Some(idx) = alpha_index(seq[start + cur_len]) {
                    counts[idx] += 1;
                }
                start += 1;
            }
        }
        best
    }

    fn segment_bogus(&self, seq: &[u8], start: usize, end: usize) -> usize {
        seq[start..=end]
            .iter()
            .filter(|&&aa| alpha_index(aa).is_none())
            .count()
    }

    fn merge_segments(&self, mut segments: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
        if segments.is_empty() {
            return segments;
        }
        segments.sort_by_key(|&(s, _)| s);
        let mut merged: Vec<(usize, usize)> = Vec::new();
        for (s, e) in segments {
            if let Some(last) = merged.last_mut() {
                let overlap = s <= last.1 + 1;
                let short_gap = self.params.overlaps
                    && s > last.1
                    && s - last.1 - 1 < self.params.hilenmin;
                if overlap || short_gap {
                    last.1 = last.1.max(e);
                    continue;
                }
            }
            merged.push((s, e));
        }
        merged
    }
}

/// Filter entry point matching the common filter contract.
pub fn seg_filter(seq: &[u8], offset: usize, params: &SegParams) -> Result<Vec<MaskedInterval>> {
    let masker = SegMasker::new(params.clone())?;
    Ok(masker.mask_sequence(seq, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blast_encoding::{translate, Alphabet};

    fn stdaa(seq: &[u8]) -> Vec<u8> {
        translate(seq, Alphabet::Iupacaa, Alphabet::Ncbistdaa).unwrap()
    }

    #[test]
    fn test_poly_alanine_masked() {
        let seq = stdaa(&vec![b'A'; 50]);
        let intervals = seg_filter(&seq, 0, &SegParams::default()).unwrap();
        assert_eq!(intervals.len(), 1);
        assert!(intervals[0].len() >= 30);
        assert_eq!(intervals[0].filter, FilterKind::Seg);
    }

    #[test]
    fn test_diverse_sequence_unmasked() {
        // Cycle through all 20 standard residues.
        let letters = b"ACDEFGHIKLMNPQRSTVWY";
        let seq: Vec<u8> = (0..100).map(|i| letters[i % 20]).collect();
        let intervals = seg_filter(&stdaa(&seq), 0, &SegParams::default()).unwrap();
        let masked: usize = intervals.iter().map(|m| m.len()).sum();
        assert!(masked < seq.len() / 2);
    }

    #[test]
    fn test_low_complexity_core_in_context() {
        let mut seq = Vec::new();
        seq.extend_from_slice(b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQ");
        seq.extend_from_slice(&vec![b'S'; 25]);
        seq.extend_from_slice(b"WDERTNLVKHTYQGMNPATGEVC");
        let coded = stdaa(&seq);
        let intervals = seg_filter(&coded, 0, &SegParams::default()).unwrap();
        assert_eq!(intervals.len(), 1);
        // The masked core must cover most of the poly-S stretch.
        let m = &intervals[0];
        assert!(m.start >= 30 && m.end < 60, "got [{}, {}]", m.start, m.end);
        assert!(m.len() >= 20);
    }

    #[test]
    fn test_bogus_heavy_segment_discarded() {
        // X runs are bogus; windows over them are invalid and segments
        // dominated by them are dropped.
        let seq = stdaa(&vec![b'X'; 40]);
        let intervals = seg_filter(&seq, 0, &SegParams::default()).unwrap();
        assert!(intervals.is_empty());
    }

    #[test]
    fn test_short_sequence_empty() {
        let seq = stdaa(b"MKTAY");
        let intervals = seg_filter(&seq, 0, &SegParams::default()).unwrap();
        assert!(intervals.is_empty());
    }

    #[test]
    fn test_offset_shift() {
        let seq = stdaa(&vec![b'A'; 50]);
        let at_zero = seg_filter(&seq, 0, &SegParams::default()).unwrap();
        let shifted = seg_filter(&seq, 200, &SegParams::default()).unwrap();
        assert_eq!(shifted[0].start, at_zero[0].start + 200);
        assert_eq!(shifted[0].end, at_zero[0].end + 200);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let p = SegParams {
            hicut: 1.0,
            locut: 2.0,
            ..SegParams::default()
        };
        assert!(matches!(
            seg_filter(&[1, 1, 1], 0, &p),
            Err(SeedError::InvalidParameter { .. })
        ));

        let p = SegParams {
            window: 0,
            ..SegParams::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_overlaps_merging() {
        // Two low stretches separated by a short diverse spacer merge only
        // when overlaps/hilenmin allow it.
        let mut seq = Vec::new();
        seq.extend_from_slice(&vec![b'A'; 25]);
        seq.extend_from_slice(b"WDERTNLVKHC");
        seq.extend_from_slice(&vec![b'S'; 25]);
        let coded = stdaa(&seq);

        let plain = seg_filter(&coded, 0, &SegParams::default()).unwrap();
        let merged = seg_filter(
            &coded,
            0,
            &SegParams {
                overlaps: true,
                hilenmin: 20,
                ..SegParams::default()
            },
        )
        .unwrap();
        assert!(merged.len() <= plain.len());
        if merged.len() == 1 {
            assert!(merged[0].len() > plain.iter().map(|m| m.len()).max().unwrap_or(0));
        }
    }
}
