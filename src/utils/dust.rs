//! DUST filter for masking low-complexity regions in nucleotide sequences.
//!
//! Slides a window of at most `window` bases in half-window steps, finds the
//! highest-scoring triplet-repetition subwindow within each, and masks it
//! when the score exceeds `level`. Masked stretches are extended by `linker`
//! on each side; stretches shorter than `minwin` are dropped, and adjacent
//! stretches separated by a gap smaller than `linker` are coalesced.

use crate::error::{Result, SeedError};
use crate::utils::complexity::TRIPLET_STATES;

/// Which filter produced a masked interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Dust,
    Seg,
}

/// A masked region of a sequence: 0-based, inclusive `[start, end]`, in the
/// caller's full-sequence coordinate space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedInterval {
    pub start: usize,
    pub end: usize,
    pub filter: FilterKind,
}

impl MaskedInterval {
    pub fn new(start: usize, end: usize, filter: FilterKind) -> Self {
        Self { start, end, filter }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    #[inline]
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos <= self.end
    }

    /// True if a window `[start, start+width)` overlaps this interval.
    #[inline]
    pub fn overlaps_window(&self, start: usize, width: usize) -> bool {
        start <= self.end && start + width > self.start
    }
}

/// Complement of a masked-interval list over `[0, len)`, as half-open
/// `(start, end)` segments. Input intervals must be sorted and
/// non-overlapping, as the filters produce them.
pub fn unmasked_segments(len: usize, masks: &[MaskedInterval]) -> Vec<(usize, usize)> {
    let mut segments = Vec::new();
    let mut cursor = 0usize;
    for m in masks {
        if m.start > cursor {
            segments.push((cursor, m.start));
        }
        cursor = cursor.max(m.end + 1);
    }
    if cursor < len {
        segments.push((cursor, len));
    }
    segments
}

/// DUST parameters.
#[derive(Debug, Clone)]
pub struct DustParams {
    /// Score threshold (2..=64).
    pub level: u32,
    /// Window size in bases (8..=64).
    pub window: usize,
    /// Minimum masked-stretch length to keep.
    pub minwin: usize,
    /// Extension applied to each side of a masked stretch, and the largest
    /// gap coalesced between adjacent stretches (1..=32).
    pub linker: usize,
}

impl Default for DustParams {
    fn default() -> Self {
        Self {
            level: 20,
            window: 64,
            minwin: 4,
            linker: 1,
        }
    }
}

impl DustParams {
    pub fn validate(&self) -> Result<()> {
        if !(2..=64).contains(&self.level) {
            return Err(SeedError::invalid(
                "dust",
                "level",
                format!("must be in 2..=64, got {}", self.level),
            ));
        }
        if !(8..=64).contains(&self.window) {
            return Err(SeedError::invalid(
                "dust",
                "window",
                format!("must be in 8..=64, got {}", self.window),
            ));
        }
        if self.minwin == 0 || self.minwin > self.window {
            return Err(SeedError::invalid(
                "dust",
                "minwin",
                format!("must be in 1..=window, got {}", self.minwin),
            ));
        }
        if !(1..=32).contains(&self.linker) {
            return Err(SeedError::invalid(
                "dust",
                "linker",
                format!("must be in 1..=32, got {}", self.linker),
            ));
        }
        Ok(())
    }
}

/// DUST masker over IUPACNA input. Ambiguous bases split the sequence into
/// independently scanned runs; they are never masked themselves.
pub struct DustMasker {
    params: DustParams,
}

impl DustMasker {
    pub fn new(params: DustParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn with_defaults() -> Self {
        Self {
            params: DustParams::default(),
        }
    }

    /// Mask `seq`, reporting intervals shifted by `offset` into the
    /// caller's coordinate space. The input buffer is never mutated.
    pub fn mask_sequence(&self, seq: &[u8], offset: usize) -> Vec<MaskedInterval> {
        let mut result: Vec<MaskedInterval> = Vec::new();
        for (run_start, codes) in unambiguous_runs(seq) {
            self.mask_run(&codes, run_start, &mut result);
        }
        for m in &mut result {
            m.start += offset;
            m.end += offset;
        }
        log::debug!(
            "dust: {} interval(s) over {} bases (level={}, window={})",
            result.len(),
            seq.len(),
            self.params.level,
            self.params.window
        );
        result
    }

    fn mask_run(&self, codes: &[u8], run_start: usize, result: &mut Vec<MaskedInterval>) {
        let len = codes.len();
        if len < 3 {
            return;
        }
        let half = (self.params.window / 2).max(1);
        let mut i = 0usize;
        while i < len {
            let l = (len - i).min(self.params.window);
            if l < 3 {
                break;
            }
            if let Some((a, b)) = self.best_subwindow(&codes[i..i + l]) {
                // Linker extension, clamped to the run.
                let start = run_start + (i + a).saturating_sub(self.params.linker);
                let end = run_start + (i + b + self.params.linker).min(len - 1);
                self.push_merged(result, start, end);
            }
            i += half;
        }
    }

    /// Highest-scoring subwindow of at least `minwin` bases whose score
    /// exceeds `level`, as window-relative inclusive bounds.
    fn best_subwindow(&self, codes: &[u8]) -> Option<(usize, usize)> {
        let l = codes.len();
        let mut best: Option<(usize, usize, f64)> = None;
        for j in 0..l.saturating_sub(2) {
            let mut counts = [0u32; TRIPLET_STATES];
            let mut raw = 0u32;
            let mut triplet = ((codes[j] & 3) as usize) << 2 | (codes[j + 1] & 3) as usize;
            for i in j + 2..l {
                triplet = ((triplet << 2) | (codes[i] & 3) as usize) & 0x3F;
                raw += counts[triplet];
                counts[triplet] += 1;
                let triplets = i - j - 1;
                if triplets < 2 {
                    continue;
                }
                let span = i - j + 1;
                if span < self.params.minwin {
                    continue;
                }
                let score = 10.0 * raw as f64 / (triplets - 1) as f64;
                if score > self.params.level as f64 {
                    match best {
                        // Prefer higher score; on ties, the longer span.
                        Some((_, _, s)) if score < s => {}
                        Some((bj, bi, s)) if score == s && (bi - bj) >= (i - j) => {}
                        _ => best = Some((j, i, score)),
                    }
                }
            }
        }
        best.map(|(j, i, _)| (j, i))
    }

    fn push_merged(&self, result: &mut Vec<MaskedInterval>, start: usize, end: usize) {
        if let Some(last) = result.last_mut() {
            // Coalesce when the gap is smaller than the linker.
            if start <= last.end + self.params.linker {
                last.end = last.end.max(end);
                return;
            }
        }
        result.push(MaskedInterval::new(start, end, FilterKind::Dust));
    }
}

/// Filter entry point matching the common filter contract.
pub fn dust_filter(seq: &[u8], offset: usize, params: &DustParams) -> Result<Vec<MaskedInterval>> {
    let masker = DustMasker::new(params.clone())?;
    Ok(masker.mask_sequence(seq, offset))
}

/// Split into maximal runs of unambiguous bases, each as (start, 2-bit codes).
fn unambiguous_runs(seq: &[u8]) -> Vec<(usize, Vec<u8>)> {
    use crate::core::blast_encoding::encode_base_2na;
    let mut runs = Vec::new();
    let mut start = 0usize;
    let mut codes: Vec<u8> = Vec::new();
    for (i, &b) in seq.iter().enumerate() {
        match encode_base_2na(b) {
            Some(c) => {
                if codes.is_empty() {
                    start = i;
                }
                codes.push(c);
            }
            None => {
                if !codes.is_empty() {
                    runs.push((start, std::mem::take(&mut codes)));
                }
            }
        }
    }
    if !codes.is_empty() {
        runs.push((start, codes));
    }
    runs
}
