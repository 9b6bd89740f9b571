//! Seed hits and per-subject hit lists.

use std::cmp::Ordering;

use crate::core::blast_encoding::Strand;

/// One seed hit: a word match between a query and a subject. Coordinates
/// are 0-based inclusive, always in forward-strand space. The seed stage
/// scores a hit by its matched width minus stored mismatches; extension
/// stages rescore later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsp {
    pub query_idx: u32,
    pub q_start: u32,
    pub q_end: u32,
    pub s_start: u32,
    pub s_end: u32,
    pub strand: Strand,
    pub score: i32,
}

/// All seed hits against one subject.
#[derive(Debug, Clone, Default)]
pub struct HspList {
    pub s_idx: u32,
    pub hsps: Vec<Hsp>,
}

impl HspList {
    pub fn new(s_idx: u32) -> Self {
        Self {
            s_idx,
            hsps: Vec::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hsps.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hsps.len()
    }

    /// Sort into canonical order: score descending, then subject start
    /// ascending, subject end descending, query start ascending, query end
    /// descending.
    pub fn sort(&mut self) {
        self.hsps.sort_by(score_compare_hsps);
    }
}

pub fn score_compare_hsps(a: &Hsp, b: &Hsp) -> Ordering {
    match b.score.cmp(&a.score) {
        Ordering::Equal => {}
        ord => return ord,
    }
    match a.s_start.cmp(&b.s_start) {
        Ordering::Equal => {}
        ord => return ord,
    }
    match b.s_end.cmp(&a.s_end) {
        Ordering::Equal => {}
        ord => return ord,
    }
    match a.q_start.cmp(&b.q_start) {
        Ordering::Equal => {}
        ord => return ord,
    }
    b.q_end.cmp(&a.q_end)
}
