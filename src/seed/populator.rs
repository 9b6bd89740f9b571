//! Hash populator: expands one query window into the set of word variants
//! stored in the lookup table.
//!
//! For a window the populator enumerates the exact word plus every word
//! within `max_mismatches` substitutions, drops variants above the
//! complexity ceiling, and inserts each surviving variant once per
//! requested strand. Reverse-strand entries store the variant's reverse
//! complement, so a forward scan of the subject finds them directly.
//! Enumeration order is fixed (exact word, then single substitutions by
//! position and code, then pairs), which keeps table construction
//! deterministic.

use crate::core::blast_encoding::{reverse_complement_word, Strand};
use crate::core::blast_nalookup::{HashAtom, LookupTableWrap};
use crate::core::blast_options::LookupOptions;
use crate::utils::complexity::word_complexity;

/// Enumerates mismatch variants of packed words.
#[derive(Debug, Clone, Copy)]
pub struct Permutator {
    width: usize,
    max_mismatches: u8,
}

impl Permutator {
    pub fn new(width: usize, max_mismatches: u8) -> Self {
        Self {
            width,
            max_mismatches,
        }
    }

    /// Lazy iterator over `(variant, mismatch_count)` pairs for `word`.
    /// The exact word always comes first with count 0.
    pub fn variants(&self, word: u64) -> VariantIter {
        VariantIter {
            word,
            width: self.width,
            max: self.max_mismatches,
            stage: Stage::Original,
        }
    }

    /// Total variants the iterator will yield: 1 + 3w + 9*C(w,2) at two
    /// mismatches.
    pub fn variant_count(&self) -> usize {
        let w = self.width;
        let mut n = 1;
        if self.max_mismatches >= 1 {
            n += 3 * w;
        }
        if self.max_mismatches >= 2 && w >= 2 {
            n += 9 * w * (w - 1) / 2;
        }
        n
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Original,
    Single { pos: usize, delta: u8 },
    Double { a: usize, da: u8, b: usize, db: u8 },
    Done,
}

/// See [`Permutator::variants`].
#[derive(Debug, Clone)]
pub struct VariantIter {
    word: u64,
    width: usize,
    max: u8,
    stage: Stage,
}

impl VariantIter {
    // XOR with a nonzero 2-bit delta turns a base code into one of the
    // three other codes.
    #[inline]
    fn flip(&self, pos: usize, delta: u8) -> u64 {
        self.word ^ ((delta as u64) << (2 * pos))
    }
}

impl Iterator for VariantIter {
    type Item = (u64, u8);

    fn next(&mut self) -> Option<(u64, u8)> {
        match self.stage {
            Stage::Original => {
                self.stage = if self.max >= 1 && self.width >= 1 {
                    Stage::Single { pos: 0, delta: 1 }
                } else {
                    Stage::Done
                };
                Some((self.word, 0))
            }
            Stage::Single { pos, delta } => {
                let variant = self.flip(pos, delta);
                self.stage = if delta < 3 {
                    Stage::Single {
                        pos,
                        delta: delta + 1,
                    }
                } else if pos + 1 < self.width {
                    Stage::Single {
                        pos: pos + 1,
                        delta: 1,
                    }
                } else if self.max >= 2 && self.width >= 2 {
                    Stage::Double {
                        a: 0,
                        da: 1,
                        b: 1,
                        db: 1,
                    }
                } else {
                    Stage::Done
                };
                Some((variant, 1))
            }
            Stage::Double { a, da, b, db } => {
                let variant = self.flip(a, da) ^ ((db as u64) << (2 * b));
                self.stage = if db < 3 {
                    Stage::Double { a, da, b, db: db + 1 }
                } else if da < 3 {
                    Stage::Double {
                        a,
                        da: da + 1,
                        b,
                        db: 1,
                    }
                } else if b + 1 < self.width {
                    Stage::Double {
                        a,
                        da: 1,
                        b: b + 1,
                        db: 1,
                    }
                } else if a + 2 < self.width {
                    Stage::Double {
                        a: a + 1,
                        da: 1,
                        b: a + 2,
                        db: 1,
                    }
                } else {
                    Stage::Done
                };
                Some((variant, 2))
            }
            Stage::Done => None,
        }
    }
}

/// Expand one window into the table. `word` is the packed window at query
/// position `offset`; `mate` 1 swaps the strand senses, since the second
/// read of a pair is sequenced in reverse orientation. Returns the number
/// of atoms inserted.
pub fn populate_window(
    table: &mut LookupTableWrap,
    word: u64,
    offset: u32,
    query_idx: u32,
    mate: u8,
    options: &LookupOptions,
) -> usize {
    let width = options.word_size;
    let (fwd, rev) = if mate == 0 {
        (options.wants_forward(), options.wants_reverse())
    } else {
        (options.wants_reverse(), options.wants_forward())
    };

    let permutator = Permutator::new(width, options.max_mismatches);
    let mut inserted = 0usize;
    for (variant, mismatches) in permutator.variants(word) {
        if word_complexity(variant, width) > options.max_simplicity {
            continue;
        }
        if fwd {
            table.insert(
                variant,
                HashAtom {
                    query_idx,
                    offset,
                    strand: Strand::Plus,
                    mate,
                    mismatches,
                },
            );
            inserted += 1;
        }
        if rev {
            table.insert(
                reverse_complement_word(variant, width),
                HashAtom {
                    query_idx,
                    offset,
                    strand: Strand::Minus,
                    mate,
                    mismatches,
                },
            );
            inserted += 1;
        }
    }
    inserted
}
