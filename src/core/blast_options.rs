//! Lookup table options and validation.

use crate::error::{Result, SeedError};

/// Forward-strand bit in a strand mask.
pub const STRAND_FWD: u8 = 0b01;
/// Reverse-strand bit in a strand mask.
pub const STRAND_REV: u8 = 0b10;
/// Both strands.
pub const STRAND_BOTH: u8 = STRAND_FWD | STRAND_REV;

/// Widest word a direct-address compressed table will hold; beyond this
/// the 4^w backbone outgrows memory and the hashed table takes over.
pub const MAX_COMPRESSED_WORD_SIZE: usize = 13;

/// Smallest and largest seed word supported by any table variant.
pub const MIN_WORD_SIZE: usize = 4;
pub const MAX_WORD_SIZE: usize = 16;

/// Most substitutions the populator will enumerate per word.
pub const MAX_MISMATCHES: u8 = 2;

/// Which lookup table variant the builder should construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LutType {
    /// Hashed table keyed on exact packed words.
    ExactWord,
    /// Direct-address table over all 4^w packed words, with a presence
    /// vector for fast rejection.
    MegablastCompressed,
    /// Profile-backed protein table (position-specific scoring).
    Rps,
}

/// Options controlling lookup table construction and hash population.
#[derive(Debug, Clone)]
pub struct LookupOptions {
    pub lut_type: LutType,
    /// Seed word size in bases.
    pub word_size: usize,
    /// Substitutions enumerated per window (0..=2).
    pub max_mismatches: u8,
    /// Strand mask: `STRAND_FWD`, `STRAND_REV` or `STRAND_BOTH`.
    pub strands: u8,
    /// Complexity ceiling; word variants above it are not inserted.
    pub max_simplicity: f64,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            lut_type: LutType::ExactWord,
            word_size: 11,
            max_mismatches: 1,
            strands: STRAND_BOTH,
            max_simplicity: 2.0,
        }
    }
}

impl LookupOptions {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_WORD_SIZE..=MAX_WORD_SIZE).contains(&self.word_size) {
            return Err(SeedError::invalid(
                "lookup",
                "word_size",
                format!(
                    "must be in {}..={}, got {}",
                    MIN_WORD_SIZE, MAX_WORD_SIZE, self.word_size
                ),
            ));
        }
        if self.lut_type == LutType::MegablastCompressed
            && self.word_size > MAX_COMPRESSED_WORD_SIZE
        {
            return Err(SeedError::WordTooWide {
                word_size: self.word_size,
                max: MAX_COMPRESSED_WORD_SIZE,
            });
        }
        if self.max_mismatches > MAX_MISMATCHES {
            return Err(SeedError::invalid(
                "lookup",
                "max_mismatches",
                format!("must be at most {}, got {}", MAX_MISMATCHES, self.max_mismatches),
            ));
        }
        if self.strands & STRAND_BOTH == 0 {
            return Err(SeedError::invalid(
                "lookup",
                "strands",
                "at least one strand bit must be set",
            ));
        }
        if !(self.max_simplicity > 0.0) {
            return Err(SeedError::invalid(
                "lookup",
                "max_simplicity",
                format!("must be positive, got {}", self.max_simplicity),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn wants_forward(&self) -> bool {
        self.strands & STRAND_FWD != 0
    }

    #[inline]
    pub fn wants_reverse(&self) -> bool {
        self.strands & STRAND_REV != 0
    }
}

/// Scoring context threaded through to downstream extension stages. The
/// seed stage carries it untouched; seed scores come from word length alone.
#[derive(Debug, Clone, Copy)]
pub struct ScoreBlock {
    pub reward: i32,
    pub penalty: i32,
}

impl Default for ScoreBlock {
    fn default() -> Self {
        Self {
            reward: 1,
            penalty: -2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(LookupOptions::default().validate().is_ok());
        let sb = ScoreBlock::default();
        assert_eq!((sb.reward, sb.penalty), (1, -2));
    }

    #[test]
    fn test_word_size_bounds() {
        let mut opts = LookupOptions::default();
        opts.word_size = 3;
        assert!(opts.validate().is_err());
        opts.word_size = 17;
        assert!(opts.validate().is_err());
        opts.word_size = 16;
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_compressed_word_size_cap() {
        let opts = LookupOptions {
            lut_type: LutType::MegablastCompressed,
            word_size: 14,
            ..LookupOptions::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(SeedError::WordTooWide { word_size: 14, max: 13 })
        ));

        let opts = LookupOptions {
            lut_type: LutType::MegablastCompressed,
            word_size: 13,
            ..LookupOptions::default()
        };
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_strand_mask_required() {
        let opts = LookupOptions {
            strands: 0,
            ..LookupOptions::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_mismatch_cap() {
        let opts = LookupOptions {
            max_mismatches: 3,
            ..LookupOptions::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_simplicity_positive() {
        let opts = LookupOptions {
            max_simplicity: 0.0,
            ..LookupOptions::default()
        };
        assert!(opts.validate().is_err());
    }
}
