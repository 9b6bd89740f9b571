//! Sequence alphabets and translation tables.
//!
//! Translation between alphabets is a static, total function: every input
//! byte maps to exactly one code, and bytes outside the source alphabet map
//! to that alphabet's ambiguity sentinel (BLASTNA 15, NCBISTDAA 21 = X).
//! The tables are process-wide constants; nothing here has mutable state,
//! so all of it is safe to call from any number of threads.
//!
//! # Encodings
//! - `IUPACNA` - ASCII nucleotides, ambiguity codes included
//! - `BLASTNA` - 0..15 nucleotide codes, N = 14, sentinel = 15
//! - `NCBI4NA` - 4-bit nucleotide bitmask codes (one bit per base)
//! - `NCBI2NA` - 2-bit codes A=0 C=1 G=2 T=3, packed 4 per byte MSB-first
//! - `IUPACAA` / `NCBISTDAA` - ASCII / 0..27 amino acid codes

use crate::error::{Result, SeedError};

/// Alphabet identifier accepted by [`translate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    Iupacna,
    Blastna,
    Ncbi4na,
    Ncbi2na,
    Iupacaa,
    Ncbistdaa,
}

/// Strand of a nucleotide sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    /// Strand mask bit: 0b01 = plus, 0b10 = minus.
    #[inline]
    pub fn bit(self) -> u8 {
        match self {
            Strand::Plus => 0b01,
            Strand::Minus => 0b10,
        }
    }

    #[inline]
    pub fn opposite(self) -> Strand {
        match self {
            Strand::Plus => Strand::Minus,
            Strand::Minus => Strand::Plus,
        }
    }
}

/// Compression ratio of packed ncbi2na: 4 bases per byte.
pub const COMPRESSION_RATIO: usize = 4;

/// BLASTNA code of the ambiguity sentinel.
pub const BLASTNA_SENTINEL: u8 = 15;

/// NCBISTDAA code of the ambiguity sentinel (X).
pub const NCBISTDAA_SENTINEL: u8 = 21;

const BASE_MASK: u8 = 0x03;

// The IUPACNA <-> BLASTNA and NCBI4NA tables reproduce the constant data in
// blast_encoding.c; they are pure data, initialized once at compile time.
const IUPACNA_TO_BLASTNA: [u8; 128] = {
    let mut t = [BLASTNA_SENTINEL; 128];
    t[b'A' as usize] = 0;
    t[b'C' as usize] = 1;
    t[b'G' as usize] = 2;
    t[b'T' as usize] = 3;
    t[b'R' as usize] = 4;
    t[b'Y' as usize] = 5;
    t[b'M' as usize] = 6;
    t[b'K' as usize] = 7;
    t[b'W' as usize] = 8;
    t[b'S' as usize] = 9;
    t[b'B' as usize] = 10;
    t[b'D' as usize] = 11;
    t[b'H' as usize] = 12;
    t[b'V' as usize] = 13;
    t[b'N' as usize] = 14;
    t
};

const BLASTNA_TO_IUPACNA: [u8; 16] = [
    b'A', b'C', b'G', b'T', b'R', b'Y', b'M', b'K', b'W', b'S', b'B', b'D', b'H', b'V', b'N', b'-',
];

const IUPACNA_TO_NCBI4NA: [u8; 128] = {
    let mut t = [0u8; 128];
    t[b'A' as usize] = 1;
    t[b'C' as usize] = 2;
    t[b'M' as usize] = 3;
    t[b'G' as usize] = 4;
    t[b'R' as usize] = 5;
    t[b'S' as usize] = 6;
    t[b'V' as usize] = 7;
    t[b'T' as usize] = 8;
    t[b'W' as usize] = 9;
    t[b'Y' as usize] = 10;
    t[b'H' as usize] = 11;
    t[b'K' as usize] = 12;
    t[b'D' as usize] = 13;
    t[b'B' as usize] = 14;
    t[b'N' as usize] = 15;
    t
};

const NCBI4NA_TO_IUPACNA: [u8; 16] = [
    b'-', b'A', b'C', b'M', b'G', b'R', b'S', b'V', b'T', b'W', b'Y', b'H', b'K', b'D', b'B', b'N',
];

// Bitmask complement: each 4na code maps to the code with complementary
// base bits set (A<->T, C<->G), preserving ambiguity codes.
const NCBI4NA_REV_COMP: [u8; 16] = [0, 8, 4, 12, 2, 10, 6, 14, 1, 9, 5, 13, 3, 11, 7, 15];

// NCBISTDAA: "-ABCDEFGHIKLMNPQRSTVWXYZU*OJ"
const IUPACAA_TO_NCBISTDAA: [u8; 128] = {
    let mut t = [NCBISTDAA_SENTINEL; 128];
    let letters = b"-ABCDEFGHIKLMNPQRSTVWXYZU*OJ";
    let mut code = 0usize;
    while code < letters.len() {
        t[letters[code] as usize] = code as u8;
        code += 1;
    }
    t
};

const NCBISTDAA_TO_IUPACAA: [u8; 28] = *b"-ABCDEFGHIKLMNPQRSTVWXYZU*OJ";

/// 2-bit encoding of an unambiguous ASCII nucleotide, or `None` for
/// anything ambiguous.
#[inline]
pub fn encode_base_2na(base: u8) -> Option<u8> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' | b'U' => Some(3),
        _ => None,
    }
}

#[inline]
pub fn decode_base_2na(code: u8) -> u8 {
    const DECODE: [u8; 4] = [b'A', b'C', b'G', b'T'];
    DECODE[(code & BASE_MASK) as usize]
}

#[inline]
fn iupacna_to_blastna_byte(base: u8) -> u8 {
    let idx = base.to_ascii_uppercase() as usize;
    if idx < 128 {
        IUPACNA_TO_BLASTNA[idx]
    } else {
        BLASTNA_SENTINEL
    }
}

#[inline]
fn iupacaa_to_ncbistdaa_byte(aa: u8) -> u8 {
    let idx = aa.to_ascii_uppercase() as usize;
    if idx < 128 {
        IUPACAA_TO_NCBISTDAA[idx]
    } else {
        NCBISTDAA_SENTINEL
    }
}

/// Translate a sequence buffer between two alphabets.
///
/// The output has the same length as the input. Out-of-alphabet bytes are
/// never an error; they become the target alphabet's sentinel code. An
/// unsupported alphabet pair is a parameter error.
pub fn translate(seq: &[u8], from: Alphabet, to: Alphabet) -> Result<Vec<u8>> {
    use Alphabet::*;
    if from == to {
        return Ok(seq.to_vec());
    }
    let out = match (from, to) {
        (Iupacna, Blastna) => seq.iter().map(|&b| iupacna_to_blastna_byte(b)).collect(),
        (Blastna, Iupacna) => seq
            .iter()
            .map(|&b| BLASTNA_TO_IUPACNA[(b & 0x0F) as usize])
            .collect(),
        (Iupacna, Ncbi4na) => seq
            .iter()
            .map(|&b| {
                let idx = b.to_ascii_uppercase() as usize;
                if idx < 128 {
                    IUPACNA_TO_NCBI4NA[idx]
                } else {
                    15
                }
            })
            .collect(),
        (Ncbi4na, Iupacna) => seq
            .iter()
            .map(|&b| NCBI4NA_TO_IUPACNA[(b & 0x0F) as usize])
            .collect(),
        // Unpacked ncbi2na, one code per byte. Ambiguous bases collapse to
        // the low two bits of their BLASTNA code, as BLAST's compression does.
        (Iupacna, Ncbi2na) => seq
            .iter()
            .map(|&b| iupacna_to_blastna_byte(b) & BASE_MASK)
            .collect(),
        (Ncbi2na, Iupacna) => seq.iter().map(|&b| decode_base_2na(b)).collect(),
        (Iupacaa, Ncbistdaa) => seq.iter().map(|&b| iupacaa_to_ncbistdaa_byte(b)).collect(),
        (Ncbistdaa, Iupacaa) => seq
            .iter()
            .map(|&b| {
                let idx = b as usize;
                if idx < NCBISTDAA_TO_IUPACAA.len() {
                    NCBISTDAA_TO_IUPACAA[idx]
                } else {
                    b'X'
                }
            })
            .collect(),
        _ => {
            return Err(SeedError::invalid(
                "encoder",
                "target",
                format!("no translation from {from:?} to {to:?}"),
            ))
        }
    };
    Ok(out)
}

/// Reverse complement of an IUPACNA sequence, ambiguity codes preserved
/// through the NCBI4NA bitmask complement table.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| {
            let idx = b.to_ascii_uppercase() as usize;
            let na4 = if idx < 128 { IUPACNA_TO_NCBI4NA[idx] } else { 0 };
            NCBI4NA_TO_IUPACNA[NCBI4NA_REV_COMP[na4 as usize] as usize]
        })
        .collect()
}

/// Reverse complement of a 2-bit packed word of `width` bases.
#[inline]
pub fn reverse_complement_word(word: u64, width: usize) -> u64 {
    let mut out = 0u64;
    let mut w = word;
    for _ in 0..width {
        out = (out << 2) | (3 - (w & 3));
        w >>= 2;
    }
    out
}

/// Encode a k-mer from ASCII into a 2-bit word; `None` if any base in the
/// window is ambiguous or the window runs off the end.
#[inline]
pub fn encode_word(seq: &[u8], start: usize, width: usize) -> Option<u64> {
    if start + width > seq.len() {
        return None;
    }
    let mut word = 0u64;
    for &b in &seq[start..start + width] {
        word = (word << 2) | encode_base_2na(b)? as u64;
    }
    Some(word)
}

/// Decode a 2-bit word back to ASCII.
pub fn decode_word(word: u64, width: usize) -> Vec<u8> {
    let mut out = vec![0u8; width];
    let mut w = word;
    for i in (0..width).rev() {
        out[i] = decode_base_2na((w & 3) as u8);
        w >>= 2;
    }
    out
}

/// A nucleotide sequence packed 4 bases per byte in ncbi2na order
/// (first base in the high bits).
///
/// Ambiguous positions are stored as zero bits and tracked separately so
/// word extraction can reject windows that cover them.
#[derive(Debug, Clone)]
pub struct PackedSequence {
    data: Vec<u8>,
    len: usize,
    ambiguous: Vec<usize>,
}

impl PackedSequence {
    pub fn new(seq: &[u8]) -> Self {
        let len = seq.len();
        let mut data = vec![0u8; len.div_ceil(COMPRESSION_RATIO)];
        let mut ambiguous = Vec::new();
        for (i, &base) in seq.iter().enumerate() {
            match encode_base_2na(base) {
                Some(code) => {
                    let shift = 6 - 2 * (i % COMPRESSION_RATIO);
                    data[i / COMPRESSION_RATIO] |= code << shift;
                }
                None => ambiguous.push(i),
            }
        }
        Self {
            data,
            len,
            ambiguous,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 2-bit code of the base at `pos`.
    #[inline]
    pub fn base_at(&self, pos: usize) -> u8 {
        debug_assert!(pos < self.len);
        let shift = 6 - 2 * (pos % COMPRESSION_RATIO);
        (self.data[pos / COMPRESSION_RATIO] >> shift) & BASE_MASK
    }

    /// True if `[start, end)` covers an ambiguous position.
    pub fn ambiguous_in(&self, start: usize, end: usize) -> bool {
        match self.ambiguous.binary_search(&start) {
            Ok(_) => true,
            Err(i) => i < self.ambiguous.len() && self.ambiguous[i] < end,
        }
    }

    /// Extract the word of `width` bases starting at `pos`, or `None` when
    /// the window is out of range or covers an ambiguous base.
    pub fn word_at(&self, pos: usize, width: usize) -> Option<u64> {
        if pos + width > self.len || self.ambiguous_in(pos, pos + width) {
            return None;
        }
        let mut word = 0u64;
        for i in 0..width {
            word = (word << 2) | self.base_at(pos + i) as u64;
        }
        Some(word)
    }

    /// Iterate `(position, word)` over every unambiguous window of `width`.
    pub fn words(&self, width: usize) -> impl Iterator<Item = (usize, u64)> + '_ {
        let end = if self.len >= width {
            self.len - width + 1
        } else {
            0
        };
        (0..end).filter_map(move |pos| self.word_at(pos, width).map(|w| (pos, w)))
    }
}
