//! Lookup table variants and the table builder.
//!
//! Three table shapes cover the configuration space:
//! - `ExactWord`: hashed table keyed on packed words, for arbitrary word
//!   sizes up to 16
//! - `Compressed`: direct-address backbone over all 4^w words plus a
//!   presence vector, for word sizes up to 13
//! - `Profile`: protein backbone over 3-residue NCBISTDAA words, with
//!   inline cells and an overflow area
//!
//! The builder walks each query's unmasked regions with a rolling packed
//! word and hands every eligible window to the hash populator, which
//! enumerates mismatch variants and strands. Population order is query
//! order, then position order, then variant order, so repeated builds over
//! the same input produce identical tables.

use rustc_hash::FxHashMap;

use crate::core::blast_encoding::{encode_base_2na, Strand};
use crate::core::blast_lookup::{pv_array_size, pv_set, pv_test};
use crate::core::blast_options::{LookupOptions, LutType, MAX_COMPRESSED_WORD_SIZE};
use crate::error::{Result, SeedError};
use crate::seed::populator::populate_window;
use crate::utils::dust::MaskedInterval;

/// One query word occurrence stored in a lookup table cell.
///
/// `offset` is the 0-based position of the word's first base in the query,
/// always in forward-strand coordinates. `strand` records which strand the
/// stored variant matches on; `mate` tags which read of a pair the query
/// was; `mismatches` is how many substitutions the variant carries
/// relative to the query word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashAtom {
    pub query_idx: u32,
    pub offset: u32,
    pub strand: Strand,
    pub mate: u8,
    pub mismatches: u8,
}

/// Borrowed view of a cell's atoms. `Profile` cells split their contents
/// between inline storage and an overflow area, so the view is two slices.
#[derive(Debug, Clone, Copy)]
pub struct Atoms<'a> {
    first: &'a [HashAtom],
    second: &'a [HashAtom],
}

impl<'a> Atoms<'a> {
    const EMPTY: Atoms<'static> = Atoms {
        first: &[],
        second: &[],
    };

    fn single(slice: &'a [HashAtom]) -> Self {
        Self {
            first: slice,
            second: &[],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.first.len() + self.second.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.second.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a HashAtom> + 'a {
        self.first.iter().chain(self.second.iter())
    }
}

/// Hashed table for exact packed words.
#[derive(Debug, Default)]
pub struct SmallNaLookup {
    map: FxHashMap<u64, Vec<HashAtom>>,
    entries: usize,
}

impl SmallNaLookup {
    pub fn insert(&mut self, word: u64, atom: HashAtom) {
        self.map.entry(word).or_default().push(atom);
        self.entries += 1;
    }

    pub fn get(&self, word: u64) -> Atoms<'_> {
        match self.map.get(&word) {
            Some(v) => Atoms::single(v),
            None => Atoms::EMPTY,
        }
    }

    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    #[inline]
    pub fn distinct_words(&self) -> usize {
        self.map.len()
    }
}

/// Direct-address table over all 4^w packed words.
///
/// Insertions are staged; `finalize` lays the atoms out as a flat backbone
/// (offsets + atoms arrays, counting-sort by word) and builds the presence
/// vector. `get` answers empty until then. The counting sort is stable, so
/// per-cell atom order is insertion order.
#[derive(Debug)]
pub struct CompressedNaLookup {
    word_size: usize,
    staged: Vec<(u32, HashAtom)>,
    offsets: Vec<u32>,
    atoms: Vec<HashAtom>,
    pv: Vec<u64>,
}

impl CompressedNaLookup {
    pub fn new(word_size: usize) -> Result<Self> {
        if word_size > MAX_COMPRESSED_WORD_SIZE {
            return Err(SeedError::WordTooWide {
                word_size,
                max: MAX_COMPRESSED_WORD_SIZE,
            });
        }
        Ok(Self {
            word_size,
            staged: Vec::new(),
            offsets: Vec::new(),
            atoms: Vec::new(),
            pv: Vec::new(),
        })
    }

    #[inline]
    fn backbone_size(&self) -> usize {
        1usize << (2 * self.word_size)
    }

    pub fn insert(&mut self, word: u64, atom: HashAtom) {
        self.staged.push((word as u32, atom));
    }

    pub fn finalize(&mut self) {
        let backbone = self.backbone_size();
        let mut counts = vec![0u32; backbone];
        for &(word, _) in &self.staged {
            counts[word as usize] += 1;
        }

        let mut offsets = vec![0u32; backbone + 1];
        let mut total = 0u32;
        for idx in 0..backbone {
            offsets[idx] = total;
            total += counts[idx];
        }
        offsets[backbone] = total;

        let mut atoms = vec![
            HashAtom {
                query_idx: 0,
                offset: 0,
                strand: Strand::Plus,
                mate: 0,
                mismatches: 0,
            };
            total as usize
        ];
        let mut cursor = offsets[..backbone].to_vec();
        for &(word, atom) in &self.staged {
            let w = word as usize;
            atoms[cursor[w] as usize] = atom;
            cursor[w] += 1;
        }

        let mut pv = vec![0u64; pv_array_size(backbone)];
        for idx in 0..backbone {
            if offsets[idx] != offsets[idx + 1] {
                pv_set(&mut pv, idx);
            }
        }

        self.staged.clear();
        self.staged.shrink_to_fit();
        self.offsets = offsets;
        self.atoms = atoms;
        self.pv = pv;
    }

    #[inline]
    pub fn contains(&self, word: u64) -> bool {
        !self.pv.is_empty() && pv_test(&self.pv, word as usize)
    }

    pub fn get(&self, word: u64) -> Atoms<'_> {
        if !self.contains(word) {
            return Atoms::EMPTY;
        }
        let idx = word as usize;
        let start = self.offsets[idx] as usize;
        let end = self.offsets[idx + 1] as usize;
        Atoms::single(&self.atoms[start..end])
    }

    #[inline]
    pub fn entries(&self) -> usize {
        self.atoms.len() + self.staged.len()
    }
}

/// Residues per profile word.
pub const PROFILE_WORD_LENGTH: usize = 3;
/// Bits per residue in the profile backbone index.
pub const PROFILE_CHARSIZE: usize = 5;
/// Atoms stored inline in a profile cell before spilling to overflow.
pub const PROFILE_HITS_PER_CELL: usize = 3;

const PROFILE_BACKBONE: usize = 1 << (PROFILE_WORD_LENGTH * PROFILE_CHARSIZE);

#[derive(Debug, Clone, Copy)]
struct ProfileCell {
    num_used: u8,
    entries: [HashAtom; PROFILE_HITS_PER_CELL],
}

impl Default for ProfileCell {
    fn default() -> Self {
        Self {
            num_used: 0,
            entries: [HashAtom {
                query_idx: 0,
                offset: 0,
                strand: Strand::Plus,
                mate: 0,
                mismatches: 0,
            }; PROFILE_HITS_PER_CELL],
        }
    }
}

/// Protein backbone table over NCBISTDAA 3-mers. Cells hold up to
/// `PROFILE_HITS_PER_CELL` atoms inline; further atoms go to overflow.
pub struct RpsLookup {
    cells: Vec<ProfileCell>,
    overflow: FxHashMap<u32, Vec<HashAtom>>,
    pv: Vec<u64>,
    entries: usize,
}

impl RpsLookup {
    pub fn new() -> Self {
        Self {
            cells: vec![ProfileCell::default(); PROFILE_BACKBONE],
            overflow: FxHashMap::default(),
            pv: vec![0u64; pv_array_size(PROFILE_BACKBONE)],
            entries: 0,
        }
    }

    /// Backbone index of a 3-residue NCBISTDAA word.
    #[inline]
    pub fn index(residues: [u8; PROFILE_WORD_LENGTH]) -> usize {
        ((residues[0] as usize) << (2 * PROFILE_CHARSIZE))
            | ((residues[1] as usize) << PROFILE_CHARSIZE)
            | residues[2] as usize
    }

    pub fn insert(&mut self, index: usize, atom: HashAtom) {
        let cell = &mut self.cells[index];
        if (cell.num_used as usize) < PROFILE_HITS_PER_CELL {
            cell.entries[cell.num_used as usize] = atom;
            cell.num_used += 1;
        } else {
            self.overflow.entry(index as u32).or_default().push(atom);
        }
        pv_set(&mut self.pv, index);
        self.entries += 1;
    }

    pub fn get(&self, index: usize) -> Atoms<'_> {
        if !pv_test(&self.pv, index) {
            return Atoms::EMPTY;
        }
        let cell = &self.cells[index];
        let inline = &cell.entries[..cell.num_used as usize];
        let spill = self
            .overflow
            .get(&(index as u32))
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        Atoms {
            first: inline,
            second: spill,
        }
    }

    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }
}

impl Default for RpsLookup {
    fn default() -> Self {
        Self::new()
    }
}

/// Tagged union over the table variants. `Empty` stands in for degenerate
/// builds (no query, or every word masked or ambiguous); probing it always
/// answers empty, so scanners need no special case.
pub enum LookupTableWrap {
    Empty,
    ExactWord(SmallNaLookup),
    Compressed(CompressedNaLookup),
    Profile(RpsLookup),
}

impl LookupTableWrap {
    pub fn insert(&mut self, word: u64, atom: HashAtom) {
        match self {
            LookupTableWrap::Empty => {}
            LookupTableWrap::ExactWord(t) => t.insert(word, atom),
            LookupTableWrap::Compressed(t) => t.insert(word, atom),
            LookupTableWrap::Profile(t) => t.insert(word as usize, atom),
        }
    }

    pub fn get(&self, word: u64) -> Atoms<'_> {
        match self {
            LookupTableWrap::Empty => Atoms::EMPTY,
            LookupTableWrap::ExactWord(t) => t.get(word),
            LookupTableWrap::Compressed(t) => t.get(word),
            LookupTableWrap::Profile(t) => t.get(word as usize),
        }
    }

    pub fn entries(&self) -> usize {
        match self {
            LookupTableWrap::Empty => 0,
            LookupTableWrap::ExactWord(t) => t.entries(),
            LookupTableWrap::Compressed(t) => t.entries(),
            LookupTableWrap::Profile(t) => t.entries(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries() == 0
    }
}

/// True if the word `[start, start + len)` touches any masked interval.
/// Intervals must be sorted by start, as the filters produce them.
#[inline]
pub fn word_is_masked(masks: &[MaskedInterval], start: usize, len: usize) -> bool {
    if masks.is_empty() {
        return false;
    }
    // First interval whose inclusive end reaches the word.
    let idx = masks.partition_point(|m| m.end < start);
    idx < masks.len() && masks[idx].start < start + len
}

/// Build a lookup table over `queries` (IUPACNA for the nucleotide
/// variants, NCBISTDAA codes for `Rps`), skipping words that touch the
/// corresponding mask list. Queries too short for a word, or fully masked,
/// contribute nothing; if nothing at all is inserted the result is
/// `Empty`.
pub fn build_lookup_table(
    queries: &[&[u8]],
    masks: &[Vec<MaskedInterval>],
    options: &LookupOptions,
) -> Result<LookupTableWrap> {
    options.validate()?;

    let mut table = match options.lut_type {
        LutType::ExactWord => LookupTableWrap::ExactWord(SmallNaLookup::default()),
        LutType::MegablastCompressed => {
            LookupTableWrap::Compressed(CompressedNaLookup::new(options.word_size)?)
        }
        LutType::Rps => LookupTableWrap::Profile(RpsLookup::new()),
    };

    let mut inserted = 0usize;
    for (q_idx, query) in queries.iter().enumerate() {
        let query_masks = masks.get(q_idx).map(|v| v.as_slice()).unwrap_or(&[]);
        inserted += match options.lut_type {
            LutType::Rps => populate_profile(&mut table, query, q_idx as u32, query_masks),
            _ => populate_nucleotide(&mut table, query, q_idx as u32, query_masks, options),
        };
    }

    if inserted == 0 {
        log::debug!("lookup: no eligible words, table is empty");
        return Ok(LookupTableWrap::Empty);
    }
    if let LookupTableWrap::Compressed(t) = &mut table {
        t.finalize();
    }
    log::debug!(
        "lookup: {} atom(s) from {} query(ies), word_size={}",
        inserted,
        queries.len(),
        options.word_size
    );
    Ok(table)
}

/// Walk one nucleotide query with a rolling packed word; ambiguous bases
/// reset the window. Every full unmasked window goes to the populator.
fn populate_nucleotide(
    table: &mut LookupTableWrap,
    query: &[u8],
    query_idx: u32,
    masks: &[MaskedInterval],
    options: &LookupOptions,
) -> usize {
    let w = options.word_size;
    if query.len() < w {
        return 0;
    }
    let word_mask: u64 = (1u64 << (2 * w)) - 1;
    let mut word = 0u64;
    let mut valid = 0usize;
    let mut inserted = 0usize;

    for (pos, &base) in query.iter().enumerate() {
        match encode_base_2na(base) {
            Some(code) => {
                word = ((word << 2) | code as u64) & word_mask;
                valid += 1;
            }
            None => {
                word = 0;
                valid = 0;
                continue;
            }
        }
        if valid < w {
            continue;
        }
        let start = pos + 1 - w;
        if word_is_masked(masks, start, w) {
            continue;
        }
        inserted += populate_window(table, word, start as u32, query_idx, 0, options);
    }
    inserted
}

/// Walk one NCBISTDAA query, inserting each unmasked 3-mer as-is. Profile
/// tables carry no mismatch variants and no strand; the residue codes
/// themselves (sentinel included) are valid backbone indices.
fn populate_profile(
    table: &mut LookupTableWrap,
    query: &[u8],
    query_idx: u32,
    masks: &[MaskedInterval],
) -> usize {
    if query.len() < PROFILE_WORD_LENGTH {
        return 0;
    }
    let mut inserted = 0usize;
    for start in 0..=query.len() - PROFILE_WORD_LENGTH {
        if word_is_masked(masks, start, PROFILE_WORD_LENGTH) {
            continue;
        }
        let index = RpsLookup::index([query[start], query[start + 1], query[start + 2]]);
        table.insert(
            index as u64,
            HashAtom {
                query_idx,
                offset: start as u32,
                strand: Strand::Plus,
                mate: 0,
                mismatches: 0,
            },
        );
        inserted += 1;
    }
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blast_encoding::{encode_word, translate, Alphabet};
    use crate::core::blast_options::{LutType, STRAND_FWD};
    use crate::utils::dust::FilterKind;

    fn fwd_exact(word_size: usize) -> LookupOptions {
        LookupOptions {
            lut_type: LutType::ExactWord,
            word_size,
            max_mismatches: 0,
            strands: STRAND_FWD,
            ..LookupOptions::default()
        }
    }

    #[test]
    fn test_exact_word_positions() {
        let query: &[u8] = b"ACGTACGT";
        let table = build_lookup_table(&[query], &[vec![]], &fwd_exact(4)).unwrap();
        assert_eq!(table.entries(), 5);
        let word = encode_word(query, 0, 4).unwrap();
        let atoms: Vec<_> = table.get(word).iter().copied().collect();
        // ACGT occurs at 0 and 4.
        assert_eq!(atoms.len(), 2);
        assert_eq!(atoms[0].offset, 0);
        assert_eq!(atoms[1].offset, 4);
        assert!(atoms.iter().all(|a| a.mismatches == 0 && a.strand == Strand::Plus));
    }

    #[test]
    fn test_compressed_matches_exact() {
        let query: &[u8] = b"ACGTACGTCCGGAATT";
        let exact = build_lookup_table(&[query], &[vec![]], &fwd_exact(5)).unwrap();
        let compressed = build_lookup_table(
            &[query],
            &[vec![]],
            &LookupOptions {
                lut_type: LutType::MegablastCompressed,
                ..fwd_exact(5)
            },
        )
        .unwrap();
        assert_eq!(exact.entries(), compressed.entries());
        for start in 0..=query.len() - 5 {
            let word = encode_word(query, start, 5).unwrap();
            let a: Vec<_> = exact.get(word).iter().copied().collect();
            let b: Vec<_> = compressed.get(word).iter().copied().collect();
            assert_eq!(a, b, "cell mismatch at word start {start}");
        }
    }

    #[test]
    fn test_masked_words_skipped() {
        let query: &[u8] = b"ACGTACGTACGT";
        let masks = vec![vec![MaskedInterval::new(4, 7, FilterKind::Dust)]];
        let table = build_lookup_table(&[query], &masks, &fwd_exact(4)).unwrap();
        // Only windows clear of [4,7] survive: starts 0 and 8.
        assert_eq!(table.entries(), 2);
        let word = encode_word(query, 0, 4).unwrap();
        let offsets: Vec<u32> = table.get(word).iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 8]);
    }

    #[test]
    fn test_fully_masked_query_yields_empty() {
        let query: &[u8] = b"ACGTACGT";
        let masks = vec![vec![MaskedInterval::new(0, 7, FilterKind::Dust)]];
        let table = build_lookup_table(&[query], &masks, &fwd_exact(4)).unwrap();
        assert!(matches!(table, LookupTableWrap::Empty));
        assert!(table.is_empty());
        assert!(table.get(0).is_empty());
    }

    #[test]
    fn test_ambiguous_bases_reset_window() {
        let query: &[u8] = b"ACGTNACGT";
        let table = build_lookup_table(&[query], &[vec![]], &fwd_exact(4)).unwrap();
        // One full window on each side of the N.
        assert_eq!(table.entries(), 2);
    }

    #[test]
    fn test_multi_query_indices() {
        let q0: &[u8] = b"ACGTA";
        let q1: &[u8] = b"TTTTGACG";
        let table =
            build_lookup_table(&[q0, q1], &[vec![], vec![]], &fwd_exact(5)).unwrap();
        let word = encode_word(q0, 0, 5).unwrap();
        let atoms: Vec<_> = table.get(word).iter().copied().collect();
        assert_eq!(atoms.len(), 1);
        assert_eq!(atoms[0].query_idx, 0);

        let word = encode_word(q1, 3, 5).unwrap();
        let atoms: Vec<_> = table.get(word).iter().copied().collect();
        assert_eq!(atoms.len(), 1);
        assert_eq!(atoms[0].query_idx, 1);
        assert_eq!(atoms[0].offset, 3);
    }

    #[test]
    fn test_word_is_masked_boundaries() {
        let masks = vec![MaskedInterval::new(10, 19, FilterKind::Dust)];
        assert!(!word_is_masked(&masks, 6, 4)); // [6,9]
        assert!(word_is_masked(&masks, 7, 4)); // [7,10]
        assert!(word_is_masked(&masks, 19, 4)); // [19,22]
        assert!(!word_is_masked(&masks, 20, 4)); // [20,23]
    }

    #[test]
    fn test_profile_table_inline_and_overflow() {
        // AAAA... yields the same 3-mer at every position, spilling past
        // the inline cell capacity.
        let seq = translate(&vec![b'A'; 10], Alphabet::Iupacaa, Alphabet::Ncbistdaa).unwrap();
        let table = build_lookup_table(
            &[&seq],
            &[vec![]],
            &LookupOptions {
                lut_type: LutType::Rps,
                ..LookupOptions::default()
            },
        )
        .unwrap();
        assert_eq!(table.entries(), 8);
        let index = RpsLookup::index([seq[0], seq[1], seq[2]]);
        let atoms: Vec<_> = table.get(index as u64).iter().copied().collect();
        assert_eq!(atoms.len(), 8);
        let offsets: Vec<u32> = atoms.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, (0..8).collect::<Vec<u32>>());
    }

    #[test]
    fn test_profile_probe_misses_cleanly() {
        let seq = translate(b"MKTAYIAK", Alphabet::Iupacaa, Alphabet::Ncbistdaa).unwrap();
        let table = build_lookup_table(
            &[&seq],
            &[vec![]],
            &LookupOptions {
                lut_type: LutType::Rps,
                ..LookupOptions::default()
            },
        )
        .unwrap();
        let absent = RpsLookup::index([22, 22, 22]);
        assert!(table.get(absent as u64).is_empty());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let query: &[u8] = b"ACGTACGT";
        let opts = LookupOptions {
            word_size: 3,
            ..LookupOptions::default()
        };
        assert!(build_lookup_table(&[query], &[vec![]], &opts).is_err());
    }
}
