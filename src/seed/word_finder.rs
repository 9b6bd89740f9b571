//! Subject scanning: probe the lookup table with every subject word and
//! collect seed hits.
//!
//! `scan_subjects` runs one producer per subject on the rayon pool and
//! feeds the shared HSP stream, closing it when every subject is done.

use rayon::prelude::*;

use crate::core::blast_encoding::encode_base_2na;
use crate::core::blast_hits::{Hsp, HspList};
use crate::core::blast_nalookup::{LookupTableWrap, RpsLookup, PROFILE_WORD_LENGTH};
use crate::core::blast_options::{LookupOptions, LutType};
use crate::core::hsp_stream::HspStream;
use crate::error::Result;

/// Scan one subject against the table, producing its seed hits in
/// canonical sort order. Nucleotide subjects are IUPACNA; profile tables
/// take NCBISTDAA codes.
pub fn scan_subject(
    table: &LookupTableWrap,
    subject: &[u8],
    s_idx: u32,
    options: &LookupOptions,
) -> HspList {
    let mut list = HspList::new(s_idx);
    if table.is_empty() {
        return list;
    }
    match options.lut_type {
        LutType::Rps => scan_profile(table, subject, &mut list),
        _ => scan_nucleotide(table, subject, options.word_size, &mut list),
    }
    list.sort();
    list
}

fn scan_nucleotide(table: &LookupTableWrap, subject: &[u8], w: usize, list: &mut HspList) {
    if subject.len() < w {
        return;
    }
    let word_mask: u64 = (1u64 << (2 * w)) - 1;
    let mut word = 0u64;
    let mut valid = 0usize;

    for (pos, &base) in subject.iter().enumerate() {
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
        let s_start = (pos + 1 - w) as u32;
        for atom in table.get(word).iter() {
            list.hsps.push(Hsp {
                query_idx: atom.query_idx,
                q_start: atom.offset,
                q_end: atom.offset + w as u32 - 1,
                s_start,
                s_end: s_start + w as u32 - 1,
                strand: atom.strand,
                score: w as i32 - atom.mismatches as i32,
            });
        }
    }
}

fn scan_profile(table: &LookupTableWrap, subject: &[u8], list: &mut HspList) {
    let w = PROFILE_WORD_LENGTH;
    if subject.len() < w {
        return;
    }
    for start in 0..=subject.len() - w {
        let index = RpsLookup::index([subject[start], subject[start + 1], subject[start + 2]]);
        for atom in table.get(index as u64).iter() {
            list.hsps.push(Hsp {
                query_idx: atom.query_idx,
                q_start: atom.offset,
                q_end: atom.offset + w as u32 - 1,
                s_start: start as u32,
                s_end: (start + w - 1) as u32,
                strand: atom.strand,
                score: w as i32,
            });
        }
    }
}

/// Scan every subject in parallel, writing each non-empty hit list to
/// `stream`. Producers back off while the consumer lags. The stream is
/// closed on the way out, success or not, so readers always reach end of
/// stream.
pub fn scan_subjects(
    table: &LookupTableWrap,
    subjects: &[&[u8]],
    options: &LookupOptions,
    stream: &HspStream,
) -> Result<()> {
    let outcome = subjects
        .par_iter()
        .enumerate()
        .try_for_each(|(s_idx, subject)| {
            let list = scan_subject(table, subject, s_idx as u32, options);
            if list.is_empty() {
                return Ok(());
            }
            while stream.need_wait() {
                std::thread::yield_now();
            }
            stream.write(list)
        });
    stream.close();
    log::debug!("scan: {} subject(s) done", subjects.len());
    outcome
}
