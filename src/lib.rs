//! Seed-search core for local sequence alignment.
//!
//! The pipeline: encode query sequences, mask low-complexity regions with
//! DUST (nucleotide) or SEG (protein), build a lookup table over the
//! unmasked query words, expand each word through the hash populator
//! (mismatch variants, strands, complexity ceiling), then scan subjects in
//! parallel and feed seed HSPs through a thread-safe stream to a single
//! consumer.

pub mod core;
pub mod error;
pub mod seed;
pub mod utils;

pub use error::{Result, SeedError};
