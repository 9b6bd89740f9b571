pub mod blast_encoding;
pub mod blast_hits;
pub mod blast_lookup;
pub mod blast_nalookup;
pub mod blast_options;
pub mod hsp_stream;
