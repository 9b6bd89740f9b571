pub mod populator;
pub mod word_finder;
