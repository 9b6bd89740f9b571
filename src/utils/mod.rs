pub mod complexity;
pub mod dust;
pub mod seg;
