pub mod campaigns;
pub mod irrigation;
pub mod mixes;
pub mod prep;
pub mod report;
pub mod validate;
