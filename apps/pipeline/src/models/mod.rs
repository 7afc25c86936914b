pub mod enrichment;
pub mod intake;
pub mod profile;
