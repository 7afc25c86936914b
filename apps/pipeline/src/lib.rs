//! Applicant shortlisting pipeline.
//!
//! Assembles denormalized applicant records from an external store into
//! canonical profiles, derives tenure and normalized compensation, applies
//! deterministic eligibility rules, and enriches shortlisted candidates with
//! a parsed qualitative assessment from a completion service. The HTTP front
//! door, the record store, the FX service, and the completion service are
//! external collaborators behind narrow trait seams.

pub mod aggregate;
pub mod config;
pub mod currency;
pub mod enrich;
pub mod errors;
pub mod experience;
pub mod llm_client;
pub mod models;
pub mod pipeline;
pub mod retry;
pub mod shortlist;
pub mod store;

pub use errors::PipelineError;
pub use pipeline::{Pipeline, PipelineOutcome, PipelineSettings};
