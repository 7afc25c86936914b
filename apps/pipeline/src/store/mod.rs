//! Record store contract — the narrow seam between the pipeline and the
//! external denormalized store.
//!
//! Four related record types (applicant, personal detail, work experience,
//! salary preference) linked by reference ids, plus the cached profile JSON
//! and the four enrichment fields on the applicant. The store, not the
//! process, issues applicant sequence numbers.

pub mod airtable;
pub mod memory;

use async_trait::async_trait;

use crate::errors::PipelineError;
use crate::models::intake::{ExperienceInput, SalaryInput};

pub use airtable::AirtableStore;
pub use memory::MemoryStore;

/// Applicant row as the pipeline sees it: the sequence number, the reference
/// lists to its satellite records, and the cached profile JSON if present.
#[derive(Debug, Clone, Default)]
pub struct ApplicantRecord {
    pub record_id: String,
    pub applicant_number: Option<u64>,
    pub personal_refs: Vec<String>,
    pub experience_refs: Vec<String>,
    pub salary_refs: Vec<String>,
    pub profile_json: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PersonalRecord {
    pub name: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExperienceRecord {
    pub company: Option<String>,
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub technologies: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SalaryRecord {
    pub preferred_rate: Option<f64>,
    pub minimum_rate: Option<f64>,
    pub currency: Option<String>,
    pub availability: Option<i64>,
}

/// The four enrichment fields written back per applicant. Writing the same
/// values twice is a no-op, so these updates are safe to replay.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentFields {
    pub summary: String,
    pub score: i64,
    pub follow_ups: String,
    pub status: String,
}

impl AssessmentFields {
    /// Neutral defaults written to candidates that did not pass shortlisting.
    pub fn rejected() -> Self {
        AssessmentFields {
            summary: "NA".to_string(),
            score: 0,
            follow_ups: "NA".to_string(),
            status: "No".to_string(),
        }
    }
}

/// Personal-detail fields at intake. `ExperienceInput` and `SalaryInput`
/// are reused directly from the intake model.
#[derive(Debug, Clone)]
pub struct PersonalInput {
    pub full_name: String,
    pub email: String,
    pub location: String,
    pub linkedin: Option<String>,
}

/// The record-store seam. Every method maps to one store round-trip; callers
/// wrap them in the retry executor.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Creates an applicant row; the store assigns the sequence number.
    async fn create_applicant(&self) -> Result<ApplicantRecord, PipelineError>;

    async fn create_personal(
        &self,
        applicant_record_id: &str,
        detail: &PersonalInput,
    ) -> Result<String, PipelineError>;

    async fn create_experience(
        &self,
        applicant_record_id: &str,
        entry: &ExperienceInput,
    ) -> Result<String, PipelineError>;

    async fn create_salary(
        &self,
        applicant_record_id: &str,
        preference: &SalaryInput,
    ) -> Result<String, PipelineError>;

    async fn list_applicants(&self) -> Result<Vec<ApplicantRecord>, PipelineError>;

    async fn get_personal(&self, record_id: &str) -> Result<PersonalRecord, PipelineError>;

    async fn get_experience(&self, record_id: &str) -> Result<ExperienceRecord, PipelineError>;

    async fn get_salary(&self, record_id: &str) -> Result<SalaryRecord, PipelineError>;

    /// Overwrites the cached compact profile JSON on one applicant.
    async fn write_profile_json(
        &self,
        applicant_record_id: &str,
        compact_json: &str,
    ) -> Result<(), PipelineError>;

    /// Overwrites the four enrichment fields on one applicant.
    async fn write_assessment(
        &self,
        applicant_record_id: &str,
        fields: &AssessmentFields,
    ) -> Result<(), PipelineError>;
}
