//! Intake submission — the structured payload the front door hands the core.
//!
//! The front door owns form parsing (indexed `company_0..company_n` fields,
//! terminating at the first missing index); by the time the core sees a
//! submission the experience list is already ordered and materialized.

use serde::{Deserialize, Serialize};

/// One applicant submission, ready to be persisted to the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeSubmission {
    pub full_name: String,
    pub email: String,
    pub location: String,
    /// Professional-network profile link, if provided.
    pub linkedin: Option<String>,
    #[serde(default)]
    pub experiences: Vec<ExperienceInput>,
    pub salary: SalaryInput,
}

/// A single work-experience entry in submission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceInput {
    pub company: String,
    pub title: String,
    /// Calendar date, expected `YYYY-MM-DD`; validated downstream, not here.
    pub start: Option<String>,
    pub end: Option<String>,
    pub technologies: Option<String>,
}

/// Compensation preferences as submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryInput {
    pub preferred_rate: Option<f64>,
    pub minimum_rate: Option<f64>,
    /// Free text; expected to contain a 3-letter currency code.
    pub currency: Option<String>,
    /// Hours per week.
    pub availability: Option<i64>,
}
