//! Canonical profile — the single merged representation of an applicant,
//! and the ephemeral per-run summary derived from it.
//!
//! Field order is fixed by the struct definitions: serializing the same
//! profile twice yields byte-identical compact JSON, which keeps the cached
//! copy on the applicant record idempotent across aggregation runs.

use serde::{Deserialize, Serialize};

use crate::experience;

/// Merged personal + work-history + salary view of one applicant.
/// Cached on the applicant record as compact JSON, overwritten each run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProfile {
    pub applicant_id: Option<u64>,
    pub personal: ProfilePersonal,
    pub experience: Vec<ProfileExperience>,
    pub salary: ProfileSalary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePersonal {
    pub name: Option<String>,
    /// Free-text country/region string.
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileExperience {
    pub company: Option<String>,
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub technologies: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSalary {
    pub rate: Option<f64>,
    pub currency: Option<String>,
    pub availability: Option<i64>,
}

impl CanonicalProfile {
    /// Compact, whitespace-free serialization for the cached store field.
    pub fn to_compact_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Per-run view of one candidate, recomputed from the canonical profile.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    /// Store record id of the applicant.
    pub id: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub total_experience_years: f64,
    /// Loose display form, e.g. `"85.5 USD"`; normalized on demand.
    pub preferred_rate_display: String,
    pub availability: Option<i64>,
    /// Employers in reference order; duplicates preserved, no ranking.
    pub companies: Vec<String>,
}

impl CandidateSummary {
    pub fn from_profile(record_id: &str, profile: &CanonicalProfile) -> Self {
        let rate = profile
            .salary
            .rate
            .map(|r| r.to_string())
            .unwrap_or_default();
        let currency = profile.salary.currency.clone().unwrap_or_default();

        CandidateSummary {
            id: record_id.to_string(),
            name: profile.personal.name.clone(),
            location: profile.personal.location.clone(),
            total_experience_years: experience::total_years(&profile.experience),
            preferred_rate_display: format!("{rate} {currency}"),
            availability: profile.salary.availability,
            companies: profile
                .experience
                .iter()
                .filter_map(|e| e.company.clone())
                .collect(),
        }
    }
}
