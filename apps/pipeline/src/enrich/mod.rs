//! Enrichment — qualitative assessment of shortlisted candidates.
//!
//! Flow per candidate: serialize summary → render prompt → completion call
//! (retried) → parse → coerce score → derive status → one write-back.
//! Candidates are isolated from each other: one failing enrichment is logged
//! and skipped without touching the rest. Non-shortlisted candidates get
//! neutral defaults through the same per-record write path.

pub mod parser;

use std::sync::Arc;

use tracing::{error, info};

use crate::errors::PipelineError;
use crate::llm_client::prompts::render_assessment_prompt;
use crate::llm_client::CompletionService;
use crate::models::enrichment::EnrichmentResult;
use crate::models::profile::CandidateSummary;
use crate::retry::Retry;
use crate::store::{AssessmentFields, RecordStore};

/// Runs assessments for shortlisted candidates and writes results back.
pub struct Enricher {
    completion: Arc<dyn CompletionService>,
    retry: Retry,
    /// Scores strictly above this map to status "Yes".
    score_threshold: i64,
}

impl Enricher {
    pub fn new(completion: Arc<dyn CompletionService>, retry: Retry, score_threshold: i64) -> Self {
        Enricher {
            completion,
            retry,
            score_threshold,
        }
    }

    /// Enriches each candidate independently and returns the results that
    /// were successfully written back. A candidate whose completion call or
    /// write fails is logged and skipped; it remains shortlisted.
    pub async fn enrich(
        &self,
        store: &dyn RecordStore,
        candidates: &[CandidateSummary],
    ) -> Vec<EnrichmentResult> {
        let mut results = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match self.enrich_one(store, candidate).await {
                Ok(result) => results.push(result),
                Err(e) => error!("Error enriching candidate {}: {e}", candidate.id),
            }
        }
        info!("Enrichment complete: {}/{} candidates", results.len(), candidates.len());
        results
    }

    async fn enrich_one(
        &self,
        store: &dyn RecordStore,
        candidate: &CandidateSummary,
    ) -> Result<EnrichmentResult, PipelineError> {
        let profile_json = serde_json::to_string(candidate)?;
        let prompt = render_assessment_prompt(&profile_json);

        let response = self
            .retry
            .run("assessment completion", || self.completion.complete(&prompt))
            .await?;

        let parsed = parser::parse(&response);
        let score = parsed
            .score
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0);
        let status = if score > self.score_threshold { "Yes" } else { "No" };

        let summary = parsed.summary.unwrap_or_else(|| "NA".to_string());
        let issues = parsed.issues.unwrap_or_default();
        let follow_ups = parsed.follow_ups.unwrap_or_default();
        let follow_ups_display = if follow_ups.is_empty() {
            "NA".to_string()
        } else {
            follow_ups.join("; ")
        };

        let fields = AssessmentFields {
            summary: summary.clone(),
            score,
            follow_ups: follow_ups_display,
            status: status.to_string(),
        };
        self.retry
            .run("assessment write-back", || {
                store.write_assessment(&candidate.id, &fields)
            })
            .await?;

        Ok(EnrichmentResult {
            id: candidate.id.clone(),
            summary,
            score,
            issues,
            follow_ups,
            status: status.to_string(),
        })
    }

    /// Writes neutral defaults to every non-shortlisted candidate, one
    /// idempotent update per record so a partial failure leaves the other
    /// records correct and the whole pass safe to re-run. Returns the number
    /// of records updated.
    pub async fn write_rejected_defaults(
        &self,
        store: &dyn RecordStore,
        rejected: &[CandidateSummary],
    ) -> usize {
        let defaults = AssessmentFields::rejected();
        let mut written = 0;
        for candidate in rejected {
            let write = self
                .retry
                .run("default assessment write", || {
                    store.write_assessment(&candidate.id, &defaults)
                })
                .await;
            match write {
                Ok(()) => written += 1,
                Err(e) => error!(
                    "Could not write default assessment for candidate {}: {e}",
                    candidate.id
                ),
            }
        }
        written
    }
}
