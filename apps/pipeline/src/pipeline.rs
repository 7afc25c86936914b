//! Pipeline orchestration — the end-to-end run behind one applicant
//! submission.
//!
//! Flow: persist intake → refresh cached profiles → summaries → shortlist →
//! default writes for rejected → enrichment → outcome. A full re-evaluation
//! pass without an intake is the same flow minus the first step. Every run
//! gets its own cancellation token and retry executor, and the whole run is
//! bounded by a configurable deadline.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::aggregate;
use crate::config::Config;
use crate::currency::{CurrencyNormalizer, FxConverter};
use crate::enrich::Enricher;
use crate::errors::PipelineError;
use crate::llm_client::CompletionService;
use crate::models::enrichment::EnrichmentResult;
use crate::models::intake::IntakeSubmission;
use crate::models::profile::CandidateSummary;
use crate::retry::{Retry, RetryPolicy};
use crate::shortlist::{self, ShortlistPolicy};
use crate::store::{PersonalInput, RecordStore};

/// Tunables for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub retry: RetryPolicy,
    pub shortlist: ShortlistPolicy,
    pub shortlist_concurrency: usize,
    pub score_threshold: i64,
    pub deadline: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            retry: RetryPolicy::default(),
            shortlist: ShortlistPolicy::default(),
            shortlist_concurrency: 8,
            score_threshold: 1,
            deadline: Duration::from_secs(600),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        PipelineSettings {
            shortlist_concurrency: config.shortlist_concurrency,
            score_threshold: config.score_threshold,
            deadline: config.pipeline_deadline,
            ..PipelineSettings::default()
        }
    }
}

/// What a run hands back to the front door: the new applicant's sequence
/// number (if this run had an intake), the shortlist, and the enrichment
/// results. On unrecoverable error the front door surfaces an opaque
/// failure instead.
#[derive(Debug, Serialize)]
pub struct PipelineOutcome {
    pub applicant_number: Option<u64>,
    pub shortlisted: Vec<CandidateSummary>,
    pub enriched: Vec<EnrichmentResult>,
}

/// The assembled pipeline over its three external collaborators.
pub struct Pipeline {
    store: Arc<dyn RecordStore>,
    fx: Arc<dyn FxConverter>,
    completion: Arc<dyn CompletionService>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        fx: Arc<dyn FxConverter>,
        completion: Arc<dyn CompletionService>,
        settings: PipelineSettings,
    ) -> Self {
        Pipeline {
            store,
            fx,
            completion,
            settings,
        }
    }

    /// Persists one submission, then re-evaluates the whole applicant pool.
    pub async fn process_submission(
        &self,
        submission: IntakeSubmission,
    ) -> Result<PipelineOutcome, PipelineError> {
        self.bounded(|retry| async move {
            let applicant_number = self.intake(&retry, &submission).await?;
            info!(
                "Applicant {} ({applicant_number:?}) created successfully",
                submission.full_name
            );
            self.evaluate(&retry, applicant_number).await
        })
        .await
    }

    /// Re-evaluates the whole applicant pool without a new intake.
    pub async fn run_shortlist(&self) -> Result<PipelineOutcome, PipelineError> {
        self.bounded(|retry| async move { self.evaluate(&retry, None).await }).await
    }

    /// Runs `work` with a fresh per-run retry executor under the configured
    /// deadline; on expiry the run's token is cancelled and the caller gets
    /// a cancellation error.
    async fn bounded<'a, F, Fut>(&'a self, work: F) -> Result<PipelineOutcome, PipelineError>
    where
        F: FnOnce(Retry) -> Fut,
        Fut: std::future::Future<Output = Result<PipelineOutcome, PipelineError>> + 'a,
    {
        let cancel = CancellationToken::new();
        let retry = Retry::new(self.settings.retry.clone(), cancel.clone());

        match tokio::time::timeout(self.settings.deadline, work(retry)).await {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                Err(PipelineError::Cancelled(format!(
                    "pipeline run exceeded deadline of {:?}",
                    self.settings.deadline
                )))
            }
        }
    }

    /// Creates the applicant and its satellite records, linked in submission
    /// order. Returns the store-issued applicant sequence number.
    async fn intake(
        &self,
        retry: &Retry,
        submission: &IntakeSubmission,
    ) -> Result<Option<u64>, PipelineError> {
        let applicant = retry
            .run("applicant creation", || self.store.create_applicant())
            .await?;

        let detail = PersonalInput {
            full_name: submission.full_name.clone(),
            email: submission.email.clone(),
            location: submission.location.clone(),
            linkedin: submission.linkedin.clone(),
        };
        retry
            .run("personal detail creation", || {
                self.store.create_personal(&applicant.record_id, &detail)
            })
            .await?;

        for entry in &submission.experiences {
            retry
                .run("work experience creation", || {
                    self.store.create_experience(&applicant.record_id, entry)
                })
                .await?;
        }

        retry
            .run("salary preference creation", || {
                self.store.create_salary(&applicant.record_id, &submission.salary)
            })
            .await?;

        Ok(applicant.applicant_number)
    }

    async fn evaluate(
        &self,
        retry: &Retry,
        applicant_number: Option<u64>,
    ) -> Result<PipelineOutcome, PipelineError> {
        aggregate::refresh_profiles(self.store.as_ref(), retry).await?;

        let applicants = retry
            .run("applicant listing", || self.store.list_applicants())
            .await?;
        let summaries = aggregate::candidate_summaries(&applicants);

        let normalizer = CurrencyNormalizer::new(self.fx.clone(), retry.clone());
        let (shortlisted, rejected) = shortlist::shortlist(
            &self.settings.shortlist,
            &normalizer,
            summaries,
            self.settings.shortlist_concurrency,
        )
        .await;
        info!(
            "Shortlisting complete: {} shortlisted, {} rejected",
            shortlisted.len(),
            rejected.len()
        );

        let enricher = Enricher::new(
            self.completion.clone(),
            retry.clone(),
            self.settings.score_threshold,
        );
        enricher
            .write_rejected_defaults(self.store.as_ref(), &rejected)
            .await;
        let enriched = enricher.enrich(self.store.as_ref(), &shortlisted).await;

        Ok(PipelineOutcome {
            applicant_number,
            shortlisted,
            enriched,
        })
    }
}
