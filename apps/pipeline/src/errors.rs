use thiserror::Error;

/// Pipeline-level error type.
///
/// One variant per failure kind the stages can surface. Batch drivers catch
/// these per record and keep going; only the orchestrator's own failures
/// (cancellation, configuration) abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Currency conversion failed: {0}")]
    Conversion(String),

    #[error("Record write failed: {0}")]
    Write(String),

    #[error("Completion service error: {0}")]
    Completion(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation cancelled or timed out: {0}")]
    Cancelled(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PipelineError {
    /// Whether the error came from the run being cancelled or timed out.
    /// Retry loops stop immediately on these instead of burning attempts.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled(_))
    }
}
