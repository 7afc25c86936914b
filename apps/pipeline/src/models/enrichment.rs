use serde::Serialize;

/// Structured outcome of one candidate's qualitative assessment,
/// mirrored onto the applicant's store record.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentResult {
    /// Store record id of the candidate.
    pub id: String,
    pub summary: String,
    pub score: i64,
    pub issues: Vec<String>,
    pub follow_ups: Vec<String>,
    /// "Yes" or "No", derived from the score threshold.
    pub status: String,
}
