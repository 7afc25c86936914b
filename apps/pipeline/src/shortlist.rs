//! Shortlisting — deterministic eligibility rules over candidate summaries.
//!
//! Rule evaluation itself is pure; the driver resolves the one external
//! input (the USD-normalized rate) for all candidates up front with bounded
//! concurrency, then applies the rules candidate by candidate.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::currency::CurrencyNormalizer;
use crate::models::profile::CandidateSummary;

/// The four-leg eligibility policy. All legs are conjunctive; the
/// experience leg is waived for tier-one employers.
#[derive(Debug, Clone)]
pub struct ShortlistPolicy {
    pub allowed_locations: HashSet<String>,
    pub tier_one_companies: Vec<String>,
    pub min_experience_years: f64,
    /// Ceiling on the USD-normalized preferred rate.
    pub max_usd_rate: f64,
    /// Minimum hours per week.
    pub min_availability: i64,
}

impl Default for ShortlistPolicy {
    fn default() -> Self {
        ShortlistPolicy {
            allowed_locations: [
                "united states",
                "united kingdom",
                "canada",
                "germany",
                "india",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            tier_one_companies: ["google", "meta", "microsoft", "nvidia"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            min_experience_years: 4.0,
            max_usd_rate: 100.0,
            min_availability: 20,
        }
    }
}

impl ShortlistPolicy {
    /// Pure eligibility decision given the summary and its pre-resolved USD
    /// rate. Missing fields fail the corresponding leg; they never panic.
    pub fn eligible(&self, summary: &CandidateSummary, usd_rate: Option<f64>) -> bool {
        let in_allowed_location = summary
            .location
            .as_deref()
            .map(|loc| self.allowed_locations.contains(&loc.to_lowercase()))
            .unwrap_or(false);

        let tier_one_alumni = summary.companies.iter().any(|company| {
            let lowered = company.to_lowercase();
            self.tier_one_companies.contains(&lowered)
        });

        let enough_experience =
            summary.total_experience_years >= self.min_experience_years || tier_one_alumni;

        let affordable = matches!(usd_rate, Some(rate) if rate <= self.max_usd_rate);

        let available = summary
            .availability
            .map(|hours| hours >= self.min_availability)
            .unwrap_or(false);

        in_allowed_location && enough_experience && affordable && available
    }
}

/// Splits candidates into shortlisted and rejected. Rate normalization is
/// the per-candidate external call; it is resolved for all candidates with
/// at most `concurrency` in flight, preserving input order for determinism.
pub async fn shortlist(
    policy: &ShortlistPolicy,
    normalizer: &CurrencyNormalizer,
    candidates: Vec<CandidateSummary>,
    concurrency: usize,
) -> (Vec<CandidateSummary>, Vec<CandidateSummary>) {
    let resolved: Vec<(CandidateSummary, Option<f64>)> = stream::iter(candidates)
        .map(|candidate| async move {
            let usd_rate = normalizer.to_usd(&candidate.preferred_rate_display).await;
            (candidate, usd_rate)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut shortlisted = Vec::new();
    let mut rejected = Vec::new();

    for (candidate, usd_rate) in resolved {
        if candidate.location.is_none() {
            warn!("Candidate {} has no location on record", candidate.id);
        }
        if policy.eligible(&candidate, usd_rate) {
            debug!("Candidate {} shortlisted (usd_rate: {usd_rate:?})", candidate.id);
            shortlisted.push(candidate);
        } else {
            debug!("Candidate {} rejected (usd_rate: {usd_rate:?})", candidate.id);
            rejected.push(candidate);
        }
    }

    (shortlisted, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::IdentityFx;
    use crate::retry::{Retry, RetryPolicy};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn candidate(id: &str) -> CandidateSummary {
        CandidateSummary {
            id: id.to_string(),
            name: Some("Ada".into()),
            location: Some("United States".into()),
            total_experience_years: 5.0,
            preferred_rate_display: "80 USD".into(),
            availability: Some(25),
            companies: vec!["Acme".into()],
        }
    }

    #[test]
    fn test_all_legs_passing_is_eligible() {
        let policy = ShortlistPolicy::default();
        assert!(policy.eligible(&candidate("rec1"), Some(80.0)));
    }

    #[test]
    fn test_low_availability_is_ineligible() {
        let policy = ShortlistPolicy::default();
        let mut c = candidate("rec1");
        c.availability = Some(15);
        assert!(!policy.eligible(&c, Some(80.0)));
    }

    #[test]
    fn test_tier_one_company_waives_experience() {
        let policy = ShortlistPolicy::default();
        let mut c = candidate("rec1");
        c.total_experience_years = 2.0;
        c.companies = vec!["Google".into()];
        assert!(policy.eligible(&c, Some(80.0)));
    }

    #[test]
    fn test_short_tenure_without_tier_one_is_ineligible() {
        let policy = ShortlistPolicy::default();
        let mut c = candidate("rec1");
        c.total_experience_years = 2.0;
        assert!(!policy.eligible(&c, Some(80.0)));
    }

    #[test]
    fn test_location_comparison_is_case_insensitive() {
        let policy = ShortlistPolicy::default();
        let mut c = candidate("rec1");
        c.location = Some("UNITED KINGDOM".into());
        assert!(policy.eligible(&c, Some(80.0)));
        c.location = Some("France".into());
        assert!(!policy.eligible(&c, Some(80.0)));
    }

    #[test]
    fn test_unresolved_rate_is_ineligible() {
        let policy = ShortlistPolicy::default();
        assert!(!policy.eligible(&candidate("rec1"), None));
    }

    #[test]
    fn test_rate_above_ceiling_is_ineligible() {
        let policy = ShortlistPolicy::default();
        assert!(!policy.eligible(&candidate("rec1"), Some(120.0)));
    }

    #[test]
    fn test_missing_location_is_ineligible_not_a_panic() {
        let policy = ShortlistPolicy::default();
        let mut c = candidate("rec1");
        c.location = None;
        assert!(!policy.eligible(&c, Some(80.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_partitions_and_preserves_order() {
        let policy = ShortlistPolicy::default();
        let normalizer = CurrencyNormalizer::new(
            Arc::new(IdentityFx),
            Retry::new(RetryPolicy::default(), CancellationToken::new()),
        );

        let mut too_expensive = candidate("rec2");
        too_expensive.preferred_rate_display = "150 USD".into();
        let mut unparseable_rate = candidate("rec3");
        unparseable_rate.preferred_rate_display = "Others".into();

        let (shortlisted, rejected) = shortlist(
            &policy,
            &normalizer,
            vec![candidate("rec1"), too_expensive, unparseable_rate, candidate("rec4")],
            4,
        )
        .await;

        let ids: Vec<_> = shortlisted.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["rec1", "rec4"]);
        let rejected_ids: Vec<_> = rejected.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(rejected_ids, vec!["rec2", "rec3"]);
    }
}
