//! Profile aggregation — resolves an applicant's reference lists into one
//! canonical profile and keeps the cached compact-JSON copy fresh.
//!
//! Flow per applicant: first personal ref → ordered experience refs →
//! first salary ref → serialize → single field write-back.

use tracing::{error, info, warn};

use crate::errors::PipelineError;
use crate::models::profile::{
    CandidateSummary, CanonicalProfile, ProfileExperience, ProfilePersonal, ProfileSalary,
};
use crate::retry::Retry;
use crate::store::{ApplicantRecord, RecordStore};

/// Assembles the canonical profile for one applicant.
///
/// Only the first personal-detail and first salary-preference references are
/// consulted; any extra references are ignored. Missing references produce
/// empty substructures. A lookup that exhausts its retries fails the whole
/// applicant: the caller logs it and excludes the applicant from the run,
/// instead of the record silently collapsing to an empty profile.
pub async fn aggregate(
    store: &dyn RecordStore,
    retry: &Retry,
    applicant: &ApplicantRecord,
) -> Result<CanonicalProfile, PipelineError> {
    let mut personal = ProfilePersonal::default();
    if let Some(personal_id) = applicant.personal_refs.first() {
        let record = retry
            .run("personal detail lookup", || store.get_personal(personal_id))
            .await?;
        personal = ProfilePersonal {
            name: record.name,
            location: record.location,
        };
    }

    let mut experience = Vec::with_capacity(applicant.experience_refs.len());
    for experience_id in &applicant.experience_refs {
        let record = retry
            .run("work experience lookup", || {
                store.get_experience(experience_id)
            })
            .await?;
        experience.push(ProfileExperience {
            company: record.company,
            title: record.title,
            start: record.start,
            end: record.end,
            technologies: record.technologies,
        });
    }

    let mut salary = ProfileSalary::default();
    if let Some(salary_id) = applicant.salary_refs.first() {
        let record = retry
            .run("salary preference lookup", || store.get_salary(salary_id))
            .await?;
        salary = ProfileSalary {
            rate: record.preferred_rate,
            currency: record.currency,
            availability: record.availability,
        };
    }

    Ok(CanonicalProfile {
        applicant_id: applicant.applicant_number,
        personal,
        experience,
        salary,
    })
}

/// Re-aggregates every applicant and overwrites each cached profile JSON
/// with one field update per applicant. Failures — incomplete profiles and
/// write errors alike — are logged and skip only the affected applicant.
/// Returns the number of applicants refreshed.
pub async fn refresh_profiles(
    store: &dyn RecordStore,
    retry: &Retry,
) -> Result<usize, PipelineError> {
    let applicants = retry
        .run("applicant listing", || store.list_applicants())
        .await?;

    let mut refreshed = 0;
    for applicant in &applicants {
        let profile = match aggregate(store, retry, applicant).await {
            Ok(profile) => profile,
            Err(e) => {
                error!(
                    "Excluding applicant {} from this run, profile incomplete: {e}",
                    applicant.record_id
                );
                continue;
            }
        };

        let compact = match profile.to_compact_json() {
            Ok(json) => json,
            Err(e) => {
                error!(
                    "Could not serialize profile for applicant {}: {e}",
                    applicant.record_id
                );
                continue;
            }
        };

        let write = retry
            .run("profile write-back", || {
                store.write_profile_json(&applicant.record_id, &compact)
            })
            .await;
        match write {
            Ok(()) => refreshed += 1,
            Err(e) => error!(
                "Could not cache profile for applicant {}: {e}",
                applicant.record_id
            ),
        }
    }

    info!("Profile refresh complete: {refreshed}/{} applicants", applicants.len());
    Ok(refreshed)
}

/// Builds per-run candidate summaries from the cached profile JSON on each
/// applicant record. Records without a parseable cached profile are logged
/// and skipped; they were excluded during aggregation.
pub fn candidate_summaries(applicants: &[ApplicantRecord]) -> Vec<CandidateSummary> {
    let mut summaries = Vec::with_capacity(applicants.len());
    for applicant in applicants {
        let Some(raw) = applicant.profile_json.as_deref() else {
            warn!("Applicant {} has no cached profile; skipping", applicant.record_id);
            continue;
        };
        match serde_json::from_str::<CanonicalProfile>(raw) {
            Ok(profile) => summaries.push(CandidateSummary::from_profile(
                &applicant.record_id,
                &profile,
            )),
            Err(e) => error!(
                "Cached profile for applicant {} is unreadable: {e}",
                applicant.record_id
            ),
        }
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::intake::{ExperienceInput, SalaryInput};
    use crate::retry::RetryPolicy;
    use crate::store::{MemoryStore, PersonalInput};
    use tokio_util::sync::CancellationToken;

    fn retry() -> Retry {
        Retry::new(RetryPolicy::default(), CancellationToken::new())
    }

    fn personal() -> PersonalInput {
        PersonalInput {
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            location: "United Kingdom".into(),
            linkedin: None,
        }
    }

    fn salary() -> SalaryInput {
        SalaryInput {
            preferred_rate: Some(90.0),
            minimum_rate: Some(70.0),
            currency: Some("USD".into()),
            availability: Some(30),
        }
    }

    async fn seeded_store() -> (MemoryStore, String) {
        let store = MemoryStore::new();
        let applicant = store.create_applicant().await.unwrap();
        store.create_personal(&applicant.record_id, &personal()).await.unwrap();
        store
            .create_experience(
                &applicant.record_id,
                &ExperienceInput {
                    company: "Acme".into(),
                    title: "Engineer".into(),
                    start: Some("2018-01-01".into()),
                    end: Some("2023-01-01".into()),
                    technologies: Some("Rust".into()),
                },
            )
            .await
            .unwrap();
        store.create_salary(&applicant.record_id, &salary()).await.unwrap();
        (store, applicant.record_id)
    }

    #[tokio::test]
    async fn test_aggregate_merges_all_sections_in_order() {
        let (store, record_id) = seeded_store().await;
        let applicant = store.list_applicants().await.unwrap().remove(0);
        let profile = aggregate(&store, &retry(), &applicant).await.unwrap();

        assert_eq!(profile.personal.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(profile.experience.len(), 1);
        assert_eq!(profile.experience[0].company.as_deref(), Some("Acme"));
        assert_eq!(profile.salary.rate, Some(90.0));
        assert_eq!(profile.applicant_id, Some(1));
        assert_eq!(record_id, applicant.record_id);
    }

    #[tokio::test]
    async fn test_no_experience_references_yield_empty_list() {
        let store = MemoryStore::new();
        let applicant = store.create_applicant().await.unwrap();
        store.create_personal(&applicant.record_id, &personal()).await.unwrap();

        let applicant = store.list_applicants().await.unwrap().remove(0);
        let profile = aggregate(&store, &retry(), &applicant).await.unwrap();
        assert!(profile.experience.is_empty());
        assert_eq!(profile.salary, ProfileSalary::default());
    }

    #[tokio::test]
    async fn test_only_first_personal_reference_is_used() {
        let (store, record_id) = seeded_store().await;
        let second = PersonalInput {
            full_name: "Imposter".into(),
            ..personal()
        };
        store.create_personal(&record_id, &second).await.unwrap();

        let applicant = store.list_applicants().await.unwrap().remove(0);
        let profile = aggregate(&store, &retry(), &applicant).await.unwrap();
        assert_eq!(profile.personal.name.as_deref(), Some("Ada Lovelace"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_lookup_fails_the_applicant() {
        let (store, _) = seeded_store().await;
        let applicant = store.list_applicants().await.unwrap().remove(0);
        store.drop_record(&applicant.salary_refs[0]);

        let result = aggregate(&store, &retry(), &applicant).await;
        assert!(matches!(result, Err(PipelineError::Lookup(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_skips_broken_applicants_and_keeps_the_rest() {
        let (store, healthy_id) = seeded_store().await;
        let broken = store.create_applicant().await.unwrap();
        store.create_personal(&broken.record_id, &personal()).await.unwrap();
        let broken_refs = store.list_applicants().await.unwrap().remove(1).personal_refs;
        store.drop_record(&broken_refs[0]);

        let refreshed = refresh_profiles(&store, &retry()).await.unwrap();
        assert_eq!(refreshed, 1);
        assert!(store.profile_json(&healthy_id).is_some());
        assert!(store.profile_json(&broken.record_id).is_none());
    }

    #[tokio::test]
    async fn test_refresh_twice_is_byte_identical() {
        let (store, record_id) = seeded_store().await;
        refresh_profiles(&store, &retry()).await.unwrap();
        let first = store.profile_json(&record_id).unwrap();
        refresh_profiles(&store, &retry()).await.unwrap();
        let second = store.profile_json(&record_id).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_summaries_skip_records_without_profiles() {
        let (store, record_id) = seeded_store().await;
        refresh_profiles(&store, &retry()).await.unwrap();
        store.create_applicant().await.unwrap(); // arrived after the refresh pass

        let applicants = store.list_applicants().await.unwrap();
        let summaries = candidate_summaries(&applicants);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, record_id);
    }
}
