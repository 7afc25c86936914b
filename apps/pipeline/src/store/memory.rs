//! In-memory [`RecordStore`] — test double and local demo backend.
//!
//! Applicant sequence numbers come from an `AtomicU64`, standing in for the
//! store-issued sequence a real backend provides. Record ids are zero-padded
//! so enumeration order matches creation order.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::PipelineError;
use crate::models::intake::{ExperienceInput, SalaryInput};

use super::{
    ApplicantRecord, AssessmentFields, ExperienceRecord, PersonalInput, PersonalRecord,
    RecordStore, SalaryRecord,
};

#[derive(Default)]
struct Inner {
    applicants: BTreeMap<String, ApplicantRecord>,
    personal: HashMap<String, PersonalRecord>,
    experience: HashMap<String, ExperienceRecord>,
    salary: HashMap<String, SalaryRecord>,
    assessments: HashMap<String, AssessmentFields>,
    next_record: u64,
}

impl Inner {
    fn next_record_id(&mut self, prefix: &str) -> String {
        self.next_record += 1;
        format!("{prefix}{:06}", self.next_record)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    sequence: AtomicU64,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Test hook: the enrichment fields currently stored for an applicant.
    pub fn assessment(&self, applicant_record_id: &str) -> Option<AssessmentFields> {
        self.locked().assessments.get(applicant_record_id).cloned()
    }

    /// Test hook: the cached profile JSON for an applicant.
    pub fn profile_json(&self, applicant_record_id: &str) -> Option<String> {
        self.locked()
            .applicants
            .get(applicant_record_id)
            .and_then(|a| a.profile_json.clone())
    }

    /// Test hook: removes a satellite record while leaving any references to
    /// it dangling, simulating a store whose lookups keep failing.
    pub fn drop_record(&self, record_id: &str) {
        let mut inner = self.locked();
        inner.personal.remove(record_id);
        inner.experience.remove(record_id);
        inner.salary.remove(record_id);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create_applicant(&self) -> Result<ApplicantRecord, PipelineError> {
        let number = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let mut inner = self.locked();
        let record_id = inner.next_record_id("app");
        let record = ApplicantRecord {
            record_id: record_id.clone(),
            applicant_number: Some(number),
            ..ApplicantRecord::default()
        };
        inner.applicants.insert(record_id, record.clone());
        Ok(record)
    }

    async fn create_personal(
        &self,
        applicant_record_id: &str,
        detail: &PersonalInput,
    ) -> Result<String, PipelineError> {
        let mut inner = self.locked();
        let record_id = inner.next_record_id("per");
        inner.personal.insert(
            record_id.clone(),
            PersonalRecord {
                name: Some(detail.full_name.clone()),
                email: Some(detail.email.clone()),
                location: Some(detail.location.clone()),
                linkedin: detail.linkedin.clone(),
            },
        );
        link(&mut inner, applicant_record_id, |a| &mut a.personal_refs, &record_id)?;
        Ok(record_id)
    }

    async fn create_experience(
        &self,
        applicant_record_id: &str,
        entry: &ExperienceInput,
    ) -> Result<String, PipelineError> {
        let mut inner = self.locked();
        let record_id = inner.next_record_id("exp");
        inner.experience.insert(
            record_id.clone(),
            ExperienceRecord {
                company: Some(entry.company.clone()),
                title: Some(entry.title.clone()),
                start: entry.start.clone(),
                end: entry.end.clone(),
                technologies: entry.technologies.clone(),
            },
        );
        link(&mut inner, applicant_record_id, |a| &mut a.experience_refs, &record_id)?;
        Ok(record_id)
    }

    async fn create_salary(
        &self,
        applicant_record_id: &str,
        preference: &SalaryInput,
    ) -> Result<String, PipelineError> {
        let mut inner = self.locked();
        let record_id = inner.next_record_id("sal");
        inner.salary.insert(
            record_id.clone(),
            SalaryRecord {
                preferred_rate: preference.preferred_rate,
                minimum_rate: preference.minimum_rate,
                currency: preference.currency.clone(),
                availability: preference.availability,
            },
        );
        link(&mut inner, applicant_record_id, |a| &mut a.salary_refs, &record_id)?;
        Ok(record_id)
    }

    async fn list_applicants(&self) -> Result<Vec<ApplicantRecord>, PipelineError> {
        Ok(self.locked().applicants.values().cloned().collect())
    }

    async fn get_personal(&self, record_id: &str) -> Result<PersonalRecord, PipelineError> {
        self.locked()
            .personal
            .get(record_id)
            .cloned()
            .ok_or_else(|| PipelineError::Lookup(format!("no personal record {record_id}")))
    }

    async fn get_experience(&self, record_id: &str) -> Result<ExperienceRecord, PipelineError> {
        self.locked()
            .experience
            .get(record_id)
            .cloned()
            .ok_or_else(|| PipelineError::Lookup(format!("no experience record {record_id}")))
    }

    async fn get_salary(&self, record_id: &str) -> Result<SalaryRecord, PipelineError> {
        self.locked()
            .salary
            .get(record_id)
            .cloned()
            .ok_or_else(|| PipelineError::Lookup(format!("no salary record {record_id}")))
    }

    async fn write_profile_json(
        &self,
        applicant_record_id: &str,
        compact_json: &str,
    ) -> Result<(), PipelineError> {
        let mut inner = self.locked();
        let applicant = inner
            .applicants
            .get_mut(applicant_record_id)
            .ok_or_else(|| PipelineError::Write(format!("no applicant {applicant_record_id}")))?;
        applicant.profile_json = Some(compact_json.to_string());
        Ok(())
    }

    async fn write_assessment(
        &self,
        applicant_record_id: &str,
        fields: &AssessmentFields,
    ) -> Result<(), PipelineError> {
        let mut inner = self.locked();
        if !inner.applicants.contains_key(applicant_record_id) {
            return Err(PipelineError::Write(format!(
                "no applicant {applicant_record_id}"
            )));
        }
        inner
            .assessments
            .insert(applicant_record_id.to_string(), fields.clone());
        Ok(())
    }
}

fn link(
    inner: &mut Inner,
    applicant_record_id: &str,
    refs: impl FnOnce(&mut ApplicantRecord) -> &mut Vec<String>,
    record_id: &str,
) -> Result<(), PipelineError> {
    let applicant = inner
        .applicants
        .get_mut(applicant_record_id)
        .ok_or_else(|| PipelineError::Write(format!("no applicant {applicant_record_id}")))?;
    refs(applicant).push(record_id.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_applicant_numbers_are_sequential() {
        let store = MemoryStore::new();
        let first = store.create_applicant().await.unwrap();
        let second = store.create_applicant().await.unwrap();
        assert_eq!(first.applicant_number, Some(1));
        assert_eq!(second.applicant_number, Some(2));
    }

    #[tokio::test]
    async fn test_links_preserve_creation_order() {
        let store = MemoryStore::new();
        let applicant = store.create_applicant().await.unwrap();
        let entry = ExperienceInput {
            company: "Acme".into(),
            title: "Dev".into(),
            start: None,
            end: None,
            technologies: None,
        };
        let a = store.create_experience(&applicant.record_id, &entry).await.unwrap();
        let b = store.create_experience(&applicant.record_id, &entry).await.unwrap();
        let listed = store.list_applicants().await.unwrap();
        assert_eq!(listed[0].experience_refs, vec![a, b]);
    }

    #[tokio::test]
    async fn test_missing_lookup_is_a_lookup_error() {
        let store = MemoryStore::new();
        let err = store.get_personal("per999999").await.unwrap_err();
        assert!(matches!(err, PipelineError::Lookup(_)));
    }
}
