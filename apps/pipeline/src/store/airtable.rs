//! Airtable-backed [`RecordStore`] implementation.
//!
//! Table and field names match the production base; records come back as
//! `{id, fields}` objects with loosely-typed fields, so reads go through
//! small typed accessors instead of trusting the payload shape.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::PipelineError;
use crate::models::intake::{ExperienceInput, SalaryInput};

use super::{
    ApplicantRecord, AssessmentFields, ExperienceRecord, PersonalInput, PersonalRecord,
    RecordStore, SalaryRecord,
};

const API_BASE_URL: &str = "https://api.airtable.com/v0";

const APPLICANTS_TABLE: &str = "Applicants";
const PERSONAL_TABLE: &str = "Personal Details";
const EXPERIENCE_TABLE: &str = "Work Experience";
const SALARY_TABLE: &str = "Salary Preferences";

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: String,
    #[serde(default)]
    fields: Value,
}

#[derive(Debug, Deserialize)]
struct RecordPage {
    records: Vec<RawRecord>,
    offset: Option<String>,
}

impl RawRecord {
    fn text(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    fn integer(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    /// Linked-record reference list; missing field reads as empty.
    fn refs(&self, key: &str) -> Vec<String> {
        self.fields
            .get(key)
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn into_applicant(self) -> ApplicantRecord {
        ApplicantRecord {
            applicant_number: self.integer("Applicant ID").and_then(|n| u64::try_from(n).ok()),
            personal_refs: self.refs("Personal Details"),
            experience_refs: self.refs("Work Experience"),
            salary_refs: self.refs("Salary Preferences"),
            profile_json: self.text("Compressed JSON"),
            record_id: self.id,
        }
    }
}

/// HTTP client for the Airtable record store.
#[derive(Clone)]
pub struct AirtableStore {
    client: Client,
    api_key: String,
    base_id: String,
}

impl AirtableStore {
    pub fn new(api_key: String, base_id: String) -> Self {
        AirtableStore {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_id,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{API_BASE_URL}/{}/{}", self.base_id, table)
    }

    async fn read_record(&self, table: &str, record_id: &str) -> Result<RawRecord, PipelineError> {
        let response = self
            .client
            .get(format!("{}/{record_id}", self.table_url(table)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Lookup(format!(
                "{table}/{record_id} returned {status}: {body}"
            )));
        }
        Ok(response.json().await?)
    }

    async fn create_record(&self, table: &str, fields: Value) -> Result<RawRecord, PipelineError> {
        let response = self
            .client
            .post(self.table_url(table))
            .bearer_auth(&self.api_key)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Write(format!(
                "create in {table} returned {status}: {body}"
            )));
        }
        Ok(response.json().await?)
    }

    async fn patch_record(
        &self,
        table: &str,
        record_id: &str,
        fields: Value,
    ) -> Result<(), PipelineError> {
        let response = self
            .client
            .patch(format!("{}/{record_id}", self.table_url(table)))
            .bearer_auth(&self.api_key)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Write(format!(
                "update of {table}/{record_id} returned {status}: {body}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn create_applicant(&self) -> Result<ApplicantRecord, PipelineError> {
        // "Applicant ID" is an autonumber column; the store assigns it and
        // the created record carries it back.
        let record = self.create_record(APPLICANTS_TABLE, json!({})).await?;
        debug!(
            "Created applicant {} (#{:?})",
            record.id,
            record.integer("Applicant ID")
        );
        Ok(record.into_applicant())
    }

    async fn create_personal(
        &self,
        applicant_record_id: &str,
        detail: &PersonalInput,
    ) -> Result<String, PipelineError> {
        let record = self
            .create_record(
                PERSONAL_TABLE,
                json!({
                    "Full Name": detail.full_name,
                    "Email": detail.email,
                    "Location": detail.location,
                    "LinkedIn": detail.linkedin,
                    "Applicants": [applicant_record_id],
                }),
            )
            .await?;
        Ok(record.id)
    }

    async fn create_experience(
        &self,
        applicant_record_id: &str,
        entry: &ExperienceInput,
    ) -> Result<String, PipelineError> {
        let record = self
            .create_record(
                EXPERIENCE_TABLE,
                json!({
                    "Company": entry.company,
                    "Title": entry.title,
                    "Start": entry.start,
                    "End": entry.end,
                    "Technologies": entry.technologies,
                    "Applicant ID": [applicant_record_id],
                }),
            )
            .await?;
        Ok(record.id)
    }

    async fn create_salary(
        &self,
        applicant_record_id: &str,
        preference: &SalaryInput,
    ) -> Result<String, PipelineError> {
        let record = self
            .create_record(
                SALARY_TABLE,
                json!({
                    "Preferred Rate": preference.preferred_rate,
                    "Minimum Rate": preference.minimum_rate,
                    "Currency": preference.currency,
                    "Availability (hrs/wk)": preference.availability,
                    "Applicants": [applicant_record_id],
                }),
            )
            .await?;
        Ok(record.id)
    }

    async fn list_applicants(&self) -> Result<Vec<ApplicantRecord>, PipelineError> {
        let mut applicants = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.table_url(APPLICANTS_TABLE))
                .bearer_auth(&self.api_key);
            if let Some(cursor) = &offset {
                request = request.query(&[("offset", cursor)]);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(PipelineError::Lookup(format!(
                    "list of {APPLICANTS_TABLE} returned {status}: {body}"
                )));
            }

            let page: RecordPage = response.json().await?;
            applicants.extend(page.records.into_iter().map(RawRecord::into_applicant));

            match page.offset {
                Some(cursor) => offset = Some(cursor),
                None => break,
            }
        }

        Ok(applicants)
    }

    async fn get_personal(&self, record_id: &str) -> Result<PersonalRecord, PipelineError> {
        let record = self.read_record(PERSONAL_TABLE, record_id).await?;
        Ok(PersonalRecord {
            name: record.text("Full Name"),
            email: record.text("Email"),
            location: record.text("Location"),
            linkedin: record.text("LinkedIn"),
        })
    }

    async fn get_experience(&self, record_id: &str) -> Result<ExperienceRecord, PipelineError> {
        let record = self.read_record(EXPERIENCE_TABLE, record_id).await?;
        Ok(ExperienceRecord {
            company: record.text("Company"),
            title: record.text("Title"),
            start: record.text("Start"),
            end: record.text("End"),
            technologies: record.text("Technologies"),
        })
    }

    async fn get_salary(&self, record_id: &str) -> Result<SalaryRecord, PipelineError> {
        let record = self.read_record(SALARY_TABLE, record_id).await?;
        Ok(SalaryRecord {
            preferred_rate: record.number("Preferred Rate"),
            minimum_rate: record.number("Minimum Rate"),
            currency: record.text("Currency"),
            availability: record.integer("Availability (hrs/wk)"),
        })
    }

    async fn write_profile_json(
        &self,
        applicant_record_id: &str,
        compact_json: &str,
    ) -> Result<(), PipelineError> {
        self.patch_record(
            APPLICANTS_TABLE,
            applicant_record_id,
            json!({ "Compressed JSON": compact_json }),
        )
        .await
    }

    async fn write_assessment(
        &self,
        applicant_record_id: &str,
        fields: &AssessmentFields,
    ) -> Result<(), PipelineError> {
        self.patch_record(
            APPLICANTS_TABLE,
            applicant_record_id,
            json!({
                "LLM Summary": fields.summary,
                "LLM Score": fields.score,
                "LLM Follow-Ups": fields.follow_ups,
                "Shortlist Status": fields.status,
            }),
        )
        .await
    }
}
