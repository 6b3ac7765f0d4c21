//! Client for the hosted case archive. The in-process simulation table
//! is ephemeral working state; this REST store is the system of record.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use simclin_schema::ClinicalCase;

const ARCHIVE_TIMEOUT_SECS: u64 = 60;

#[async_trait]
pub trait CaseArchive: Send + Sync {
    /// Fetch a previously archived case by its public identifier.
    /// `Ok(None)` means the id is unknown.
    async fn load_case(&self, public_id: &str) -> Result<Option<ClinicalCase>>;

    /// Persist scoring/completion fields for an anamnesis record.
    async fn update_anamnesis(&self, public_id: &str, fields: &Value) -> Result<()>;
}

/// reqwest-backed archive client authenticated with a service token.
pub struct RestArchive {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestArchive {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(ARCHIVE_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl CaseArchive for RestArchive {
    async fn load_case(&self, public_id: &str) -> Result<Option<ClinicalCase>> {
        let url = format!("{}/casos", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("public_id", public_id)])
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| anyhow!("archive request failed: {e}"))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("archive error {status}: {body}"));
        }
        let case = response
            .json::<ClinicalCase>()
            .await
            .map_err(|e| anyhow!("archive returned malformed case: {e}"))?;
        Ok(Some(case))
    }

    async fn update_anamnesis(&self, public_id: &str, fields: &Value) -> Result<()> {
        let url = format!("{}/anamnesis/{}", self.base_url, public_id);
        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.token)
            .json(fields)
            .send()
            .await
            .map_err(|e| anyhow!("archive request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("archive error {status}: {body}"));
        }
        Ok(())
    }
}

/// Records calls instead of talking to a server. Route tests inject this.
#[derive(Default)]
pub struct RecordingArchive {
    pub cases: std::sync::Mutex<std::collections::HashMap<String, ClinicalCase>>,
    pub updates: std::sync::Mutex<Vec<(String, Value)>>,
}

impl RecordingArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_case(self, public_id: impl Into<String>, case: ClinicalCase) -> Self {
        self.cases
            .lock()
            .expect("recording archive poisoned")
            .insert(public_id.into(), case);
        self
    }
}

#[async_trait]
impl CaseArchive for RecordingArchive {
    async fn load_case(&self, public_id: &str) -> Result<Option<ClinicalCase>> {
        Ok(self
            .cases
            .lock()
            .expect("recording archive poisoned")
            .get(public_id)
            .cloned())
    }

    async fn update_anamnesis(&self, public_id: &str, fields: &Value) -> Result<()> {
        self.updates
            .lock()
            .expect("recording archive poisoned")
            .push((public_id.to_string(), fields.clone()));
        Ok(())
    }
}
