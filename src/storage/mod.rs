use crate::config::StorageConfig;
use crate::error::StorageError;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

const STORAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Destination for finished analysis records
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persist one record; returns the generated row id
    async fn save(&self, repo_url: &str, record: &serde_json::Value)
        -> Result<Uuid, StorageError>;
}

#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    test_id: String,
    repo_url: &'a str,
    data: &'a serde_json::Value,
}

/// Inserts rows through the Supabase PostgREST endpoint
pub struct SupabaseSink {
    client: reqwest::Client,
    endpoint: String,
    key: String,
}

impl SupabaseSink {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let (Some(url), Some(key)) = (&config.url, &config.key) else {
            return Err(StorageError::NotConfigured);
        };

        let client = reqwest::Client::builder()
            .timeout(STORAGE_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", url.trim_end_matches('/'), config.table),
            key: key.clone(),
        })
    }
}

#[async_trait]
impl RecordSink for SupabaseSink {
    async fn save(
        &self,
        repo_url: &str,
        record: &serde_json::Value,
    ) -> Result<Uuid, StorageError> {
        let test_id = Uuid::new_v4();
        let row = InsertRow {
            test_id: test_id.to_string(),
            repo_url,
            data: record,
        };
        let body = serde_json::to_vec(&row)?;

        debug!("Inserting analysis record {} into {}", test_id, self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("Prefer", "return=minimal")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Saved analysis record {}", test_id);
        Ok(test_id)
    }
}
