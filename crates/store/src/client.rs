use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tracing::debug;

use crate::{Entry, NewEntry, StoreError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the managed entries datastore, speaking its REST dialect
/// (`/rest/v1/entries`, `apikey` + bearer auth, PostgREST query operators).
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl StoreClient {
    /// Build a client for the given base URL using the privileged service
    /// role key for both the `apikey` header and bearer auth.
    pub fn new(base_url: &str, service_role_key: &str) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(service_role_key)
            .map_err(|e| StoreError::Transport(format!("invalid service role key: {e}")))?;
        headers.insert("apikey", api_key);
        let bearer = HeaderValue::from_str(&format!("Bearer {service_role_key}"))
            .map_err(|e| StoreError::Transport(format!("invalid service role key: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    fn entries_url(&self) -> String {
        format!("{}/rest/v1/entries", self.base_url)
    }

    /// Every entry, newest first. Ordering is done by the store; no paging
    /// or filtering.
    pub async fn list_all(&self) -> Result<Vec<Entry>, StoreError> {
        let resp = self
            .http
            .get(self.entries_url())
            .query(&[("select", "*"), ("order", "timestamp.desc")])
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let resp = check_status(resp).await?;
        resp.json::<Vec<Entry>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Insert one row and return the persisted representation, including the
    /// store-assigned id and timestamp.
    pub async fn insert_one(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Entry, StoreError> {
        let row = NewEntry {
            title: title.to_string(),
            description: description.map(str::to_string),
        };
        let resp = self
            .http
            .post(self.entries_url())
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let resp = check_status(resp).await?;
        let mut rows = resp
            .json::<Vec<Entry>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        // An accepted insert that does not yield exactly the persisted row is
        // still a store failure for the caller.
        if rows.len() != 1 {
            return Err(StoreError::Decode(format!(
                "expected 1 returned row, got {}",
                rows.len()
            )));
        }
        Ok(rows.remove(0))
    }
}

/// Map a non-success datastore response to `StoreError::Api`, preferring the
/// `message` field the store puts in its JSON error bodies.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("store returned status {status}")
            } else {
                body.clone()
            }
        });
    debug!(%status, %message, "datastore call failed");
    Err(StoreError::Api(message))
}
