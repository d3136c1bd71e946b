//! HTTP client for the bridge endpoints.

use botomy_core::{ActionBatch, ResetResponse, Snapshot};

/// HTTP side of the engine: the two calls it makes against the bridge.
#[derive(Debug, Clone)]
pub struct EngineClient {
    http: reqwest::Client,
    base: String,
}

impl EngineClient {
    /// `base` is the bridge root URL, e.g. `http://127.0.0.1:3000`.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Post this tick's snapshot; the response carries any pending commands.
    pub async fn post_snapshot(&self, snapshot: &Snapshot) -> anyhow::Result<ActionBatch> {
        let resp = self
            .http
            .post(format!("{}/", self.base))
            .json(snapshot)
            .send()
            .await?;
        if !resp.status().is_success() {
            anyhow::bail!("bridge rejected snapshot: {}", resp.status());
        }
        Ok(resp.json::<ActionBatch>().await?)
    }

    /// Ask whether a new episode should start.
    pub async fn poll_reset(&self) -> anyhow::Result<ResetResponse> {
        let resp = self.http.get(format!("{}/reset", self.base)).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("reset poll failed: {}", resp.status());
        }
        Ok(resp.json::<ResetResponse>().await?)
    }
}
