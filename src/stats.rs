// ABOUTME: Usage statistics sink for the external bot-listing endpoint.
// ABOUTME: Trait seam so tests can observe pushes without any network.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;

use crate::config::StatsConfig;

/// External statistics-reporting collaborator.
#[async_trait]
pub trait StatsSink: Send + Sync {
    /// Report the current server count.
    async fn post_server_count(&self, server_count: usize) -> Result<()>;
}

/// HTTP implementation posting to the configured listing endpoint.
pub struct HttpStatsSink {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpStatsSink {
    /// None when no endpoint is configured.
    pub fn from_config(config: &StatsConfig) -> Option<Self> {
        let url = config.url.clone().filter(|u| !u.is_empty())?;
        Some(Self {
            http: reqwest::Client::new(),
            url,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl StatsSink for HttpStatsSink {
    async fn post_server_count(&self, server_count: usize) -> Result<()> {
        let mut request = self
            .http
            .post(&self.url)
            .json(&serde_json::json!({ "server_count": server_count }));
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, key.as_str());
        }

        let response = request.send().await.context("stats endpoint unreachable")?;
        response
            .error_for_status()
            .context("stats endpoint rejected the update")?;
        Ok(())
    }
}
