//! # rj-cleanup-http
//!
//! `TextCleanup` over HTTP: `POST {endpoint}` with `{"text": ...}`, answered
//! by `{"cleanedText": ...}`.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use rj_core::traits::TextCleanup;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

#[derive(Serialize)]
struct CleanupRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CleanupResponse {
    cleaned_text: String,
}

pub struct HttpTextCleanup {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl HttpTextCleanup {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build cleanup HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl TextCleanup for HttpTextCleanup {
    async fn cleanup(&self, text: &str) -> anyhow::Result<String> {
        let mut request = self.client.post(&self.endpoint).json(&CleanupRequest { text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.context("cleanup request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(code = status.as_u16(), message = %body, "cleanup API error");
            return Err(anyhow!("cleanup endpoint returned {status}"));
        }

        let body: CleanupResponse = response
            .json()
            .await
            .context("malformed cleanup response")?;
        debug!(chars = body.cleaned_text.chars().count(), "cleanup response received");
        Ok(body.cleaned_text)
    }
}
