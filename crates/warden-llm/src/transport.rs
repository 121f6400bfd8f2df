//! Chat-completion transport.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// One chat-completion round trip: request body in, message content out.
/// The engine is written against this seam so tests can stub the remote.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, request: &Value) -> Result<String>;
}

/// HTTP transport against an OpenAI-compatible chat-completions endpoint.
pub struct HttpChatTransport {
    client: Client,
    url: String,
    api_key: String,
}

impl HttpChatTransport {
    pub fn new(url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("warden-oracle/0.1")
            .build()
            .context("failed to build LLM HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn complete(&self, request: &Value) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .context("failed to send request to LLM API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("LLM API returned {status}: {error_text}"));
        }

        let body: Value = response
            .json()
            .await
            .context("LLM API returned a non-JSON body")?;

        let content = body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("LLM response missing choices[0].message.content"))?;

        if content.trim().is_empty() {
            return Err(anyhow!("LLM returned empty content"));
        }

        if let Some(usage) = body.get("usage") {
            debug!("[LLM] usage: {usage}");
        }

        Ok(content.to_string())
    }
}
