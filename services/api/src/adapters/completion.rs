//! services/api/src/adapters/completion.rs
//!
//! This module contains the adapter for the hosted completion endpoint.
//! It implements the `CompletionService` port from the `core` crate.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use support_chat_core::domain::CompletionRequest;
use support_chat_core::ports::{CompletionService, PortError, PortResult};
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CompletionService` against a messages-style endpoint.
#[derive(Clone)]
pub struct AnthropicCompletionAdapter {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AnthropicCompletionAdapter {
    /// Creates a new `AnthropicCompletionAdapter`.
    ///
    /// Without an API key no auth headers are sent, for use behind a proxy that
    /// adds them.
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

/// Pulls the reply out of `content[0].text`. Any other shape is an error.
pub fn extract_reply_text(body: &Value) -> PortResult<String> {
    body.get("content")
        .and_then(|content| content.get(0))
        .and_then(|first| first.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            PortError::MalformedResponse("response has no content[0].text".to_string())
        })
}

//=========================================================================================
// `CompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionService for AnthropicCompletionAdapter {
    async fn complete(&self, request: &CompletionRequest) -> PortResult<String> {
        let mut http = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(request);

        if let Some(api_key) = &self.api_key {
            http = http
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION);
        }

        let resp = http
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(PortError::Transport(format!("{} - {}", status, text)));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| PortError::MalformedResponse(e.to_string()))?;
        debug!("Completion response received");

        extract_reply_text(&body)
    }
}
