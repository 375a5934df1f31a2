//! Anthropic provider implementation for Flashtutor
//!
//! This module implements the Provider trait on top of the Anthropic
//! Messages API (`POST /v1/messages`) with tool calling support.

use crate::config::AnthropicConfig;
use crate::error::{FlashtutorError, Result};
use crate::providers::{CompletionRequest, CompletionResponse, ContentBlock, Provider, TokenUsage};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Anthropic Messages API provider
///
/// # Examples
///
/// ```no_run
/// use flashtutor::config::AnthropicConfig;
/// use flashtutor::providers::{AnthropicProvider, CompletionRequest, Message, Provider};
///
/// # async fn example() -> flashtutor::error::Result<()> {
/// let config = AnthropicConfig {
///     api_key: Some("sk-ant-...".to_string()),
///     ..Default::default()
/// };
/// let provider = AnthropicProvider::new(config)?;
/// let request = CompletionRequest {
///     messages: vec![Message::user("Explain mitosis")],
///     ..Default::default()
/// };
/// let response = provider.complete(&request).await?;
/// # Ok(())
/// # }
/// ```
pub struct AnthropicProvider {
    client: Client,
    config: AnthropicConfig,
    api_key: String,
}

/// Request body for the Messages API
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a serde_json::Value,
}

/// Response body from the Messages API
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: usize,
    #[serde(default)]
    output_tokens: usize,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider instance
    ///
    /// # Errors
    ///
    /// Returns `FlashtutorError::MissingCredentials` when no API key is
    /// configured, or a provider error if the HTTP client cannot be built
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("flashtutor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FlashtutorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Anthropic provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Build a full URL for an API path
    fn api_endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: request.system.as_deref(),
            messages: request
                .messages
                .iter()
                .map(|m| AnthropicMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            tools: request
                .tools
                .iter()
                .map(|t| AnthropicTool {
                    name: &t.name,
                    description: &t.description,
                    input_schema: &t.input_schema,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request(request);

        tracing::debug!(
            "Sending Anthropic request: {} messages, {} tools",
            body.messages.len(),
            body.tools.len()
        );

        let response = self
            .client
            .post(self.api_endpoint("v1/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Anthropic request failed: {}", e);
                if e.is_timeout() {
                    FlashtutorError::Upstream("Anthropic request timed out".to_string())
                } else {
                    FlashtutorError::Upstream(format!("Anthropic request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Anthropic returned error {}: {}", status, error_text);
            return Err(FlashtutorError::Upstream(format!(
                "Anthropic returned error {}",
                status
            ))
            .into());
        }

        let parsed: AnthropicResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Anthropic response: {}", e);
            FlashtutorError::Upstream(format!("Failed to parse Anthropic response: {}", e))
        })?;

        let usage = parsed
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            });

        if let Some(usage) = &usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Anthropic usage"
            );
        }

        Ok(CompletionResponse {
            content: parsed.content,
            stop_reason: parsed.stop_reason,
            usage,
        })
    }
}
