//! Chat-completions client for verification and extraction calls.
//!
//! Each call is a single synchronous request/response with the timeout the
//! HTTP client enforces — never an open-ended conversational loop, so the
//! lookup state machine stays deterministic and testable with doubles.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use founderwiki_shared::{FounderWikiError, OpenRouterConfig, Result};

/// Request timeout for inference calls. Extraction over a long article can
/// take a while.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

/// A single chat message.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Abstraction over any chat-completions provider. The lookup pipeline only
/// ever needs one completion per call.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String>;
}

/// OpenRouter implementation (OpenAI-compatible `chat/completions`).
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenRouterClient {
    /// Build a client from config, reading the API key from the configured
    /// environment variable.
    pub fn new(config: &OpenRouterConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            FounderWikiError::config(format!(
                "environment variable {} is not set",
                config.api_key_env
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FounderWikiError::Llm(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl ChatClient for OpenRouterClient {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let api_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::System => "system",
                        Role::User => "user",
                    },
                    "content": m.content,
                })
            })
            .collect();

        let body = json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        debug!(model = %self.model, "chat completion request to {url}");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| FounderWikiError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FounderWikiError::Llm(format!("HTTP {status}: {body}")));
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FounderWikiError::Llm(format!("invalid response body: {e}")))?;

        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                FounderWikiError::Llm("missing choices[0].message.content".into())
            })?
            .to_string();

        Ok(content)
    }
}

/// Strip a wrapping Markdown code fence (``` or ```json) from model output.
///
/// Extraction responses are frequently fenced even when the prompt asks for
/// bare JSON. Text without a fence passes through unchanged.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };

    // Drop an optional language tag on the opening fence line.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim()
}
