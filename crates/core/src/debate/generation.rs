//! # Generation Client
//!
//! One call to the text-generation service: system instruction plus user
//! content in, completion text or a classified failure out. No retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::GatewayConfig;

/// Why a generation call produced no usable text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    /// Upstream answered 429
    #[error("upstream rate limited: {message}")]
    RateLimited { message: String },
    /// Upstream answered 402
    #[error("upstream payment required: {message}")]
    PaymentRequired { message: String },
    /// Any other non-2xx answer, a transport error (`status` is `None`),
    /// or an undecodable success body
    #[error("upstream generation failed: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },
    /// 2xx with an empty or missing completion
    #[error("upstream returned an empty completion")]
    EmptyCompletion,
}

impl GenerationFailure {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        match status {
            429 => Self::RateLimited { message },
            402 => Self::PaymentRequired { message },
            _ => Self::Upstream {
                status: Some(status),
                message,
            },
        }
    }

    /// Raw upstream status, when one was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::PaymentRequired { .. } => Some(402),
            Self::Upstream { status, .. } => *status,
            Self::EmptyCompletion => None,
        }
    }

    /// Fatal classes fail identically for every remaining call in a burst
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::PaymentRequired { .. })
    }
}

/// Produces completion text for a (system prompt, user content) pair
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, GenerationFailure>;
}

/// Client for an OpenAI-compatible chat completions gateway
pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Reuse an existing reqwest client (connection pool, proxies, timeouts)
    pub fn with_client(config: GatewayConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[async_trait]
impl TextGenerator for GatewayClient {
    async fn generate(
        &self,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, GenerationFailure> {
        if system_prompt.trim().is_empty() || user_content.trim().is_empty() {
            return Err(GenerationFailure::Upstream {
                status: None,
                message: "system prompt and user content must be non-empty".to_string(),
            });
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_failure)?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %body, "AI gateway error");
            return Err(GenerationFailure::from_status(status.as_u16(), body));
        }

        extract_completion(status.as_u16(), &body)
    }
}

fn transport_failure(err: reqwest::Error) -> GenerationFailure {
    GenerationFailure::Upstream {
        status: err.status().map(|s| s.as_u16()),
        message: err.to_string(),
    }
}

/// Pull `choices[0].message.content` out of a success body
pub(crate) fn extract_completion(status: u16, body: &str) -> Result<String, GenerationFailure> {
    let completion: ChatCompletion =
        serde_json::from_str(body).map_err(|e| GenerationFailure::Upstream {
            status: Some(status),
            message: format!("invalid completion payload: {}", e),
        })?;

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(GenerationFailure::EmptyCompletion)
}
