//! # Agora Models
//!
//! Configuration for the AI gateway that produces debate text.
//! The gateway speaks the OpenAI-compatible chat completions protocol.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable holding the gateway credential (required)
pub const API_KEY_VAR: &str = "AI_GATEWAY_API_KEY";
/// Environment variable overriding the completions endpoint
pub const ENDPOINT_VAR: &str = "AI_GATEWAY_URL";
/// Environment variable overriding the model name
pub const MODEL_VAR: &str = "AI_GATEWAY_MODEL";

pub const DEFAULT_ENDPOINT: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

/// Connection settings for the text-generation service
///
/// ## Example
/// ```rust,ignore
/// use agora_core::models::GatewayConfig;
///
/// let config = GatewayConfig::from_env()?;
/// let config = GatewayConfig::new("sk-test").with_model("openai/gpt-4o-mini");
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Full URL of the chat completions endpoint
    pub endpoint: String,
    /// Model name sent with every request
    pub model: String,
    /// Bearer credential
    #[serde(skip_serializing)]
    pub api_key: String,
}

impl GatewayConfig {
    /// Config for the default endpoint and model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Load from process environment.
    ///
    /// Fails when the credential is absent or blank; endpoint and model fall
    /// back to their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_blank(API_KEY_VAR)
            .ok_or_else(|| anyhow::anyhow!("{} is not configured", API_KEY_VAR))?;

        let mut config = Self::new(api_key.trim());
        if let Some(endpoint) = non_blank(ENDPOINT_VAR) {
            config = config.with_endpoint(endpoint.trim());
        }
        if let Some(model) = non_blank(MODEL_VAR) {
            config = config.with_model(model.trim());
        }
        Ok(config)
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
