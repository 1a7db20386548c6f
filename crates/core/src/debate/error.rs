//! Failure taxonomy shared by the dispatcher, orchestrator and reply resolver.

use thiserror::Error;

use super::generation::GenerationFailure;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";
pub const PAYMENT_REQUIRED_MESSAGE: &str = "Payment required. Please add credits.";

/// Every way a debate request can fail
#[derive(Debug, Error)]
pub enum DebateError {
    /// Missing or malformed request field; raised before any external call
    #[error("{0}")]
    Validation(String),

    /// Upstream 429; aborts a whole batch
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited { detail: String },

    /// Upstream 402; aborts a whole batch
    #[error("Payment required. Please add credits.")]
    PaymentRequired { detail: String },

    /// Non-fatal upstream failure or empty completion
    #[error(transparent)]
    Generation(GenerationFailure),

    /// Store rejected a row
    #[error("Failed to persist response: {0:#}")]
    Persistence(anyhow::Error),

    /// Required configuration absent at startup
    #[error("{0}")]
    Configuration(String),

    #[error("{0:#}")]
    Unknown(anyhow::Error),
}

impl DebateError {
    /// HTTP status the failure is reported with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RateLimited { .. } => 429,
            Self::PaymentRequired { .. } => 402,
            _ => 500,
        }
    }

    /// Short tag for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::RateLimited { .. } => "rate_limited",
            Self::PaymentRequired { .. } => "payment_required",
            Self::Generation(GenerationFailure::EmptyCompletion) => "empty_completion",
            Self::Generation(_) => "generation_failed",
            Self::Persistence(_) => "persistence",
            Self::Configuration(_) => "configuration",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<GenerationFailure> for DebateError {
    fn from(failure: GenerationFailure) -> Self {
        match failure {
            GenerationFailure::RateLimited { message } => Self::RateLimited { detail: message },
            GenerationFailure::PaymentRequired { message } => {
                Self::PaymentRequired { detail: message }
            }
            other => Self::Generation(other),
        }
    }
}
