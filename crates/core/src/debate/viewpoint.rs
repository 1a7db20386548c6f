//! # Viewpoints
//!
//! The three stances a response can take in a debate, plus the persona
//! names AI-authored responses are published under.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::prompts;

/// Stance of a response towards its idea
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Viewpoint {
    /// Argues for the idea
    Favor,
    /// Argues against the idea
    Contra,
    /// Weighs both sides
    Neutral,
}

/// Raised when a string is not one of `favor`, `contra`, `neutral`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid viewpoint: {0}")]
pub struct ParseViewpointError(pub String);

impl Viewpoint {
    /// Canonical generation order
    pub const ALL: [Viewpoint; 3] = [Viewpoint::Favor, Viewpoint::Contra, Viewpoint::Neutral];

    /// The stance a reply takes against a response with this viewpoint.
    ///
    /// Favor and contra swap; neutral stays neutral.
    pub fn opposite(self) -> Self {
        match self {
            Self::Favor => Self::Contra,
            Self::Contra => Self::Favor,
            Self::Neutral => Self::Neutral,
        }
    }

    /// Display name for AI responses with this viewpoint
    pub fn persona(self) -> &'static str {
        prompts::persona_for(self).persona
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Favor => "favor",
            Self::Contra => "contra",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Viewpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Viewpoint {
    type Err = ParseViewpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favor" => Ok(Self::Favor),
            "contra" => Ok(Self::Contra),
            "neutral" => Ok(Self::Neutral),
            other => Err(ParseViewpointError(other.to_string())),
        }
    }
}
