//! # Debate Events
//!
//! Change notifications published by the store after each insert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of debate event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DebateEventKind {
    /// A new idea was posted
    IdeaCreated,
    /// A response (human or AI) was persisted
    ResponseCreated,
}

impl DebateEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdeaCreated => "idea_created",
            Self::ResponseCreated => "response_created",
        }
    }
}

/// An event in the debate store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateEvent {
    /// Unique event ID
    pub id: String,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Kind of event
    pub kind: DebateEventKind,
    /// Idea the event belongs to
    pub idea_id: String,
    /// The inserted row (JSON)
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl DebateEvent {
    pub fn new(kind: DebateEventKind, idea_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            idea_id: idea_id.to_string(),
            data: None,
        }
    }

    /// Attach the inserted row
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
