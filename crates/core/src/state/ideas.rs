//! # Idea Storage
//!
//! Ideas are posted once by a human and never modified afterwards.

use super::db::DebateDb;
use super::{now, parse_timestamp, timestamp};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::debate::events::{DebateEvent, DebateEventKind};

/// Author shown when none was given
pub const ANONYMOUS_AUTHOR: &str = "Anónimo";

/// A user-submitted debate topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Idea {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when posting an idea
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewIdea {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author_name: Option<String>,
}

/// SQLite-backed idea manager
pub struct IdeaManager {
    conn: Arc<Mutex<Connection>>,
    events: broadcast::Sender<DebateEvent>,
}

const IDEA_COLUMNS: &str = "id, title, content, author_name, created_at, updated_at";

impl IdeaManager {
    /// Create from shared DebateDb connection
    pub fn new(db: &DebateDb) -> Self {
        Self {
            conn: db.connection(),
            events: db.event_sender(),
        }
    }

    /// Post a new idea; title and content are trimmed and required
    pub fn create(&self, new: NewIdea) -> Result<Idea> {
        let title = new.title.trim();
        let content = new.content.trim();
        if title.is_empty() || content.is_empty() {
            anyhow::bail!("Idea title and content are required");
        }
        let author_name = new
            .author_name
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(ANONYMOUS_AUTHOR);

        let created = now();
        let idea = Idea {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            author_name: author_name.to_string(),
            created_at: created,
            updated_at: created,
        };

        {
            let conn = self
                .conn
                .lock()
                .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

            conn.execute(
                r#"
                INSERT INTO ideas (id, title, content, author_name, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    idea.id,
                    idea.title,
                    idea.content,
                    idea.author_name,
                    timestamp(&idea.created_at),
                    timestamp(&idea.updated_at),
                ],
            )
            .context("Failed to create idea")?;
        }

        let _ = self.events.send(
            DebateEvent::new(DebateEventKind::IdeaCreated, &idea.id)
                .with_data(serde_json::to_value(&idea)?),
        );
        tracing::info!(idea_id = %idea.id, "Idea created");

        Ok(idea)
    }

    /// All ideas, newest first
    pub fn list(&self) -> Result<Vec<Idea>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM ideas ORDER BY created_at DESC, rowid DESC",
            IDEA_COLUMNS
        ))?;

        let ideas = stmt
            .query_map([], idea_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list ideas")?;

        Ok(ideas)
    }

    /// Look up an idea, `None` when it does not exist
    pub fn find(&self, id: &str) -> Result<Option<Idea>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        conn.query_row(
            &format!("SELECT {} FROM ideas WHERE id = ?1", IDEA_COLUMNS),
            params![id],
            idea_from_row,
        )
        .optional()
        .context("Failed to load idea")
    }

    /// Load a specific idea
    pub fn load(&self, id: &str) -> Result<Idea> {
        self.find(id)?
            .with_context(|| format!("Idea '{}' not found", id))
    }
}

fn idea_from_row(row: &Row<'_>) -> rusqlite::Result<Idea> {
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    Ok(Idea {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        author_name: row.get(3)?,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}
