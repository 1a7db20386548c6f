//! # Response Storage
//!
//! Responses are append-only. A response may hang under another response of
//! the same idea, so each idea's responses form a forest of reply threads.

use super::db::DebateDb;
use super::{now, parse_timestamp, timestamp};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::debate::events::{DebateEvent, DebateEventKind};
use crate::debate::viewpoint::Viewpoint;

/// Author shown for human responses posted without a name
pub const DEFAULT_HUMAN_AUTHOR: &str = "Usuario";

/// A human or AI contribution to an idea's debate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub id: String,
    pub idea_id: String,
    pub content: String,
    pub viewpoint: Viewpoint,
    pub is_ai: bool,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub parent_response_id: Option<String>,
}

/// Row to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewResponse {
    pub idea_id: String,
    pub content: String,
    pub viewpoint: Viewpoint,
    pub is_ai: bool,
    pub author_name: String,
    pub parent_response_id: Option<String>,
}

impl NewResponse {
    /// AI-authored response, published under the viewpoint's persona
    pub fn ai(idea_id: &str, viewpoint: Viewpoint, content: impl Into<String>) -> Self {
        Self {
            idea_id: idea_id.to_string(),
            content: content.into(),
            viewpoint,
            is_ai: true,
            author_name: viewpoint.persona().to_string(),
            parent_response_id: None,
        }
    }

    /// Human-authored response; blank authors become [`DEFAULT_HUMAN_AUTHOR`]
    pub fn human(
        idea_id: &str,
        viewpoint: Viewpoint,
        content: impl Into<String>,
        author_name: Option<&str>,
    ) -> Self {
        let author_name = author_name
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_HUMAN_AUTHOR);
        Self {
            idea_id: idea_id.to_string(),
            content: content.into(),
            viewpoint,
            is_ai: false,
            author_name: author_name.to_string(),
            parent_response_id: None,
        }
    }

    /// Thread under an existing response
    pub fn with_parent(mut self, parent_response_id: impl Into<String>) -> Self {
        self.parent_response_id = Some(parent_response_id.into());
        self
    }
}

/// A response together with its replies
#[derive(Debug, Clone, Serialize)]
pub struct ResponseNode {
    #[serde(flatten)]
    pub response: Response,
    pub replies: Vec<ResponseNode>,
}

/// Response count per viewpoint
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewpointTally {
    pub favor: u32,
    pub contra: u32,
    pub neutral: u32,
}

impl ViewpointTally {
    pub fn total(&self) -> u32 {
        self.favor + self.contra + self.neutral
    }

    fn add(&mut self, viewpoint: Viewpoint, count: u32) {
        match viewpoint {
            Viewpoint::Favor => self.favor += count,
            Viewpoint::Contra => self.contra += count,
            Viewpoint::Neutral => self.neutral += count,
        }
    }
}

/// SQLite-backed response manager
pub struct ResponseManager {
    conn: Arc<Mutex<Connection>>,
    events: broadcast::Sender<DebateEvent>,
}

const RESPONSE_COLUMNS: &str =
    "id, idea_id, content, viewpoint, is_ai, author_name, created_at, parent_response_id";

impl ResponseManager {
    /// Create from shared DebateDb connection
    pub fn new(db: &DebateDb) -> Self {
        Self {
            conn: db.connection(),
            events: db.event_sender(),
        }
    }

    /// Persist one response.
    ///
    /// Fails when the content is blank, the idea does not exist, or the parent
    /// response is missing or belongs to a different idea.
    pub fn insert(&self, new: NewResponse) -> Result<Response> {
        let content = new.content.trim();
        if content.is_empty() {
            anyhow::bail!("Response content must not be empty");
        }

        let response = Response {
            id: uuid::Uuid::new_v4().to_string(),
            idea_id: new.idea_id,
            content: content.to_string(),
            viewpoint: new.viewpoint,
            is_ai: new.is_ai,
            author_name: new.author_name,
            created_at: now(),
            parent_response_id: new.parent_response_id,
        };

        {
            let conn = self
                .conn
                .lock()
                .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

            if let Some(parent_id) = &response.parent_response_id {
                let parent_idea: Option<String> = conn
                    .query_row(
                        "SELECT idea_id FROM responses WHERE id = ?1",
                        params![parent_id],
                        |row| row.get(0),
                    )
                    .optional()?;

                match parent_idea {
                    None => anyhow::bail!("Parent response '{}' not found", parent_id),
                    Some(idea_id) if idea_id != response.idea_id => anyhow::bail!(
                        "Parent response '{}' belongs to idea '{}', not '{}'",
                        parent_id,
                        idea_id,
                        response.idea_id
                    ),
                    Some(_) => {}
                }
            }

            conn.execute(
                r#"
                INSERT INTO responses
                (id, idea_id, content, viewpoint, is_ai, author_name, created_at, parent_response_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    response.id,
                    response.idea_id,
                    response.content,
                    response.viewpoint.as_str(),
                    response.is_ai,
                    response.author_name,
                    timestamp(&response.created_at),
                    response.parent_response_id,
                ],
            )
            .with_context(|| format!("Failed to insert response for idea '{}'", response.idea_id))?;
        }

        let _ = self.events.send(
            DebateEvent::new(DebateEventKind::ResponseCreated, &response.idea_id)
                .with_data(serde_json::to_value(&response)?),
        );

        Ok(response)
    }

    /// All responses of an idea, oldest first
    pub fn list_for_idea(&self, idea_id: &str) -> Result<Vec<Response>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM responses WHERE idea_id = ?1 ORDER BY created_at ASC, rowid ASC",
            RESPONSE_COLUMNS
        ))?;

        let responses = stmt
            .query_map(params![idea_id], response_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list responses")?;

        Ok(responses)
    }

    /// Look up a response, `None` when it does not exist
    pub fn find(&self, id: &str) -> Result<Option<Response>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        conn.query_row(
            &format!("SELECT {} FROM responses WHERE id = ?1", RESPONSE_COLUMNS),
            params![id],
            response_from_row,
        )
        .optional()
        .context("Failed to load response")
    }

    /// Responses of an idea arranged as reply threads
    pub fn thread(&self, idea_id: &str) -> Result<Vec<ResponseNode>> {
        Ok(build_thread(self.list_for_idea(idea_id)?))
    }

    /// Count responses per viewpoint
    pub fn tally(&self, idea_id: &str) -> Result<ViewpointTally> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT viewpoint, COUNT(*) FROM responses WHERE idea_id = ?1 GROUP BY viewpoint",
        )?;
        let rows = stmt.query_map(params![idea_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;

        let mut tally = ViewpointTally::default();
        for row in rows {
            let (viewpoint, count) = row?;
            tally.add(viewpoint.parse()?, count);
        }
        Ok(tally)
    }
}

/// Arrange responses (in display order) into a forest rooted at top-level responses
pub fn build_thread(responses: Vec<Response>) -> Vec<ResponseNode> {
    let mut children: HashMap<Option<String>, Vec<Response>> = HashMap::new();
    for response in responses {
        children
            .entry(response.parent_response_id.clone())
            .or_default()
            .push(response);
    }
    attach(None, &mut children)
}

fn attach(
    parent: Option<String>,
    children: &mut HashMap<Option<String>, Vec<Response>>,
) -> Vec<ResponseNode> {
    children
        .remove(&parent)
        .unwrap_or_default()
        .into_iter()
        .map(|response| {
            let replies = attach(Some(response.id.clone()), children);
            ResponseNode { response, replies }
        })
        .collect()
}

fn response_from_row(row: &Row<'_>) -> rusqlite::Result<Response> {
    let viewpoint: String = row.get(3)?;
    let created_at: String = row.get(6)?;
    Ok(Response {
        id: row.get(0)?,
        idea_id: row.get(1)?,
        content: row.get(2)?,
        viewpoint: viewpoint.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        is_ai: row.get(4)?,
        author_name: row.get(5)?,
        created_at: parse_timestamp(&created_at),
        parent_response_id: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{IdeaManager, NewIdea};

    fn seeded() -> (DebateDb, String) {
        let db = DebateDb::open_in_memory().unwrap();
        let idea = IdeaManager::new(&db)
            .create(NewIdea {
                title: "Transporte gratis".to_string(),
                content: "Transporte público gratuito en la ciudad".to_string(),
                author_name: None,
            })
            .unwrap();
        (db, idea.id)
    }

    #[test]
    fn test_ai_response_uses_persona() {
        let (db, idea_id) = seeded();
        let manager = ResponseManager::new(&db);

        let response = manager
            .insert(NewResponse::ai(&idea_id, Viewpoint::Contra, "Es caro."))
            .unwrap();

        assert!(response.is_ai);
        assert_eq!(response.author_name, "IA Crítico");
        assert_eq!(response.parent_response_id, None);
        assert_eq!(manager.find(&response.id).unwrap(), Some(response));
    }

    #[test]
    fn test_human_response_defaults() {
        let (db, idea_id) = seeded();
        let manager = ResponseManager::new(&db);

        let response = manager
            .insert(NewResponse::human(&idea_id, Viewpoint::Neutral, " Depende. ", None))
            .unwrap();

        assert!(!response.is_ai);
        assert_eq!(response.author_name, DEFAULT_HUMAN_AUTHOR);
        assert_eq!(response.content, "Depende.");
    }

    #[test]
    fn test_blank_content_is_rejected() {
        let (db, idea_id) = seeded();
        let manager = ResponseManager::new(&db);

        assert!(manager
            .insert(NewResponse::ai(&idea_id, Viewpoint::Favor, "  "))
            .is_err());
        assert!(manager.list_for_idea(&idea_id).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_idea_is_rejected() {
        let (db, _) = seeded();
        let manager = ResponseManager::new(&db);

        assert!(manager
            .insert(NewResponse::ai("missing-idea", Viewpoint::Favor, "x"))
            .is_err());
    }

    #[test]
    fn test_parent_must_belong_to_same_idea() {
        let (db, idea_id) = seeded();
        let other_idea = IdeaManager::new(&db)
            .create(NewIdea {
                title: "Otra".to_string(),
                content: "Otra idea".to_string(),
                author_name: None,
            })
            .unwrap();
        let manager = ResponseManager::new(&db);

        let parent = manager
            .insert(NewResponse::ai(&idea_id, Viewpoint::Favor, "A favor"))
            .unwrap();

        let cross = manager.insert(
            NewResponse::ai(&other_idea.id, Viewpoint::Contra, "En contra").with_parent(&parent.id),
        );
        assert!(cross.is_err());

        let dangling = manager
            .insert(NewResponse::ai(&idea_id, Viewpoint::Contra, "x").with_parent("nope"));
        assert!(dangling.is_err());

        let reply = manager
            .insert(NewResponse::ai(&idea_id, Viewpoint::Contra, "En contra").with_parent(&parent.id))
            .unwrap();
        assert_eq!(reply.parent_response_id.as_deref(), Some(parent.id.as_str()));
    }

    #[test]
    fn test_list_oldest_first_and_tally() {
        let (db, idea_id) = seeded();
        let manager = ResponseManager::new(&db);

        for viewpoint in [Viewpoint::Favor, Viewpoint::Contra, Viewpoint::Neutral, Viewpoint::Favor] {
            manager
                .insert(NewResponse::ai(&idea_id, viewpoint, viewpoint.as_str()))
                .unwrap();
        }

        let contents: Vec<String> = manager
            .list_for_idea(&idea_id)
            .unwrap()
            .into_iter()
            .map(|r| r.content)
            .collect();
        assert_eq!(contents, vec!["favor", "contra", "neutral", "favor"]);

        let tally = manager.tally(&idea_id).unwrap();
        assert_eq!(
            tally,
            ViewpointTally {
                favor: 2,
                contra: 1,
                neutral: 1
            }
        );
        assert_eq!(tally.total(), 4);
    }

    #[test]
    fn test_thread_nests_replies() {
        let (db, idea_id) = seeded();
        let manager = ResponseManager::new(&db);

        let root = manager
            .insert(NewResponse::ai(&idea_id, Viewpoint::Favor, "raíz"))
            .unwrap();
        let other_root = manager
            .insert(NewResponse::ai(&idea_id, Viewpoint::Neutral, "otra raíz"))
            .unwrap();
        let reply = manager
            .insert(NewResponse::ai(&idea_id, Viewpoint::Contra, "réplica").with_parent(&root.id))
            .unwrap();
        let deeper = manager
            .insert(
                NewResponse::human(&idea_id, Viewpoint::Neutral, "contrarréplica", None)
                    .with_parent(&reply.id),
            )
            .unwrap();

        let thread = manager.thread(&idea_id).unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].response.id, root.id);
        assert_eq!(thread[1].response.id, other_root.id);
        assert_eq!(thread[0].replies.len(), 1);
        assert_eq!(thread[0].replies[0].response.id, reply.id);
        assert_eq!(thread[0].replies[0].replies[0].response.id, deeper.id);
        assert!(thread[1].replies.is_empty());
    }

    #[test]
    fn test_insert_publishes_event() {
        let (db, idea_id) = seeded();
        let mut rx = db.subscribe();

        ResponseManager::new(&db)
            .insert(NewResponse::ai(&idea_id, Viewpoint::Neutral, "Análisis"))
            .unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, DebateEventKind::ResponseCreated);
        assert_eq!(event.idea_id, idea_id);
        assert_eq!(event.data.unwrap()["viewpoint"], "neutral");
    }
}
