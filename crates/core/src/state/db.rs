//! # Debate Database
//!
//! Single SQLite database holding ideas and their responses at
//! `.agora/agora.db`. Inserts publish a [`DebateEvent`] to subscribers.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::debate::events::DebateEvent;

/// Schema version for migrations
const SCHEMA_VERSION: i32 = 1;

/// Default on-disk location
pub const DEFAULT_DB_PATH: &str = ".agora/agora.db";

const EVENT_CAPACITY: usize = 100;

/// Database manager for ideas and responses
#[derive(Clone)]
pub struct DebateDb {
    conn: Arc<Mutex<Connection>>,
    events: broadcast::Sender<DebateEvent>,
}

impl DebateDb {
    /// Open or create the database at `.agora/agora.db`
    pub fn open() -> Result<Self> {
        Self::open_at(DEFAULT_DB_PATH)
    }

    /// Open database at a specific path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {:?}", parent)
                })?;
            }
        }

        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("Failed to open debate database {:?}", path.as_ref()))?;
        Self::from_connection(conn)
    }

    /// Private in-memory database (tests, one-shot CLI runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            events,
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Get a shared connection for use by the managers
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// Subscribe to insert notifications
    pub fn subscribe(&self) -> broadcast::Receiver<DebateEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<DebateEvent> {
        self.events.clone()
    }

    /// Run schema migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
            [],
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        if current_version < 1 {
            Self::migrate_v1(&conn)?;
            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                [1],
            )?;
        }

        Ok(())
    }

    /// Migration to version 1 - ideas and threaded responses
    fn migrate_v1(conn: &Connection) -> Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS ideas (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                author_name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS responses (
                id TEXT PRIMARY KEY,
                idea_id TEXT NOT NULL REFERENCES ideas(id),
                content TEXT NOT NULL,
                viewpoint TEXT NOT NULL CHECK (viewpoint IN ('favor', 'contra', 'neutral')),
                is_ai INTEGER NOT NULL DEFAULT 0,
                author_name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                parent_response_id TEXT REFERENCES responses(id)
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_ideas_created ON ideas(created_at)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_responses_idea ON responses(idea_id, created_at)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_responses_parent ON responses(parent_response_id)",
            [],
        )?;

        tracing::info!(
            "DebateDb initialized with schema version {}",
            SCHEMA_VERSION
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(db: &DebateDb) -> Vec<String> {
        let conn = db.connection();
        let conn = conn.lock().unwrap();
        let names = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();
        names
    }

    #[test]
    fn test_open_creates_tables() {
        let db = DebateDb::open_in_memory().unwrap();
        let tables = table_names(&db);

        assert!(tables.contains(&"ideas".to_string()));
        assert!(tables.contains(&"responses".to_string()));
        assert!(tables.contains(&"schema_version".to_string()));
    }

    #[test]
    fn test_schema_version_tracking() {
        let dir = std::env::temp_dir().join(format!("agora-db-{}", uuid::Uuid::new_v4()));
        let path = dir.join("agora.db");

        // Open twice - should not fail on second open
        let db1 = DebateDb::open_at(&path).unwrap();
        drop(db1);

        let db2 = DebateDb::open_at(&path).unwrap();
        let conn = db2.connection();
        let conn = conn.lock().unwrap();

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        drop(conn);
        drop(db2);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_viewpoint_check_constraint() {
        let db = DebateDb::open_in_memory().unwrap();
        let conn = db.connection();
        let conn = conn.lock().unwrap();

        conn.execute(
            "INSERT INTO ideas (id, title, content, author_name, created_at, updated_at)
             VALUES ('i1', 't', 'c', 'a', 'now', 'now')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO responses (id, idea_id, content, viewpoint, is_ai, author_name, created_at)
             VALUES ('r1', 'i1', 'x', 'maybe', 0, 'a', 'now')",
            [],
        );
        assert!(result.is_err());
    }
}
