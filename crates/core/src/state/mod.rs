pub mod db;
pub mod ideas;
pub mod responses;

pub use db::{DebateDb, DEFAULT_DB_PATH};

pub use ideas::{Idea, IdeaManager, NewIdea, ANONYMOUS_AUTHOR};
pub use responses::{
    build_thread, NewResponse, Response, ResponseManager, ResponseNode, ViewpointTally,
    DEFAULT_HUMAN_AUTHOR,
};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Where generated responses are written.
///
/// The orchestrator and reply resolver only ever insert; each insert is
/// atomic on its own and nothing spans several rows.
pub trait ResponseStore: Send + Sync {
    fn insert_response(&self, response: NewResponse) -> anyhow::Result<Response>;
}

impl ResponseStore for DebateDb {
    fn insert_response(&self, response: NewResponse) -> anyhow::Result<Response> {
        ResponseManager::new(self).insert(response)
    }
}

/// Current time at the precision rows are stored with
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so text ordering matches time ordering
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
