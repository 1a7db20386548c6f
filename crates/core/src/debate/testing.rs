//! Test doubles for the generation and persistence seams.

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use super::generation::{GenerationFailure, TextGenerator};
use super::viewpoint::Viewpoint;
use crate::state::{DebateDb, IdeaManager, NewIdea, NewResponse, Response, ResponseStore};

/// Replays queued results in call order and records every call
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GenerationFailure>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, GenerationFailure>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds with a distinct text
    pub fn always_ok(count: usize) -> Self {
        Self::new((0..count).map(|i| Ok(format!("respuesta {}", i + 1))).collect())
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, GenerationFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_content.to_string()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GenerationFailure::Upstream {
                status: None,
                message: "script exhausted".to_string(),
            }))
    }
}

/// Real in-memory store that can be told to reject given viewpoints
pub struct FlakyStore {
    pub db: DebateDb,
    reject: HashSet<Viewpoint>,
}

impl FlakyStore {
    pub fn rejecting(reject: &[Viewpoint]) -> Self {
        Self {
            db: DebateDb::open_in_memory().unwrap(),
            reject: reject.iter().copied().collect(),
        }
    }
}

impl ResponseStore for FlakyStore {
    fn insert_response(&self, response: NewResponse) -> anyhow::Result<Response> {
        if self.reject.contains(&response.viewpoint) {
            anyhow::bail!("simulated write failure for {}", response.viewpoint);
        }
        self.db.insert_response(response)
    }
}

/// Fresh in-memory database with one idea
pub fn db_with_idea() -> (DebateDb, String) {
    let db = DebateDb::open_in_memory().unwrap();
    let idea = IdeaManager::new(&db)
        .create(NewIdea {
            title: "X".to_string(),
            content: "Y".to_string(),
            author_name: None,
        })
        .unwrap();
    (db, idea.id)
}

pub fn rate_limited() -> GenerationFailure {
    GenerationFailure::from_status(429, "quota exhausted")
}

pub fn payment_required() -> GenerationFailure {
    GenerationFailure::from_status(402, "billing blocked")
}

pub fn server_error() -> GenerationFailure {
    GenerationFailure::from_status(500, "internal error")
}
