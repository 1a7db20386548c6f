//! Router fixtures for handler tests.

use agora_core::debate::{DebateService, GenerationFailure, TextGenerator};
use agora_core::state::{DebateDb, IdeaManager, NewIdea};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{router, AppState, SharedState};

/// Replays queued results; succeeds with a fixed text once the queue is empty
#[derive(Default)]
pub struct CannedGenerator {
    script: Mutex<VecDeque<Result<String, GenerationFailure>>>,
    calls: Mutex<usize>,
}

impl CannedGenerator {
    pub fn new(script: Vec<Result<String, GenerationFailure>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(
        &self,
        _system_prompt: &str,
        _user_content: &str,
    ) -> Result<String, GenerationFailure> {
        *self.calls.lock().unwrap() += 1;
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Argumento generado".to_string()))
    }
}

/// Router over a fresh in-memory database
pub fn test_app(
    script: Vec<Result<String, GenerationFailure>>,
) -> (Router, SharedState, Arc<CannedGenerator>) {
    let db = DebateDb::open_in_memory().unwrap();
    let generator = Arc::new(CannedGenerator::new(script));
    let service = DebateService::new(generator.clone(), Arc::new(db.clone()));
    let state = AppState::new(db, service);
    (router(state.clone()), state, generator)
}

/// Router whose generation gateway has no credential
pub fn unconfigured_app() -> (Router, SharedState) {
    let db = DebateDb::open_in_memory().unwrap();
    let service =
        DebateService::unconfigured("AI_GATEWAY_API_KEY is not configured", Arc::new(db.clone()));
    let state = AppState::new(db, service);
    (router(state.clone()), state)
}

pub fn seed_idea(state: &SharedState) -> String {
    IdeaManager::new(&state.db)
        .create(NewIdea {
            title: "X".to_string(),
            content: "Y".to_string(),
            author_name: None,
        })
        .unwrap()
        .id
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub async fn read_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
