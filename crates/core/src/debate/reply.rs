//! # Reply Resolver
//!
//! Answers one existing response with a single AI reply threaded under it.
//! Unlike the orchestrator this path is strict: any failure is returned and
//! nothing is written.

use super::error::DebateError;
use super::generation::TextGenerator;
use super::prompts;
use super::viewpoint::Viewpoint;
use crate::state::{NewResponse, Response, ResponseStore};

/// The response being answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub idea_id: String,
    pub parent_response_id: String,
    pub parent_content: String,
    pub parent_viewpoint: Viewpoint,
}

impl ReplyTarget {
    /// Viewpoint the reply is written from
    pub fn reply_viewpoint(&self) -> Viewpoint {
        self.parent_viewpoint.opposite()
    }
}

pub struct ReplyResolver<'a> {
    generator: &'a dyn TextGenerator,
    store: &'a dyn ResponseStore,
}

impl<'a> ReplyResolver<'a> {
    pub fn new(generator: &'a dyn TextGenerator, store: &'a dyn ResponseStore) -> Self {
        Self { generator, store }
    }

    /// Generate and persist exactly one reply
    #[tracing::instrument(
        skip(self, target),
        fields(idea_id = %target.idea_id, parent = %target.parent_response_id)
    )]
    pub async fn run(&self, target: &ReplyTarget) -> Result<Response, DebateError> {
        let viewpoint = target.reply_viewpoint();
        let system_prompt = prompts::reply_prompt(target.parent_viewpoint);
        let user_content = prompts::reply_message(&target.parent_content);

        tracing::info!(%viewpoint, "Generating reply");

        let completion = self
            .generator
            .generate(&system_prompt, &user_content)
            .await
            .map_err(|failure| {
                tracing::error!(
                    %viewpoint,
                    status = ?failure.status_code(),
                    error = %failure,
                    "Reply generation failed"
                );
                DebateError::from(failure)
            })?;

        let row = NewResponse::ai(&target.idea_id, viewpoint, completion)
            .with_parent(&target.parent_response_id);

        let response = self.store.insert_response(row).map_err(|e| {
            tracing::error!(%viewpoint, error = %e, "Failed to insert reply");
            DebateError::Persistence(e)
        })?;

        tracing::info!(%viewpoint, response_id = %response.id, "Reply persisted");
        Ok(response)
    }
}
