//! # Viewpoint Orchestrator
//!
//! Generates the opening debate for an idea: one favor, one contra and one
//! neutral response, requested one after another in that order.
//!
//! ```text
//! favor ──▶ contra ──▶ neutral
//!   │          │          │
//!   ├ ok ──────┼──────────┼──▶ persist, continue
//!   ├ 500/empty/write error ─▶ skip, continue
//!   └ 429/402 ───────────────▶ abort (earlier rows stay)
//! ```

use serde::Serialize;
use std::ops::ControlFlow;

use super::error::DebateError;
use super::generation::{GenerationFailure, TextGenerator};
use super::prompts::{self, PersonaSpec};
use super::viewpoint::Viewpoint;
use crate::state::{NewResponse, ResponseStore};

/// The idea a debate is generated for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaSeed {
    pub idea_id: String,
    pub title: String,
    pub content: String,
}

/// Per-viewpoint entry reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewpointResult {
    pub viewpoint: Viewpoint,
    pub success: bool,
}

/// What happened to one viewpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Persisted { response_id: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewpointAttempt {
    pub viewpoint: Viewpoint,
    pub outcome: AttemptOutcome,
}

/// Accumulated result of a completed (not aborted) run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebateOutcome {
    pub attempts: Vec<ViewpointAttempt>,
}

impl DebateOutcome {
    /// Viewpoints that were generated and stored, in generation order
    pub fn responses(&self) -> Vec<ViewpointResult> {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, AttemptOutcome::Persisted { .. }))
            .map(|a| ViewpointResult {
                viewpoint: a.viewpoint,
                success: true,
            })
            .collect()
    }

    pub fn persisted_count(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, AttemptOutcome::Persisted { .. }))
            .count()
    }

    fn record(mut self, viewpoint: Viewpoint, outcome: AttemptOutcome) -> Self {
        self.attempts.push(ViewpointAttempt { viewpoint, outcome });
        self
    }
}

/// Drives the three initial generation calls for an idea
pub struct ViewpointOrchestrator<'a> {
    generator: &'a dyn TextGenerator,
    store: &'a dyn ResponseStore,
}

impl<'a> ViewpointOrchestrator<'a> {
    pub fn new(generator: &'a dyn TextGenerator, store: &'a dyn ResponseStore) -> Self {
        Self { generator, store }
    }

    /// Generate and persist up to three viewpoints.
    ///
    /// Returns `RateLimited`/`PaymentRequired` as soon as the upstream reports
    /// either; rows persisted earlier in the same run are kept. Every other
    /// failure only drops its own viewpoint.
    #[tracing::instrument(skip(self, seed), fields(idea_id = %seed.idea_id))]
    pub async fn run(&self, seed: &IdeaSeed) -> Result<DebateOutcome, DebateError> {
        let user_content = prompts::idea_message(&seed.title, &seed.content);
        let mut outcome = DebateOutcome::default();

        for entry in prompts::PERSONAS.iter() {
            outcome = match self.step(outcome, seed, entry, &user_content).await {
                ControlFlow::Continue(next) => next,
                ControlFlow::Break(failure) => {
                    tracing::error!(
                        viewpoint = %entry.viewpoint,
                        status = ?failure.status_code(),
                        "Fatal upstream status, aborting remaining viewpoints"
                    );
                    return Err(failure.into());
                }
            };
        }

        tracing::info!(
            persisted = outcome.persisted_count(),
            attempted = outcome.attempts.len(),
            "Debate generation finished"
        );
        Ok(outcome)
    }

    async fn step(
        &self,
        outcome: DebateOutcome,
        seed: &IdeaSeed,
        entry: &PersonaSpec,
        user_content: &str,
    ) -> ControlFlow<GenerationFailure, DebateOutcome> {
        tracing::info!(viewpoint = %entry.viewpoint, "Generating viewpoint");

        let completion = match self.generator.generate(entry.system_prompt, user_content).await {
            Ok(text) => text,
            Err(failure) if failure.is_fatal() => return ControlFlow::Break(failure),
            Err(failure) => {
                tracing::warn!(
                    viewpoint = %entry.viewpoint,
                    status = ?failure.status_code(),
                    error = %failure,
                    "Skipping viewpoint"
                );
                return ControlFlow::Continue(outcome.record(
                    entry.viewpoint,
                    AttemptOutcome::Skipped {
                        reason: failure.to_string(),
                    },
                ));
            }
        };

        let row = NewResponse::ai(&seed.idea_id, entry.viewpoint, completion);

        match self.store.insert_response(row) {
            Ok(response) => {
                tracing::info!(viewpoint = %entry.viewpoint, response_id = %response.id, "Viewpoint persisted");
                ControlFlow::Continue(outcome.record(
                    entry.viewpoint,
                    AttemptOutcome::Persisted {
                        response_id: response.id,
                    },
                ))
            }
            Err(e) => {
                tracing::error!(viewpoint = %entry.viewpoint, error = %e, "Failed to insert response");
                ControlFlow::Continue(outcome.record(
                    entry.viewpoint,
                    AttemptOutcome::Skipped {
                        reason: format!("{:#}", e),
                    },
                ))
            }
        }
    }
}
