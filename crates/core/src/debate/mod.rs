//! # Debate Generation
//!
//! Produces AI perspectives on ideas and AI replies to existing responses.
//!
//! ## Request Flow
//!
//! ```text
//! DebateRequestBody → Dispatcher ─┬─ Initial → ViewpointOrchestrator (favor, contra, neutral)
//!                                 └─ Reply   → ReplyResolver (opposite viewpoint)
//!                                       ↓
//!                           TextGenerator → ResponseStore
//! ```

pub mod dispatcher;
pub mod error;
pub mod events;
pub mod generation;
pub mod orchestrator;
pub mod prompts;
pub mod reply;
pub mod viewpoint;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{DebateReport, DebateRequest, DebateRequestBody, DebateService};
pub use error::{DebateError, PAYMENT_REQUIRED_MESSAGE, RATE_LIMIT_MESSAGE};
pub use events::{DebateEvent, DebateEventKind};
pub use generation::{GatewayClient, GenerationFailure, TextGenerator};
pub use orchestrator::{
    AttemptOutcome, DebateOutcome, IdeaSeed, ViewpointAttempt, ViewpointOrchestrator,
    ViewpointResult,
};
pub use reply::{ReplyResolver, ReplyTarget};
pub use viewpoint::{ParseViewpointError, Viewpoint};
