//! # Agora Core
//!
//! Business logic for Agora: ideas, threaded responses, and the AI debate
//! generation that seeds and extends them.
//!
//! ## Architecture
//!
//! - `debate/` - Dispatcher, viewpoint orchestrator, reply resolver, generation client
//! - `models` - Generation gateway configuration
//! - `state/` - SQLite storage for ideas and responses
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agora_core::debate::{DebateRequestBody, DebateService};
//! use agora_core::state::DebateDb;
//!
//! let db = DebateDb::open()?;
//! let service = DebateService::from_env(Arc::new(db.clone()));
//! let report = service.handle(body).await?;
//! ```

pub mod debate;
pub mod models;
pub mod state;
