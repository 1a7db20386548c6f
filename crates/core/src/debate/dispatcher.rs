//! # Dispatcher
//!
//! Turns the loosely-typed request payload into a [`DebateRequest`] and runs
//! it. Validation happens entirely before any generation call or write.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::DebateError;
use super::generation::{GatewayClient, TextGenerator};
use super::orchestrator::{DebateOutcome, IdeaSeed, ViewpointOrchestrator};
use super::reply::{ReplyResolver, ReplyTarget};
use super::viewpoint::Viewpoint;
use crate::models::GatewayConfig;
use crate::state::{Response, ResponseStore};

pub const MISSING_INITIAL_FIELDS: &str = "Missing required fields: ideaId, ideaTitle, ideaContent";
pub const MISSING_REPLY_FIELDS: &str =
    "Missing required fields: ideaId, parentResponseId, parentContent, parentViewpoint";

/// Request payload as sent by browser callers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateRequestBody {
    #[serde(default)]
    pub idea_id: Option<String>,
    #[serde(default)]
    pub idea_title: Option<String>,
    #[serde(default)]
    pub idea_content: Option<String>,
    #[serde(default)]
    pub parent_response_id: Option<String>,
    #[serde(default)]
    pub parent_content: Option<String>,
    #[serde(default)]
    pub parent_viewpoint: Option<String>,
    #[serde(default)]
    pub is_reply: Option<bool>,
}

/// A validated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebateRequest {
    /// Generate the three opening viewpoints for an idea
    Initial(IdeaSeed),
    /// Answer one existing response
    Reply(ReplyTarget),
}

impl TryFrom<DebateRequestBody> for DebateRequest {
    type Error = DebateError;

    fn try_from(body: DebateRequestBody) -> Result<Self, Self::Error> {
        let idea_id = present(body.idea_id);
        let parent_response_id = present(body.parent_response_id);
        let parent_content = present(body.parent_content);

        let wants_reply = body.is_reply == Some(true)
            && parent_response_id.is_some()
            && parent_content.is_some();

        if wants_reply {
            let (Some(idea_id), Some(parent_response_id), Some(parent_content), Some(viewpoint)) = (
                idea_id,
                parent_response_id,
                parent_content,
                present(body.parent_viewpoint),
            ) else {
                return Err(DebateError::Validation(MISSING_REPLY_FIELDS.to_string()));
            };

            let parent_viewpoint = viewpoint
                .parse::<Viewpoint>()
                .map_err(|e| DebateError::Validation(e.to_string()))?;

            return Ok(Self::Reply(ReplyTarget {
                idea_id,
                parent_response_id,
                parent_content,
                parent_viewpoint,
            }));
        }

        match (idea_id, present(body.idea_title), present(body.idea_content)) {
            (Some(idea_id), Some(title), Some(content)) => Ok(Self::Initial(IdeaSeed {
                idea_id,
                title,
                content,
            })),
            _ => Err(DebateError::Validation(MISSING_INITIAL_FIELDS.to_string())),
        }
    }
}

/// Blank strings count as absent
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// What a successful request produced
#[derive(Debug, Clone)]
pub enum DebateReport {
    Generated(DebateOutcome),
    Reply(Response),
}

/// Entry point shared by the HTTP handlers and the CLI
#[derive(Clone)]
pub struct DebateService {
    generator: Result<Arc<dyn TextGenerator>, String>,
    store: Arc<dyn ResponseStore>,
}

impl DebateService {
    pub fn new(generator: Arc<dyn TextGenerator>, store: Arc<dyn ResponseStore>) -> Self {
        Self {
            generator: Ok(generator),
            store,
        }
    }

    /// A service whose generation requests all fail with `reason`
    pub fn unconfigured(reason: impl Into<String>, store: Arc<dyn ResponseStore>) -> Self {
        Self {
            generator: Err(reason.into()),
            store,
        }
    }

    /// Build the gateway client from the environment.
    ///
    /// A missing credential is not an error here; it is reported on every
    /// request that reaches generation.
    pub fn from_env(store: Arc<dyn ResponseStore>) -> Self {
        match GatewayConfig::from_env() {
            Ok(config) => {
                tracing::info!(endpoint = %config.endpoint, model = %config.model, "Generation gateway configured");
                Self::new(Arc::new(GatewayClient::new(config)), store)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Generation gateway not configured");
                Self::unconfigured(e.to_string(), store)
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_ok()
    }

    /// Validate a raw payload and run it
    pub async fn handle(&self, body: DebateRequestBody) -> Result<DebateReport, DebateError> {
        let request = DebateRequest::try_from(body)
            .inspect_err(|e| tracing::warn!(error = %e, "Rejected debate request"))?;
        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: DebateRequest) -> Result<DebateReport, DebateError> {
        match request {
            DebateRequest::Initial(seed) => self.generate_for(&seed).await.map(DebateReport::Generated),
            DebateRequest::Reply(target) => {
                let generator = self.generator()?;
                ReplyResolver::new(generator, self.store.as_ref())
                    .run(&target)
                    .await
                    .map(DebateReport::Reply)
            }
        }
    }

    /// Run the orchestrator for an already-validated idea
    pub async fn generate_for(&self, seed: &IdeaSeed) -> Result<DebateOutcome, DebateError> {
        let generator = self.generator()?;
        ViewpointOrchestrator::new(generator, self.store.as_ref())
            .run(seed)
            .await
    }

    fn generator(&self) -> Result<&dyn TextGenerator, DebateError> {
        self.generator
            .as_ref()
            .map(Arc::as_ref)
            .map_err(|reason| DebateError::Configuration(reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::testing::{db_with_idea, rate_limited, ScriptedGenerator};
    use crate::state::{DebateDb, NewResponse, ResponseManager};

    fn service(db: &DebateDb, generator: Arc<ScriptedGenerator>) -> DebateService {
        DebateService::new(generator, Arc::new(db.clone()))
    }

    fn body(json: serde_json::Value) -> DebateRequestBody {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_initial_request_is_parsed() {
        let request = DebateRequest::try_from(body(serde_json::json!({
            "ideaId": "id1",
            "ideaTitle": "X",
            "ideaContent": "Y"
        })))
        .unwrap();

        assert_eq!(
            request,
            DebateRequest::Initial(IdeaSeed {
                idea_id: "id1".to_string(),
                title: "X".to_string(),
                content: "Y".to_string(),
            })
        );
    }

    #[test]
    fn test_reply_request_needs_only_idea_id() {
        let request = DebateRequest::try_from(body(serde_json::json!({
            "ideaId": "id1",
            "parentResponseId": "r1",
            "parentContent": "...",
            "parentViewpoint": "favor",
            "isReply": true
        })))
        .unwrap();

        match request {
            DebateRequest::Reply(target) => {
                assert_eq!(target.parent_response_id, "r1");
                assert_eq!(target.parent_viewpoint, Viewpoint::Favor);
            }
            other => panic!("expected reply, got {:?}", other),
        }
    }

    #[test]
    fn test_reply_flag_without_parent_falls_back_to_initial() {
        let err = DebateRequest::try_from(body(serde_json::json!({
            "ideaId": "id1",
            "isReply": true
        })))
        .unwrap_err();

        assert_eq!(err.to_string(), MISSING_INITIAL_FIELDS);
    }

    #[test]
    fn test_missing_idea_id_in_either_mode() {
        let initial = DebateRequest::try_from(body(serde_json::json!({
            "ideaTitle": "X",
            "ideaContent": "Y"
        })))
        .unwrap_err();
        assert_eq!(initial.to_string(), MISSING_INITIAL_FIELDS);

        let reply = DebateRequest::try_from(body(serde_json::json!({
            "parentResponseId": "r1",
            "parentContent": "...",
            "parentViewpoint": "favor",
            "isReply": true
        })))
        .unwrap_err();
        assert_eq!(reply.to_string(), MISSING_REPLY_FIELDS);
        assert_eq!(reply.kind(), "validation");
    }

    #[test]
    fn test_blank_fields_count_as_missing() {
        let err = DebateRequest::try_from(body(serde_json::json!({
            "ideaId": "id1",
            "ideaTitle": "   ",
            "ideaContent": "Y"
        })))
        .unwrap_err();

        assert_eq!(err.to_string(), MISSING_INITIAL_FIELDS);
    }

    #[test]
    fn test_unknown_parent_viewpoint_is_rejected() {
        let err = DebateRequest::try_from(body(serde_json::json!({
            "ideaId": "id1",
            "parentResponseId": "r1",
            "parentContent": "...",
            "parentViewpoint": "maybe",
            "isReply": true
        })))
        .unwrap_err();

        assert_eq!(err.to_string(), "Invalid viewpoint: maybe");
    }

    #[tokio::test]
    async fn test_validation_failure_makes_no_calls() {
        let (db, idea_id) = db_with_idea();
        let generator = Arc::new(ScriptedGenerator::always_ok(3));

        let err = service(&db, generator.clone())
            .handle(body(serde_json::json!({ "ideaId": idea_id })))
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("Missing required fields"));
        assert_eq!(err.status_code(), 500);
        assert_eq!(generator.call_count(), 0);
        assert!(ResponseManager::new(&db).list_for_idea(&idea_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_initial_request_runs_orchestrator() {
        let (db, idea_id) = db_with_idea();
        let generator = Arc::new(ScriptedGenerator::always_ok(3));

        let report = service(&db, generator.clone())
            .handle(body(serde_json::json!({
                "ideaId": idea_id,
                "ideaTitle": "X",
                "ideaContent": "Y"
            })))
            .await
            .unwrap();

        match report {
            DebateReport::Generated(outcome) => assert_eq!(outcome.persisted_count(), 3),
            other => panic!("expected generated, got {:?}", other),
        }
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_reply_request_runs_resolver() {
        let (db, idea_id) = db_with_idea();
        let parent = ResponseManager::new(&db)
            .insert(NewResponse::ai(&idea_id, Viewpoint::Favor, "Sí"))
            .unwrap();
        let generator = Arc::new(ScriptedGenerator::always_ok(1));

        let report = service(&db, generator)
            .handle(body(serde_json::json!({
                "ideaId": idea_id,
                "parentResponseId": parent.id,
                "parentContent": parent.content,
                "parentViewpoint": "favor",
                "isReply": true
            })))
            .await
            .unwrap();

        match report {
            DebateReport::Reply(reply) => {
                assert_eq!(reply.viewpoint, Viewpoint::Contra);
                assert_eq!(reply.parent_response_id, Some(parent.id));
            }
            other => panic!("expected reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fatal_status_surfaces_from_dispatch() {
        let (db, idea_id) = db_with_idea();
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(rate_limited())]));

        let err = service(&db, generator)
            .dispatch(DebateRequest::Initial(IdeaSeed {
                idea_id,
                title: "X".to_string(),
                content: "Y".to_string(),
            }))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 429);
    }

    #[tokio::test]
    async fn test_unconfigured_service_fails_after_validation() {
        let (db, idea_id) = db_with_idea();
        let service = DebateService::unconfigured(
            "AI_GATEWAY_API_KEY is not configured",
            Arc::new(db.clone()),
        );
        assert!(!service.is_configured());

        let invalid = service
            .handle(body(serde_json::json!({ "ideaId": idea_id })))
            .await
            .unwrap_err();
        assert_eq!(invalid.kind(), "validation");

        let unconfigured = service
            .handle(body(serde_json::json!({
                "ideaId": idea_id,
                "ideaTitle": "X",
                "ideaContent": "Y"
            })))
            .await
            .unwrap_err();
        assert_eq!(unconfigured.kind(), "configuration");
        assert_eq!(unconfigured.status_code(), 500);
        assert_eq!(unconfigured.to_string(), "AI_GATEWAY_API_KEY is not configured");
    }
}
