//! # Debate API
//!
//! The generate-debate entry point used by browser callers.

use agora_core::debate::{DebateOutcome, DebateReport, DebateRequestBody};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ApiError, ApiResult, SharedState};

/// Initial generation: `ideaId`, `ideaTitle`, `ideaContent`.
/// Reply: `ideaId`, `parentResponseId`, `parentContent`, `parentViewpoint`, `isReply: true`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDebateRequest {
    pub idea_id: Option<String>,
    pub idea_title: Option<String>,
    pub idea_content: Option<String>,
    pub parent_response_id: Option<String>,
    pub parent_content: Option<String>,
    /// `favor`, `contra` or `neutral`
    pub parent_viewpoint: Option<String>,
    pub is_reply: Option<bool>,
}

impl From<GenerateDebateRequest> for DebateRequestBody {
    fn from(req: GenerateDebateRequest) -> Self {
        Self {
            idea_id: req.idea_id,
            idea_title: req.idea_title,
            idea_content: req.idea_content,
            parent_response_id: req.parent_response_id,
            parent_content: req.parent_content,
            parent_viewpoint: req.parent_viewpoint,
            is_reply: req.is_reply,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ViewpointStatus {
    pub viewpoint: String,
    pub success: bool,
}

/// Viewpoints generated for an idea; may hold fewer than three entries
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeneratedDebate {
    pub success: bool,
    pub responses: Vec<ViewpointStatus>,
}

impl From<&DebateOutcome> for GeneratedDebate {
    fn from(outcome: &DebateOutcome) -> Self {
        Self {
            success: true,
            responses: outcome
                .responses()
                .into_iter()
                .map(|r| ViewpointStatus {
                    viewpoint: r.viewpoint.to_string(),
                    success: r.success,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReplyCreated {
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum DebateResponse {
    Generated(GeneratedDebate),
    Reply(ReplyCreated),
}

impl From<DebateReport> for DebateResponse {
    fn from(report: DebateReport) -> Self {
        match report {
            DebateReport::Generated(outcome) => Self::Generated(GeneratedDebate::from(&outcome)),
            DebateReport::Reply(_) => Self::Reply(ReplyCreated {
                success: true,
                kind: "reply".to_string(),
            }),
        }
    }
}

/// Generate the opening debate for an idea, or one reply to a response
#[utoipa::path(
    post,
    path = "/functions/v1/generate-debate",
    tag = "debate",
    request_body = GenerateDebateRequest,
    responses(
        (status = 200, description = "Debate generated (possibly partial) or reply created", body = DebateResponse),
        (status = 402, description = "Upstream billing block, batch aborted", body = super::error::ErrorBody),
        (status = 429, description = "Upstream rate limit, batch aborted", body = super::error::ErrorBody),
        (status = 500, description = "Validation failure or any other error", body = super::error::ErrorBody)
    )
)]
pub async fn generate_debate(
    State(state): State<SharedState>,
    payload: Result<Json<GenerateDebateRequest>, JsonRejection>,
) -> ApiResult<Json<DebateResponse>> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Malformed debate request");
        ApiError::internal(rejection.body_text())
    })?;

    let report = state.debate.handle(req.into()).await?;
    Ok(Json(report.into()))
}
