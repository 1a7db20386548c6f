//! # Ideas API
//!
//! Posting ideas, reading their debates, and human contributions.

use agora_core::debate::{DebateEventKind, IdeaSeed, Viewpoint};
use agora_core::state::{
    Idea, IdeaManager, NewIdea, NewResponse, Response, ResponseManager, ResponseNode,
    ViewpointTally,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use utoipa::ToSchema;

use super::debate::GeneratedDebate;
use super::{ApiError, ApiResult, SharedState};

const HEARTBEAT: Duration = Duration::from_secs(15);

// === API Types ===

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIdeaRequest {
    pub title: String,
    pub content: String,
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdeaResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Idea> for IdeaResponse {
    fn from(idea: Idea) -> Self {
        Self {
            id: idea.id,
            title: idea.title,
            content: idea.content,
            author_name: idea.author_name,
            created_at: idea.created_at.to_rfc3339(),
            updated_at: idea.updated_at.to_rfc3339(),
        }
    }
}

/// The new idea plus the outcome of its opening debate
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIdeaResponse {
    pub idea: IdeaResponse,
    pub debate: Option<GeneratedDebate>,
    /// Set when generation failed; the idea is kept regardless
    pub debate_error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct TallyResponse {
    pub favor: u32,
    pub contra: u32,
    pub neutral: u32,
    pub total: u32,
}

impl From<ViewpointTally> for TallyResponse {
    fn from(tally: ViewpointTally) -> Self {
        Self {
            favor: tally.favor,
            contra: tally.contra,
            neutral: tally.neutral,
            total: tally.total(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IdeaDetailResponse {
    pub idea: IdeaResponse,
    pub tally: TallyResponse,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DebateResponseItem {
    pub id: String,
    pub idea_id: String,
    pub content: String,
    pub viewpoint: String,
    pub is_ai: bool,
    pub author_name: String,
    pub created_at: String,
    pub parent_response_id: Option<String>,
}

impl From<Response> for DebateResponseItem {
    fn from(response: Response) -> Self {
        Self {
            id: response.id,
            idea_id: response.idea_id,
            content: response.content,
            viewpoint: response.viewpoint.to_string(),
            is_ai: response.is_ai,
            author_name: response.author_name,
            created_at: response.created_at.to_rfc3339(),
            parent_response_id: response.parent_response_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseListResponse {
    pub responses: Vec<DebateResponseItem>,
    pub tally: TallyResponse,
}

/// Human contribution; viewpoint defaults to neutral
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddResponseRequest {
    pub content: String,
    pub viewpoint: Option<String>,
    pub author_name: Option<String>,
    pub parent_response_id: Option<String>,
}

/// Response with its replies, recursively
#[derive(Debug, Serialize)]
pub struct ThreadNode {
    #[serde(flatten)]
    pub response: DebateResponseItem,
    pub replies: Vec<ThreadNode>,
}

impl From<ResponseNode> for ThreadNode {
    fn from(node: ResponseNode) -> Self {
        Self {
            response: node.response.into(),
            replies: node.replies.into_iter().map(ThreadNode::from).collect(),
        }
    }
}

pub fn idea_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_ideas).post(create_idea))
        .route("/:id", get(get_idea))
        .route("/:id/debate", post(regenerate_debate))
        .route("/:id/responses", get(list_responses).post(add_response))
        .route("/:id/thread", get(get_thread))
        .route("/:id/events", get(idea_events))
}

fn require_idea(state: &SharedState, id: &str) -> ApiResult<Idea> {
    IdeaManager::new(&state.db)
        .find(id)?
        .ok_or_else(|| ApiError::not_found(format!("idea {}", id)))
}

// === Handlers ===

/// List ideas, newest first
#[utoipa::path(
    get,
    path = "/api/v1/ideas",
    tag = "ideas",
    responses(
        (status = 200, description = "All ideas", body = Vec<IdeaResponse>)
    )
)]
pub async fn list_ideas(State(state): State<SharedState>) -> ApiResult<Json<Vec<IdeaResponse>>> {
    let ideas = IdeaManager::new(&state.db).list()?;
    Ok(Json(ideas.into_iter().map(IdeaResponse::from).collect()))
}

/// Post an idea and generate its opening debate
#[utoipa::path(
    post,
    path = "/api/v1/ideas",
    tag = "ideas",
    request_body = CreateIdeaRequest,
    responses(
        (status = 201, description = "Idea created; debate outcome attached", body = CreateIdeaResponse),
        (status = 400, description = "Title or content missing", body = super::error::ErrorBody)
    )
)]
pub async fn create_idea(
    State(state): State<SharedState>,
    Json(req): Json<CreateIdeaRequest>,
) -> ApiResult<(StatusCode, Json<CreateIdeaResponse>)> {
    if req.title.trim().is_empty() || req.content.trim().is_empty() {
        return Err(ApiError::bad_request("Idea title and content are required"));
    }

    let idea = IdeaManager::new(&state.db).create(NewIdea {
        title: req.title,
        content: req.content,
        author_name: req.author_name,
    })?;

    let seed = IdeaSeed {
        idea_id: idea.id.clone(),
        title: idea.title.clone(),
        content: idea.content.clone(),
    };

    let (debate, debate_error) = match state.debate.generate_for(&seed).await {
        Ok(outcome) => (Some(GeneratedDebate::from(&outcome)), None),
        Err(e) => {
            tracing::warn!(idea_id = %idea.id, kind = e.kind(), error = %e, "Idea created without debate");
            (None, Some(e.to_string()))
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateIdeaResponse {
            idea: idea.into(),
            debate,
            debate_error,
        }),
    ))
}

/// Get one idea with its viewpoint counts
#[utoipa::path(
    get,
    path = "/api/v1/ideas/{id}",
    tag = "ideas",
    params(("id" = String, Path, description = "Idea ID")),
    responses(
        (status = 200, description = "Idea found", body = IdeaDetailResponse),
        (status = 404, description = "Idea not found", body = super::error::ErrorBody)
    )
)]
pub async fn get_idea(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<IdeaDetailResponse>> {
    let idea = require_idea(&state, &id)?;
    let tally = ResponseManager::new(&state.db).tally(&id)?;
    Ok(Json(IdeaDetailResponse {
        idea: idea.into(),
        tally: tally.into(),
    }))
}

/// Generate another set of viewpoints for an existing idea
#[utoipa::path(
    post,
    path = "/api/v1/ideas/{id}/debate",
    tag = "ideas",
    params(("id" = String, Path, description = "Idea ID")),
    responses(
        (status = 200, description = "Viewpoints generated (possibly partial)", body = GeneratedDebate),
        (status = 404, description = "Idea not found", body = super::error::ErrorBody),
        (status = 402, description = "Upstream billing block", body = super::error::ErrorBody),
        (status = 429, description = "Upstream rate limit", body = super::error::ErrorBody)
    )
)]
pub async fn regenerate_debate(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<GeneratedDebate>> {
    let idea = require_idea(&state, &id)?;
    let outcome = state
        .debate
        .generate_for(&IdeaSeed {
            idea_id: idea.id,
            title: idea.title,
            content: idea.content,
        })
        .await?;
    Ok(Json(GeneratedDebate::from(&outcome)))
}

/// List an idea's responses, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/ideas/{id}/responses",
    tag = "ideas",
    params(("id" = String, Path, description = "Idea ID")),
    responses(
        (status = 200, description = "Responses and viewpoint counts", body = ResponseListResponse),
        (status = 404, description = "Idea not found", body = super::error::ErrorBody)
    )
)]
pub async fn list_responses(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResponseListResponse>> {
    require_idea(&state, &id)?;
    let manager = ResponseManager::new(&state.db);
    let responses = manager.list_for_idea(&id)?;
    let tally = manager.tally(&id)?;
    Ok(Json(ResponseListResponse {
        responses: responses.into_iter().map(DebateResponseItem::from).collect(),
        tally: tally.into(),
    }))
}

/// Add a human response, optionally as a reply
#[utoipa::path(
    post,
    path = "/api/v1/ideas/{id}/responses",
    tag = "ideas",
    params(("id" = String, Path, description = "Idea ID")),
    request_body = AddResponseRequest,
    responses(
        (status = 201, description = "Response stored", body = DebateResponseItem),
        (status = 400, description = "Blank content, unknown viewpoint or invalid parent", body = super::error::ErrorBody),
        (status = 404, description = "Idea not found", body = super::error::ErrorBody)
    )
)]
pub async fn add_response(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<AddResponseRequest>,
) -> ApiResult<(StatusCode, Json<DebateResponseItem>)> {
    require_idea(&state, &id)?;

    if req.content.trim().is_empty() {
        return Err(ApiError::bad_request("Response content must not be empty"));
    }

    let viewpoint = match req.viewpoint.as_deref().map(str::trim) {
        None | Some("") => Viewpoint::Neutral,
        Some(raw) => raw
            .parse::<Viewpoint>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
    };

    let manager = ResponseManager::new(&state.db);
    let mut new = NewResponse::human(&id, viewpoint, req.content, req.author_name.as_deref());

    if let Some(parent_id) = req.parent_response_id.filter(|p| !p.trim().is_empty()) {
        match manager.find(&parent_id)? {
            Some(parent) if parent.idea_id == id => new = new.with_parent(parent_id),
            _ => {
                return Err(ApiError::bad_request(format!(
                    "Parent response '{}' does not belong to idea '{}'",
                    parent_id, id
                )))
            }
        }
    }

    let response = manager.insert(new)?;
    Ok((StatusCode::CREATED, Json(response.into())))
}

/// Responses arranged as reply threads
pub async fn get_thread(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ThreadNode>>> {
    require_idea(&state, &id)?;
    let thread = ResponseManager::new(&state.db).thread(&id)?;
    Ok(Json(thread.into_iter().map(ThreadNode::from).collect()))
}

/// SSE stream of new responses for one idea, with heartbeat
pub async fn idea_events(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    require_idea(&state, &id)?;
    let rx = state.db.subscribe();

    let stream = stream::unfold((rx, id), |(mut rx, idea_id)| async move {
        loop {
            match tokio::time::timeout(HEARTBEAT, rx.recv()).await {
                Ok(Ok(event))
                    if event.idea_id == idea_id && event.kind == DebateEventKind::ResponseCreated =>
                {
                    let json = serde_json::to_string(&event).unwrap_or_default();
                    let sse = Event::default().event(event.kind.as_str()).data(json);
                    return Some((Ok(sse), (rx, idea_id)));
                }
                Ok(Ok(_)) => continue,
                Ok(Err(RecvError::Lagged(skipped))) => {
                    tracing::warn!(skipped, idea_id = %idea_id, "Event subscriber lagged");
                    continue;
                }
                Ok(Err(RecvError::Closed)) => return None,
                // Timeout - send heartbeat comment
                Err(_) => return Some((Ok(Event::default().comment("heartbeat")), (rx, idea_id))),
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
