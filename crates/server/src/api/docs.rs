//! OpenAPI document served at `/api/v1/openapi.json`.

use axum::Json;
use utoipa::OpenApi;

use super::{debate, error, ideas};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agora API",
        description = "Ideas, threaded responses and AI-generated debate viewpoints"
    ),
    paths(
        debate::generate_debate,
        ideas::list_ideas,
        ideas::create_idea,
        ideas::get_idea,
        ideas::regenerate_debate,
        ideas::list_responses,
        ideas::add_response,
        super::health
    ),
    components(
        schemas(
            debate::GenerateDebateRequest,
            debate::DebateResponse,
            debate::GeneratedDebate,
            debate::ViewpointStatus,
            debate::ReplyCreated,
            ideas::CreateIdeaRequest,
            ideas::CreateIdeaResponse,
            ideas::IdeaResponse,
            ideas::IdeaDetailResponse,
            ideas::TallyResponse,
            ideas::DebateResponseItem,
            ideas::ResponseListResponse,
            ideas::AddResponseRequest,
            error::ErrorBody,
            super::HealthResponse
        )
    ),
    tags(
        (name = "debate", description = "AI debate generation"),
        (name = "ideas", description = "Ideas and their responses"),
        (name = "system", description = "Health")
    )
)]
pub struct ApiDoc;

pub async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
