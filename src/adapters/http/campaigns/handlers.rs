//! HTTP handler for AI message drafting.

use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::extract::ApiJson;
use crate::adapters::http::state::AppState;
use crate::application::handlers::campaigns::GenerateMessageDraftCommand;

use super::dto::{AiGenerateRequest, AiGenerateResponse};

/// POST /api/campaigns/:id/ai-generate - Draft a campaign message
pub async fn ai_generate(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
    ApiJson(request): ApiJson<AiGenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.generate_message_draft_handler();
    let cmd = GenerateMessageDraftCommand {
        campaign_id,
        license_key: request.license_key,
        prompt: request.prompt,
        tone: request.tone,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(AiGenerateResponse::from(result)))
}
