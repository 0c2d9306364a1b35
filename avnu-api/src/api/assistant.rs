//! Assistant proxy endpoint

use axum::extract::State;
use axum::Json;

use crate::assistant::{AssistantReply, AssistantRequest};
use crate::AppState;

use super::{ApiError, ApiResult};

/// POST /api/assistant - proxy one question to the hosted assistant function
pub async fn ask_assistant(
    State(state): State<AppState>,
    Json(request): Json<AssistantRequest>,
) -> ApiResult<Json<AssistantReply>> {
    let reply = state.assistant.ask(&request).await.map_err(ApiError)?;
    Ok(Json(reply))
}
