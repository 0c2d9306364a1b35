//! Conversation and message endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use avnu_common::db::models::{ConversationContext, Message};

use crate::messaging::ConversationView;
use crate::AppState;

use super::{ApiError, ApiResult};

/// Query parameters for GET /api/conversations/:contact_id
#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    pub user_id: String,
    pub venue_id: Option<String>,
    pub venue_name: Option<String>,
    pub booking_id: Option<String>,
}

/// GET /api/conversations/:contact_id
///
/// Loads the history between the requesting user and the contact, marking
/// inbound unread messages read. Optional venue/booking query parameters
/// carry the context the conversation was opened from.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
    Query(query): Query<ConversationQuery>,
) -> ApiResult<Json<ConversationView>> {
    let opened_with = ConversationContext {
        venue_id: query.venue_id,
        venue_name: query.venue_name,
        booking_id: query.booking_id,
    };
    let opened_with = if opened_with.is_empty() {
        None
    } else {
        Some(opened_with)
    };

    let view = state
        .messaging
        .load_conversation(&query.user_id, &contact_id, opened_with)
        .await
        .map_err(ApiError)?;
    Ok(Json(view))
}

/// Body for POST /api/messages
#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub venue_id: Option<String>,
    pub venue_name: Option<String>,
    pub booking_id: Option<String>,
}

/// POST /api/messages
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageBody>,
) -> ApiResult<Json<Message>> {
    let context = ConversationContext {
        venue_id: body.venue_id,
        venue_name: body.venue_name,
        booking_id: body.booking_id,
    };
    let message = state
        .messaging
        .send_message(&body.sender_id, &body.receiver_id, &body.content, context)
        .await
        .map_err(ApiError)?;
    Ok(Json(message))
}
