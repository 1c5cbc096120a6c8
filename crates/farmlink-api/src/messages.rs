use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};
use uuid::Uuid;

use farmlink_types::api::SendMessageRequest;
use farmlink_types::models::Message;

use crate::error::ApiError;
use crate::extract::{Json, Path};
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_blocking};

/// GET /api/chat/messages/{contact_id}
///
/// Marks the contact's messages to the caller as read, then returns the
/// whole thread oldest first. The returned messages already carry the new
/// read flags.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(contact_id): Path<Uuid>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let reader = me.id;

    let (newly_read, messages) = run_blocking(&state, move |db| {
        if db.get_user_by_id(contact_id)?.is_none() {
            return Ok(None);
        }
        db.open_conversation(reader, contact_id).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Contact"))?;

    if newly_read > 0 {
        debug!("{} read {} messages from {}", reader, newly_read, contact_id);
    }

    Ok(Json(messages))
}

/// POST /api/chat/messages
pub async fn send_message(
    State(state): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.unwrap_or_default();
    if content.trim().is_empty() {
        return Err(ApiError::invalid("Message content is required"));
    }
    if req.receiver_id == me.id {
        return Err(ApiError::invalid("Cannot send a message to yourself"));
    }

    let message = Message::new(me.id, req.receiver_id, content);

    let stored = message.clone();
    let delivered = run_blocking(&state, move |db| {
        if db.get_user_by_id(stored.receiver_id)?.is_none() {
            return Ok(false);
        }
        db.insert_message(&stored)?;
        Ok(true)
    })
    .await?;

    if !delivered {
        return Err(ApiError::not_found("Receiver"));
    }

    info!("Message {} from {} to {}", message.id, message.sender_id, message.receiver_id);
    Ok((StatusCode::CREATED, Json(message)))
}
