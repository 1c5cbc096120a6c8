use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use farmlink_types::api::{SyncUserRequest, SyncUserResponse};
use farmlink_types::models::Role;

use crate::error::ApiError;
use crate::extract::Json;
use crate::state::{AppState, run_blocking};

/// POST /api/auth/sync
///
/// Called by the frontend right after the identity provider signs someone
/// in. Creates the local user on first sight (201), otherwise refreshes
/// name and email (200).
pub async fn sync_user(
    State(state): State<AppState>,
    Json(req): Json<SyncUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let clerk_id = req.clerk_id.trim().to_string();
    let email = req.email.trim().to_string();
    if clerk_id.is_empty() || email.is_empty() {
        return Err(ApiError::invalid("clerkId and email are required"));
    }

    let role = match req.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => raw
            .to_lowercase()
            .parse::<Role>()
            .map_err(|e| ApiError::invalid(e.to_string()))?,
        None => Role::Farmer,
    };

    // Fall back to the mailbox name when the provider has no full name.
    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());

    let (user, created) =
        run_blocking(&state, move |db| db.sync_user(&clerk_id, &email, &name, role)).await?;

    let status = if created {
        info!("Registered {} user {}", user.role, user.id);
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(SyncUserResponse { user })))
}
