use axum::{extract::State, response::IntoResponse};
use uuid::Uuid;

use farmlink_types::api::{ToggleSaveRequest, ToggleSaveResponse, UpdateProfileRequest, UserResponse};

use crate::error::ApiError;
use crate::extract::{Json, Path};
use crate::state::{AppState, run_blocking};

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = run_blocking(&state, move |db| {
        let Some(user) = db.get_user_by_id(id)? else {
            return Ok(None);
        };
        let saved_crops = db.saved_crops(id)?;
        Ok(Some(UserResponse { user, saved_crops }))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(response))
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_blocking(&state, move |db| db.update_profile(id, &req))
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(user))
}

/// PUT /api/users/{id}/toggle-save
pub async fn toggle_saved_crop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleSaveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (is_saved, saved_crops) = run_blocking(&state, move |db| {
        if db.get_user_by_id(id)?.is_none() {
            return Ok(None);
        }
        db.toggle_saved_crop(id, req.crop_id).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User"))?;

    let message = if is_saved {
        "Crop saved"
    } else {
        "Crop removed from saved"
    };

    Ok(Json(ToggleSaveResponse {
        message: message.to_string(),
        saved_crops,
        is_saved,
    }))
}
