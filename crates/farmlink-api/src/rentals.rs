use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use farmlink_types::api::{CreateRentalRequest, RentalQuery, StatusMessage, UpdateRentalRequest};
use farmlink_types::models::{Rental, RentalStatus, timestamp_now};

use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::state::{AppState, run_blocking};

/// GET /api/rentals?farmerId=
pub async fn list_rentals(
    State(state): State<AppState>,
    Query(query): Query<RentalQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rentals = run_blocking(&state, move |db| db.list_rentals(query.farmer_id)).await?;
    Ok(Json(rentals))
}

/// POST /api/rentals
pub async fn create_rental(
    State(state): State<AppState>,
    Json(req): Json<CreateRentalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() || req.kind.trim().is_empty() {
        return Err(ApiError::invalid("name and type are required"));
    }
    if !req.price_per_hour.is_finite() || req.price_per_hour < 0.0 {
        return Err(ApiError::invalid("pricePerHour must be a non-negative number"));
    }

    let rental = Rental {
        id: Uuid::new_v4(),
        farmer_id: req.farmer,
        name: req.name.trim().to_string(),
        kind: req.kind.trim().to_string(),
        price_per_hour: req.price_per_hour,
        description: req.description,
        image: req.image,
        status: req.status.unwrap_or(RentalStatus::Available),
        created_at: timestamp_now(),
    };

    let stored = rental.clone();
    let created = run_blocking(&state, move |db| {
        if db.get_user_by_id(stored.farmer_id)?.is_none() {
            return Ok(false);
        }
        db.insert_rental(&stored)?;
        Ok(true)
    })
    .await?;

    if !created {
        return Err(ApiError::not_found("Farmer"));
    }

    info!("Rental {} listed by {}", rental.id, rental.farmer_id);
    Ok((StatusCode::CREATED, Json(rental)))
}

/// PUT /api/rentals/{id}
pub async fn update_rental(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRentalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.price_per_hour.is_some_and(|p| !p.is_finite() || p < 0.0) {
        return Err(ApiError::invalid("pricePerHour must be a non-negative number"));
    }

    let rental = run_blocking(&state, move |db| db.update_rental(id, &req))
        .await?
        .ok_or_else(|| ApiError::not_found("Rental item"))?;

    Ok(Json(rental))
}

/// DELETE /api/rentals/{id}
pub async fn delete_rental(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !run_blocking(&state, move |db| db.delete_rental(id)).await? {
        return Err(ApiError::not_found("Rental item"));
    }

    Ok(Json(StatusMessage {
        message: "Rental item removed".to_string(),
    }))
}
