use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use farmlink_types::api::{BuyerNeedQuery, CreateBuyerNeedRequest, StatusMessage};
use farmlink_types::models::{BuyerNeed, BuyerNeedStatus, timestamp_now};

use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::state::{AppState, run_blocking};

/// POST /api/buyer-needs
pub async fn create_buyer_need(
    State(state): State<AppState>,
    Json(req): Json<CreateBuyerNeedRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let crop_name = req.crop_name.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let (Some(buyer_id), Some(crop_name), Some(quantity), Some(min_price), Some(max_price), Some(deadline)) = (
        req.buyer,
        crop_name,
        req.quantity,
        req.min_price,
        req.max_price,
        req.deadline,
    ) else {
        return Err(ApiError::invalid("Missing required fields"));
    };

    if quantity <= 0.0 {
        return Err(ApiError::invalid("quantity must be positive"));
    }
    if min_price > max_price {
        return Err(ApiError::invalid("minPrice cannot exceed maxPrice"));
    }

    let need = BuyerNeed {
        id: Uuid::new_v4(),
        buyer_id,
        crop_name: crop_name.to_string(),
        quantity,
        unit: req
            .unit
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "kg".to_string()),
        min_price,
        max_price,
        description: req.description,
        deadline,
        status: BuyerNeedStatus::Active,
        created_at: timestamp_now(),
    };

    let stored = need.clone();
    let created = run_blocking(&state, move |db| {
        if db.get_user_by_id(stored.buyer_id)?.is_none() {
            return Ok(false);
        }
        db.insert_buyer_need(&stored)?;
        Ok(true)
    })
    .await?;

    if !created {
        return Err(ApiError::not_found("Buyer"));
    }

    info!("Buyer need {} posted by {}", need.id, need.buyer_id);
    Ok((StatusCode::CREATED, Json(need)))
}

/// GET /api/buyer-needs?buyerId=
pub async fn list_buyer_needs(
    State(state): State<AppState>,
    Query(query): Query<BuyerNeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let needs = run_blocking(&state, move |db| db.list_buyer_needs(query.buyer_id)).await?;
    Ok(Json(needs))
}

/// DELETE /api/buyer-needs/{id}
pub async fn delete_buyer_need(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !run_blocking(&state, move |db| db.delete_buyer_need(id)).await? {
        return Err(ApiError::not_found("Requirement"));
    }

    Ok(Json(StatusMessage {
        message: "Requirement deleted successfully".to_string(),
    }))
}
