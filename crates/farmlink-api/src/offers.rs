use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use farmlink_types::api::{CreateOfferRequest, UpdateOfferStatusRequest};
use farmlink_types::models::{Offer, OfferParties, OfferStatus, OfferType, timestamp_now};

use crate::error::ApiError;
use crate::extract::{Json, Path};
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_blocking};

/// POST /api/offers
pub async fn create_offer(
    State(state): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Json(req): Json<CreateOfferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Each type has exactly one counterpart slot; the other must stay empty.
    let (needed, stray, stray_role) = match req.offer_type {
        OfferType::Service => ("provider", req.buyer, "buyer"),
        OfferType::Crop | OfferType::NeedFulfillment => ("buyer", req.provider, "provider"),
    };
    if stray.is_some() {
        return Err(ApiError::invalid(format!(
            "A {} offer takes no {}",
            req.offer_type, stray_role
        )));
    }
    let parties = OfferParties::from_columns(req.offer_type, req.farmer, req.buyer, req.provider)
        .ok_or_else(|| ApiError::invalid(format!("A {} offer needs a {}", req.offer_type, needed)))?;

    if !parties.involves(me.id) {
        return Err(ApiError::invalid("You must be a party to the offer"));
    }
    let counterpart = parties
        .counterpart(me.id)
        .ok_or_else(|| ApiError::invalid("An offer needs two different parties"))?;

    let offer = Offer {
        id: Uuid::new_v4(),
        parties,
        crop_id: req.crop,
        service_request_id: req.service_request,
        buyer_need_id: req.buyer_need,
        price_per_unit: req.price_per_unit,
        quantity_requested: req.quantity_requested,
        bid_amount: req.bid_amount,
        message: req.message,
        status: OfferStatus::Pending,
        created_at: timestamp_now(),
    };

    let stored = offer.clone();
    let created = run_blocking(&state, move |db| {
        if db.get_user_by_id(counterpart)?.is_none() {
            return Ok(false);
        }
        db.insert_offer(&stored)?;
        Ok(true)
    })
    .await?;

    if !created {
        return Err(ApiError::not_found("User"));
    }

    info!("{} offer {} created by {}", offer.parties.offer_type(), offer.id, me.id);
    Ok((StatusCode::CREATED, Json(offer)))
}

/// GET /api/offers
pub async fn list_offers(
    State(state): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = me.id;
    let offers = run_blocking(&state, move |db| db.offers_involving(user_id)).await?;
    Ok(Json(offers))
}

/// PATCH /api/offers/{id}/status
///
/// Only a party may move an offer; to anyone else it does not exist.
pub async fn update_offer_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Json(req): Json<UpdateOfferStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let offer = run_blocking(&state, move |db| db.get_offer(id))
        .await?
        .filter(|o| o.parties.involves(me.id))
        .ok_or_else(|| ApiError::not_found("Offer"))?;

    let (from, to) = (offer.status, req.status);
    if !from.can_transition_to(to) {
        return Err(ApiError::invalid(format!("Cannot move an offer from {} to {}", from, to)));
    }

    let changed = run_blocking(&state, move |db| db.update_offer_status(id, from, to)).await?;
    if !changed {
        return Err(ApiError::invalid("Offer status changed meanwhile; reload and retry"));
    }

    info!("Offer {} {} -> {} by {}", id, from, to, me.id);
    Ok(Json(Offer { status: to, ..offer }))
}
