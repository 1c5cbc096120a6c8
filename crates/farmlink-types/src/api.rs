use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{OfferStatus, OfferType, RentalStatus, TaskKind, TaskStatus, User};

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Plain acknowledgement body for deletes and toggles.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

// -- Auth sync --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncUserRequest {
    pub clerk_id: String,
    pub email: String,
    pub name: Option<String>,
    /// Case-insensitive; defaults to farmer.
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncUserResponse {
    pub user: User,
}

// -- Users --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: User,
    pub saved_crops: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub organization: Option<String>,
    pub bio: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ToggleSaveRequest {
    pub crop_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSaveResponse {
    pub message: String,
    pub saved_crops: Vec<Uuid>,
    pub is_saved: bool,
}

// -- Chat --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    #[serde(default)]
    pub content: Option<String>,
}

// -- Offers --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
    pub offer_type: OfferType,
    pub farmer: Uuid,
    pub buyer: Option<Uuid>,
    pub provider: Option<Uuid>,
    pub crop: Option<Uuid>,
    pub service_request: Option<Uuid>,
    pub buyer_need: Option<Uuid>,
    pub price_per_unit: Option<f64>,
    pub quantity_requested: Option<f64>,
    pub bid_amount: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateOfferStatusRequest {
    pub status: OfferStatus,
}

// -- Rentals --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalQuery {
    pub farmer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRentalRequest {
    pub farmer: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price_per_hour: f64,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: Option<RentalStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRentalRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub price_per_hour: Option<f64>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: Option<RentalStatus>,
}

// -- Buyer needs --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerNeedQuery {
    pub buyer_id: Option<Uuid>,
}

/// Every field is optional on the wire so missing ones can be reported with
/// a single validation message instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuyerNeedRequest {
    pub buyer: Option<Uuid>,
    pub crop_name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

// -- Tasks --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: Option<TaskKind>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub kind: Option<TaskKind>,
    pub status: Option<TaskStatus>,
    pub description: Option<String>,
}
