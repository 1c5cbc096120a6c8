//! Row-level types and column helpers. Ids and timestamps are stored as
//! TEXT; timestamps use fixed-width RFC 3339 with microseconds so that
//! `ORDER BY created_at` is chronological.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use tracing::warn;
use uuid::Uuid;

use farmlink_types::models::{Message, Offer, OfferParties, OfferStatus, OfferType};

pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_err(idx, e))
}

pub(crate) fn opt_uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| s.parse().map_err(|e| conversion_err(idx, e))).transpose()
}

pub(crate) fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

pub(crate) fn enum_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_err(idx, e))
}

/// An offer exactly as stored, with nullable counterpart columns.
#[derive(Debug, Clone)]
pub struct OfferRow {
    pub id: Uuid,
    pub offer_type: OfferType,
    pub farmer_id: Uuid,
    pub buyer_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub crop_id: Option<Uuid>,
    pub service_request_id: Option<Uuid>,
    pub buyer_need_id: Option<Uuid>,
    pub price_per_unit: Option<f64>,
    pub quantity_requested: Option<f64>,
    pub bid_amount: Option<String>,
    pub message: Option<String>,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
}

impl OfferRow {
    pub(crate) const COLUMNS: &'static str = "id, offer_type, farmer_id, buyer_id, provider_id, \
         crop_id, service_request_id, buyer_need_id, price_per_unit, quantity_requested, \
         bid_amount, message, status, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: uuid_at(row, 0)?,
            offer_type: enum_at(row, 1)?,
            farmer_id: uuid_at(row, 2)?,
            buyer_id: opt_uuid_at(row, 3)?,
            provider_id: opt_uuid_at(row, 4)?,
            crop_id: opt_uuid_at(row, 5)?,
            service_request_id: opt_uuid_at(row, 6)?,
            buyer_need_id: opt_uuid_at(row, 7)?,
            price_per_unit: row.get(8)?,
            quantity_requested: row.get(9)?,
            bid_amount: row.get(10)?,
            message: row.get(11)?,
            status: enum_at(row, 12)?,
            created_at: time_at(row, 13)?,
        })
    }

    pub fn from_offer(offer: &Offer) -> Self {
        Self {
            id: offer.id,
            offer_type: offer.parties.offer_type(),
            farmer_id: offer.parties.farmer(),
            buyer_id: offer.parties.buyer(),
            provider_id: offer.parties.provider(),
            crop_id: offer.crop_id,
            service_request_id: offer.service_request_id,
            buyer_need_id: offer.buyer_need_id,
            price_per_unit: offer.price_per_unit,
            quantity_requested: offer.quantity_requested,
            bid_amount: offer.bid_amount.clone(),
            message: offer.message.clone(),
            status: offer.status,
            created_at: offer.created_at,
        }
    }

    /// `None` (with a warning) when the row lacks the counterpart its type needs.
    pub fn into_offer(self) -> Option<Offer> {
        let Some(parties) =
            OfferParties::from_columns(self.offer_type, self.farmer_id, self.buyer_id, self.provider_id)
        else {
            warn!(
                "Skipping malformed {} offer '{}': missing counterpart",
                self.offer_type, self.id
            );
            return None;
        };

        Some(Offer {
            id: self.id,
            parties,
            crop_id: self.crop_id,
            service_request_id: self.service_request_id,
            buyer_need_id: self.buyer_need_id,
            price_per_unit: self.price_per_unit,
            quantity_requested: self.quantity_requested,
            bid_amount: self.bid_amount,
            message: self.message,
            status: self.status,
            created_at: self.created_at,
        })
    }
}

pub(crate) const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, read, created_at";

pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: uuid_at(row, 0)?,
        sender_id: uuid_at(row, 1)?,
        receiver_id: uuid_at(row, 2)?,
        content: row.get(3)?,
        read: row.get(4)?,
        created_at: time_at(row, 5)?,
    })
}

/// Latest message in either direction plus the unread count owed to one side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadSummary {
    pub last_message: Option<Message>,
    pub unread: u32,
}
