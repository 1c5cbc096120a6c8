use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use farmlink_types::models::{Offer, OfferStatus};

use crate::Database;
use crate::models::{OfferRow, format_ts};

impl Database {
    pub fn insert_offer(&self, offer: &Offer) -> Result<()> {
        self.insert_offer_row(&OfferRow::from_offer(offer))
    }

    /// Raw insert of the stored layout. Nothing here checks that the row's
    /// counterpart columns agree with its type; readers skip rows that don't.
    pub fn insert_offer_row(&self, row: &OfferRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO offers ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                    OfferRow::COLUMNS
                ),
                params![
                    row.id.to_string(),
                    row.offer_type.as_str(),
                    row.farmer_id.to_string(),
                    row.buyer_id.map(|id| id.to_string()),
                    row.provider_id.map(|id| id.to_string()),
                    row.crop_id.map(|id| id.to_string()),
                    row.service_request_id.map(|id| id.to_string()),
                    row.buyer_need_id.map(|id| id.to_string()),
                    row.price_per_unit,
                    row.quantity_requested,
                    row.bid_amount,
                    row.message,
                    row.status.as_str(),
                    format_ts(&row.created_at),
                ],
            )?;
            Ok(())
        })
    }

    /// `None` when the offer is absent or stored malformed.
    pub fn get_offer(&self, id: Uuid) -> Result<Option<Offer>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {} FROM offers WHERE id = ?1", OfferRow::COLUMNS))?;
            let row = stmt.query_row([id.to_string()], OfferRow::from_row).optional()?;
            Ok(row.and_then(OfferRow::into_offer))
        })
    }

    /// Every well-formed offer where `user_id` is farmer, buyer or provider,
    /// newest first.
    pub fn offers_involving(&self, user_id: Uuid) -> Result<Vec<Offer>> {
        self.with_conn(|conn| query_offers_involving(conn, user_id))
    }

    /// Compare-and-set on status. Returns false when the stored status is no
    /// longer `from` (another request moved it first).
    pub fn update_offer_status(&self, id: Uuid, from: OfferStatus, to: OfferStatus) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE offers SET status = ?1 WHERE id = ?2 AND status = ?3",
                params![to.as_str(), id.to_string(), from.as_str()],
            )?;
            Ok(changed == 1)
        })
    }
}

fn query_offers_involving(conn: &Connection, user_id: Uuid) -> Result<Vec<Offer>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM offers
         WHERE farmer_id = ?1 OR buyer_id = ?1 OR provider_id = ?1
         ORDER BY created_at DESC, rowid DESC",
        OfferRow::COLUMNS
    ))?;

    let rows = stmt
        .query_map([user_id.to_string()], OfferRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().filter_map(OfferRow::into_offer).collect())
}
