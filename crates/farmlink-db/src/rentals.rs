use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use farmlink_types::api::UpdateRentalRequest;
use farmlink_types::models::Rental;

use crate::Database;
use crate::models::{enum_at, format_ts, time_at, uuid_at};

const RENTAL_COLUMNS: &str =
    "id, farmer_id, name, kind, price_per_hour, description, image, status, created_at";

impl Database {
    pub fn insert_rental(&self, rental: &Rental) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!("INSERT INTO rentals ({RENTAL_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                params![
                    rental.id.to_string(),
                    rental.farmer_id.to_string(),
                    rental.name,
                    rental.kind,
                    rental.price_per_hour,
                    rental.description,
                    rental.image,
                    rental.status.as_str(),
                    format_ts(&rental.created_at),
                ],
            )?;
            Ok(())
        })
    }

    /// Newest first, optionally narrowed to one farmer's equipment.
    pub fn list_rentals(&self, farmer_id: Option<Uuid>) -> Result<Vec<Rental>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RENTAL_COLUMNS} FROM rentals
                 WHERE ?1 IS NULL OR farmer_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([farmer_id.map(|id| id.to_string())], rental_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_rental(&self, id: Uuid) -> Result<Option<Rental>> {
        self.with_conn(|conn| query_rental(conn, id))
    }

    /// Blank or absent fields keep their stored value.
    pub fn update_rental(&self, id: Uuid, changes: &UpdateRentalRequest) -> Result<Option<Rental>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(mut rental) = query_rental(&tx, id)? else {
                return Ok(None);
            };

            let non_blank = |v: &Option<String>| v.as_deref().filter(|s| !s.trim().is_empty()).map(str::to_string);

            if let Some(name) = non_blank(&changes.name) {
                rental.name = name;
            }
            if let Some(kind) = non_blank(&changes.kind) {
                rental.kind = kind;
            }
            if let Some(price) = changes.price_per_hour {
                rental.price_per_hour = price;
            }
            if let Some(description) = non_blank(&changes.description) {
                rental.description = Some(description);
            }
            if let Some(image) = non_blank(&changes.image) {
                rental.image = Some(image);
            }
            if let Some(status) = changes.status {
                rental.status = status;
            }

            tx.execute(
                "UPDATE rentals SET name = ?1, kind = ?2, price_per_hour = ?3, description = ?4,
                     image = ?5, status = ?6
                 WHERE id = ?7",
                params![
                    rental.name,
                    rental.kind,
                    rental.price_per_hour,
                    rental.description,
                    rental.image,
                    rental.status.as_str(),
                    rental.id.to_string(),
                ],
            )?;

            tx.commit()?;
            Ok(Some(rental))
        })
    }

    /// Returns false when nothing was deleted.
    pub fn delete_rental(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM rentals WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }
}

fn rental_from_row(row: &Row<'_>) -> rusqlite::Result<Rental> {
    Ok(Rental {
        id: uuid_at(row, 0)?,
        farmer_id: uuid_at(row, 1)?,
        name: row.get(2)?,
        kind: row.get(3)?,
        price_per_hour: row.get(4)?,
        description: row.get(5)?,
        image: row.get(6)?,
        status: enum_at(row, 7)?,
        created_at: time_at(row, 8)?,
    })
}

fn query_rental(conn: &Connection, id: Uuid) -> Result<Option<Rental>> {
    let mut stmt = conn.prepare(&format!("SELECT {RENTAL_COLUMNS} FROM rentals WHERE id = ?1"))?;
    let rental = stmt.query_row([id.to_string()], rental_from_row).optional()?;
    Ok(rental)
}
