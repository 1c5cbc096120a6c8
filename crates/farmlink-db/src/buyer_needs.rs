use anyhow::Result;
use rusqlite::{Row, params};
use uuid::Uuid;

use farmlink_types::models::BuyerNeed;

use crate::Database;
use crate::models::{enum_at, format_ts, time_at, uuid_at};

const NEED_COLUMNS: &str = "id, buyer_id, crop_name, quantity, unit, min_price, max_price, \
     description, deadline, status, created_at";

impl Database {
    pub fn insert_buyer_need(&self, need: &BuyerNeed) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO buyer_needs ({NEED_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                params![
                    need.id.to_string(),
                    need.buyer_id.to_string(),
                    need.crop_name,
                    need.quantity,
                    need.unit,
                    need.min_price,
                    need.max_price,
                    need.description,
                    format_ts(&need.deadline),
                    need.status.as_str(),
                    format_ts(&need.created_at),
                ],
            )?;
            Ok(())
        })
    }

    /// Newest first, optionally only one buyer's requirements.
    pub fn list_buyer_needs(&self, buyer_id: Option<Uuid>) -> Result<Vec<BuyerNeed>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NEED_COLUMNS} FROM buyer_needs
                 WHERE ?1 IS NULL OR buyer_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([buyer_id.map(|id| id.to_string())], need_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_buyer_need(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM buyer_needs WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }
}

fn need_from_row(row: &Row<'_>) -> rusqlite::Result<BuyerNeed> {
    Ok(BuyerNeed {
        id: uuid_at(row, 0)?,
        buyer_id: uuid_at(row, 1)?,
        crop_name: row.get(2)?,
        quantity: row.get(3)?,
        unit: row.get(4)?,
        min_price: row.get(5)?,
        max_price: row.get(6)?,
        description: row.get(7)?,
        deadline: time_at(row, 8)?,
        status: enum_at(row, 9)?,
        created_at: time_at(row, 10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::user;
    use chrono::Duration;
    use farmlink_types::models::{BuyerNeedStatus, Role, timestamp_now};

    fn need(buyer_id: Uuid, crop: &str) -> BuyerNeed {
        BuyerNeed {
            id: Uuid::new_v4(),
            buyer_id,
            crop_name: crop.to_string(),
            quantity: 20.0,
            unit: "quintals".to_string(),
            min_price: 1800.0,
            max_price: 2100.0,
            description: None,
            deadline: timestamp_now() + Duration::days(14),
            status: BuyerNeedStatus::Active,
            created_at: timestamp_now(),
        }
    }

    #[test]
    fn test_list_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let b1 = user(&db, "Isha", Role::Buyer);
        let b2 = user(&db, "Jai", Role::Buyer);

        let wheat = need(b1.id, "Wheat");
        let mut rice = need(b1.id, "Rice");
        rice.created_at = timestamp_now() - Duration::hours(1);
        let onion = need(b2.id, "Onion");
        for n in [&wheat, &rice, &onion] {
            db.insert_buyer_need(n).unwrap();
        }

        let mine = db.list_buyer_needs(Some(b1.id)).unwrap();
        assert_eq!(mine, vec![wheat.clone(), rice]);
        assert_eq!(db.list_buyer_needs(None).unwrap().len(), 3);

        assert!(db.delete_buyer_need(wheat.id).unwrap());
        assert!(!db.delete_buyer_need(wheat.id).unwrap());
        assert_eq!(db.list_buyer_needs(Some(b1.id)).unwrap().len(), 1);
    }
}
