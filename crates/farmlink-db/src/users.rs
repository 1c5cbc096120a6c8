use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use farmlink_types::api::UpdateProfileRequest;
use farmlink_types::models::{Role, User, timestamp_now};

use crate::Database;
use crate::models::{enum_at, format_ts, time_at, uuid_at};

const USER_COLUMNS: &str = "id, clerk_id, name, email, role, phone, location, organization, bio, \
     latitude, longitude, created_at";

impl Database {
    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.with_conn(|conn| {
            insert_user(conn, user)?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "id", &id.to_string()))
    }

    pub fn get_user_by_clerk_id(&self, clerk_id: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "clerk_id", clerk_id))
    }

    /// Create the user on first sight of `clerk_id`, otherwise refresh the
    /// display fields. The role is fixed at creation. Returns `(user, created)`.
    pub fn sync_user(
        &self,
        clerk_id: &str,
        email: &str,
        name: &str,
        role: Role,
    ) -> Result<(User, bool)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing = query_user(&tx, "clerk_id", clerk_id)?;
            let result = match existing {
                Some(mut user) => {
                    tx.execute(
                        "UPDATE users SET name = ?1, email = ?2 WHERE id = ?3",
                        params![name, email, user.id.to_string()],
                    )?;
                    user.name = name.to_string();
                    user.email = email.to_string();
                    (user, false)
                }
                None => {
                    let user = User {
                        id: Uuid::new_v4(),
                        clerk_id: clerk_id.to_string(),
                        name: name.to_string(),
                        email: email.to_string(),
                        role,
                        phone: None,
                        location: None,
                        organization: None,
                        bio: None,
                        latitude: None,
                        longitude: None,
                        created_at: timestamp_now(),
                    };
                    insert_user(&tx, &user)?;
                    (user, true)
                }
            };

            tx.commit()?;
            Ok(result)
        })
    }

    /// Apply the non-blank fields of `changes`. `None` if the user is absent.
    pub fn update_profile(&self, id: Uuid, changes: &UpdateProfileRequest) -> Result<Option<User>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(mut user) = query_user(&tx, "id", &id.to_string())? else {
                return Ok(None);
            };

            fn keep_or_replace(slot: &mut Option<String>, value: &Option<String>) {
                if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                    *slot = Some(v.to_string());
                }
            }

            if let Some(name) = changes.name.as_deref().filter(|v| !v.trim().is_empty()) {
                user.name = name.to_string();
            }
            keep_or_replace(&mut user.phone, &changes.phone);
            keep_or_replace(&mut user.location, &changes.location);
            keep_or_replace(&mut user.organization, &changes.organization);
            keep_or_replace(&mut user.bio, &changes.bio);
            if changes.latitude.is_some() {
                user.latitude = changes.latitude;
            }
            if changes.longitude.is_some() {
                user.longitude = changes.longitude;
            }

            tx.execute(
                "UPDATE users SET name = ?1, phone = ?2, location = ?3, organization = ?4, bio = ?5,
                     latitude = ?6, longitude = ?7
                 WHERE id = ?8",
                params![
                    user.name,
                    user.phone,
                    user.location,
                    user.organization,
                    user.bio,
                    user.latitude,
                    user.longitude,
                    user.id.to_string(),
                ],
            )?;

            tx.commit()?;
            Ok(Some(user))
        })
    }

    // -- Saved crops --

    pub fn saved_crops(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        self.with_conn(|conn| query_saved_crops(conn, user_id))
    }

    /// Flip membership of `crop_id` in the saved list. Returns whether the
    /// crop is saved afterwards, plus the resulting list.
    pub fn toggle_saved_crop(&self, user_id: Uuid, crop_id: Uuid) -> Result<(bool, Vec<Uuid>)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let removed = tx.execute(
                "DELETE FROM saved_crops WHERE user_id = ?1 AND crop_id = ?2",
                params![user_id.to_string(), crop_id.to_string()],
            )?;

            let is_saved = if removed == 0 {
                tx.execute(
                    "INSERT INTO saved_crops (user_id, crop_id, saved_at) VALUES (?1, ?2, ?3)",
                    params![user_id.to_string(), crop_id.to_string(), format_ts(&timestamp_now())],
                )?;
                true
            } else {
                false
            };

            let crops = query_saved_crops(&tx, user_id)?;
            tx.commit()?;
            Ok((is_saved, crops))
        })
    }
}

fn insert_user(conn: &Connection, user: &User) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"),
        params![
            user.id.to_string(),
            user.clerk_id,
            user.name,
            user.email,
            user.role.as_str(),
            user.phone,
            user.location,
            user.organization,
            user.bio,
            user.latitude,
            user.longitude,
            format_ts(&user.created_at),
        ],
    )?;
    Ok(())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        clerk_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        role: enum_at(row, 4)?,
        phone: row.get(5)?,
        location: row.get(6)?,
        organization: row.get(7)?,
        bio: row.get(8)?,
        latitude: row.get(9)?,
        longitude: row.get(10)?,
        created_at: time_at(row, 11)?,
    })
}

/// `column` is always one of our own literals, never caller input.
fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"))?;
    let user = stmt.query_row([value], user_from_row).optional()?;
    Ok(user)
}

fn query_saved_crops(conn: &Connection, user_id: Uuid) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(
        "SELECT crop_id FROM saved_crops WHERE user_id = ?1 ORDER BY saved_at ASC, rowid ASC",
    )?;
    let crops = stmt
        .query_map([user_id.to_string()], |row| uuid_at(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(crops)
}
