use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use farmlink_types::models::Message;

use crate::Database;
use crate::models::{MESSAGE_COLUMNS, ThreadSummary, format_ts, message_from_row};

impl Database {
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!("INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                params![
                    message.id.to_string(),
                    message.sender_id.to_string(),
                    message.receiver_id.to_string(),
                    message.content,
                    message.read,
                    format_ts(&message.created_at),
                ],
            )?;
            Ok(())
        })
    }

    /// All messages between `a` and `b`, oldest first, without touching read flags.
    #[cfg(test)]
    pub(crate) fn conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>> {
        self.with_conn(|conn| query_conversation(conn, a, b))
    }

    /// `reader` opens the thread with `contact`: everything `contact` sent
    /// to `reader` becomes read, then the whole thread is returned oldest
    /// first. Both steps share one transaction, so the snapshot already
    /// shows the flags it just set. Returns `(newly_read, messages)`.
    pub fn open_conversation(&self, reader: Uuid, contact: Uuid) -> Result<(usize, Vec<Message>)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            // Filtered on read = 0: reapplying is a no-op.
            let newly_read = tx.execute(
                "UPDATE messages SET read = 1
                 WHERE sender_id = ?1 AND receiver_id = ?2 AND read = 0",
                params![contact.to_string(), reader.to_string()],
            )?;
            let messages = query_conversation(&tx, reader, contact)?;

            tx.commit()?;
            Ok((newly_read, messages))
        })
    }

    /// Last message between `user` and `contact` in either direction, and
    /// how many of `contact`'s messages `user` has not read yet.
    pub fn thread_summary(&self, user: Uuid, contact: Uuid) -> Result<ThreadSummary> {
        self.with_conn(|conn| {
            let last_message = conn
                .query_row(
                    &format!(
                        "SELECT {MESSAGE_COLUMNS} FROM messages
                         WHERE (sender_id = ?1 AND receiver_id = ?2)
                            OR (sender_id = ?2 AND receiver_id = ?1)
                         ORDER BY created_at DESC, rowid DESC
                         LIMIT 1"
                    ),
                    params![user.to_string(), contact.to_string()],
                    message_from_row,
                )
                .optional()?;

            let unread: u32 = conn.query_row(
                "SELECT COUNT(*) FROM messages
                 WHERE sender_id = ?1 AND receiver_id = ?2 AND read = 0",
                params![contact.to_string(), user.to_string()],
                |row| row.get(0),
            )?;

            Ok(ThreadSummary { last_message, unread })
        })
    }
}

/// Ties on `created_at` fall back to insertion order.
fn query_conversation(conn: &Connection, a: Uuid, b: Uuid) -> Result<Vec<Message>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages
         WHERE (sender_id = ?1 AND receiver_id = ?2)
            OR (sender_id = ?2 AND receiver_id = ?1)
         ORDER BY created_at ASC, rowid ASC"
    ))?;

    let rows = stmt
        .query_map(params![a.to_string(), b.to_string()], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
