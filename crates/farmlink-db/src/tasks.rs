use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use farmlink_types::api::UpdateTaskRequest;
use farmlink_types::models::Task;

use crate::Database;
use crate::models::{enum_at, format_ts, time_at, uuid_at};

const TASK_COLUMNS: &str = "id, user_id, title, date, kind, status, description, created_at";

// Every lookup is scoped by owner: another user's task reads as absent.
impl Database {
    pub fn insert_task(&self, task: &Task) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!("INSERT INTO tasks ({TASK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                params![
                    task.id.to_string(),
                    task.user_id.to_string(),
                    task.title,
                    format_ts(&task.date),
                    task.kind.as_str(),
                    task.status.as_str(),
                    task.description,
                    format_ts(&task.created_at),
                ],
            )?;
            Ok(())
        })
    }

    /// Soonest first.
    pub fn tasks_for_user(&self, user_id: Uuid) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 ORDER BY date ASC, rowid ASC"
            ))?;
            let rows = stmt
                .query_map([user_id.to_string()], task_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_task(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: &UpdateTaskRequest,
    ) -> Result<Option<Task>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(mut task) = query_task(&tx, user_id, id)? else {
                return Ok(None);
            };

            if let Some(title) = changes.title.as_deref().filter(|t| !t.trim().is_empty()) {
                task.title = title.to_string();
            }
            if let Some(date) = changes.date {
                task.date = date;
            }
            if let Some(kind) = changes.kind {
                task.kind = kind;
            }
            if let Some(status) = changes.status {
                task.status = status;
            }
            if changes.description.is_some() {
                task.description = changes.description.clone();
            }

            tx.execute(
                "UPDATE tasks SET title = ?1, date = ?2, kind = ?3, status = ?4, description = ?5
                 WHERE id = ?6 AND user_id = ?7",
                params![
                    task.title,
                    format_ts(&task.date),
                    task.kind.as_str(),
                    task.status.as_str(),
                    task.description,
                    task.id.to_string(),
                    user_id.to_string(),
                ],
            )?;

            tx.commit()?;
            Ok(Some(task))
        })
    }

    pub fn delete_task(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), user_id.to_string()],
            )?;
            Ok(deleted > 0)
        })
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: uuid_at(row, 0)?,
        user_id: uuid_at(row, 1)?,
        title: row.get(2)?,
        date: time_at(row, 3)?,
        kind: enum_at(row, 4)?,
        status: enum_at(row, 5)?,
        description: row.get(6)?,
        created_at: time_at(row, 7)?,
    })
}

fn query_task(conn: &Connection, user_id: Uuid, id: Uuid) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND user_id = ?2"
    ))?;
    let task = stmt
        .query_row(params![id.to_string(), user_id.to_string()], task_from_row)
        .optional()?;
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::user;
    use chrono::Duration;
    use farmlink_types::models::{Role, TaskKind, TaskStatus, timestamp_now};

    fn task(user_id: Uuid, title: &str, in_days: i64) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            date: timestamp_now() + Duration::days(in_days),
            kind: TaskKind::General,
            status: TaskStatus::Pending,
            description: None,
            created_at: timestamp_now(),
        }
    }

    #[test]
    fn test_tasks_are_scoped_to_owner() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "Kiran", Role::Farmer);
        let other = user(&db, "Lata", Role::Farmer);

        let harvest = task(owner.id, "Harvest wheat", 5);
        let irrigate = task(owner.id, "Irrigate", 1);
        db.insert_task(&harvest).unwrap();
        db.insert_task(&irrigate).unwrap();

        let titles: Vec<String> = db.tasks_for_user(owner.id).unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Irrigate", "Harvest wheat"]);
        assert!(db.tasks_for_user(other.id).unwrap().is_empty());

        let done = UpdateTaskRequest {
            status: Some(TaskStatus::Completed),
            kind: Some(TaskKind::Harvest),
            ..Default::default()
        };
        assert!(db.update_task(other.id, harvest.id, &done).unwrap().is_none());
        assert!(!db.delete_task(other.id, harvest.id).unwrap());

        let updated = db.update_task(owner.id, harvest.id, &done).unwrap().unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.kind, TaskKind::Harvest);
        assert_eq!(updated.title, "Harvest wheat");

        assert!(db.delete_task(owner.id, harvest.id).unwrap());
        assert_eq!(db.tasks_for_user(owner.id).unwrap().len(), 1);
    }
}
