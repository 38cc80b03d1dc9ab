/// User-task assignment (junction) rows
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id),
///     task_id UUID NOT NULL REFERENCES tasks(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (task_id, user_id)
/// );
/// ```
///
/// Neither foreign key cascades: deleting a task that still has assignments
/// is rejected by the store and surfaced by the task service. A (task, user)
/// pair appears at most once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::User;

/// Assignment linking one user to one task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user row paired with the task it is assigned to, used when loading
/// assignments for a whole page of tasks in one query
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssignedUser {
    pub task_id: Uuid,

    #[sqlx(flatten)]
    pub user: User,
}

impl TaskUser {
    /// Ids of all users currently assigned to a task
    pub async fn user_ids_for_task<'e, E>(executor: E, task_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM task_users WHERE task_id = $1")
                .bind(task_id)
                .fetch_all(executor)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Inserts one assignment row per user id
    pub async fn link<'e, E>(executor: E, task_id: Uuid, user_ids: &[Uuid]) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        if user_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO task_users (task_id, user_id)
            SELECT $1, u.id FROM unnest($2::uuid[]) AS u(id)
            ON CONFLICT (task_id, user_id) DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(user_ids)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Removes the assignments between a task and the given users
    pub async fn unlink<'e, E>(
        executor: E,
        task_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM task_users WHERE task_id = $1 AND user_id = ANY($2)")
            .bind(task_id)
            .bind(user_ids)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Users assigned to a single task, in assignment order
    pub async fn users_for_task<'e, E>(executor: E, task_id: Uuid) -> Result<Vec<User>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.last_name, u.second_last_name, u.email,
                   u.role, u.status, u.created_at, u.updated_at
            FROM task_users tu
            JOIN users u ON u.id = tu.user_id
            WHERE tu.task_id = $1
            ORDER BY tu.created_at
            "#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await?;

        Ok(users)
    }

    /// Users assigned to any of the given tasks, for batching a page of
    /// tasks into a single assignment query
    pub async fn users_for_tasks<'e, E>(
        executor: E,
        task_ids: &[Uuid],
    ) -> Result<Vec<AssignedUser>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, AssignedUser>(
            r#"
            SELECT tu.task_id,
                   u.id, u.name, u.last_name, u.second_last_name, u.email,
                   u.role, u.status, u.created_at, u.updated_at
            FROM task_users tu
            JOIN users u ON u.id = tu.user_id
            WHERE tu.task_id = ANY($1)
            ORDER BY tu.created_at
            "#,
        )
        .bind(task_ids)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }
}
