/// Task model and database operations
///
/// Tasks are the central entity: they carry scheduling and cost data and are
/// assigned to users through the `task_users` junction table.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('active', 'completed');
/// CREATE TYPE currency AS ENUM ('MXN');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description VARCHAR(1024) NOT NULL,
///     estimated_time NUMERIC(10,2) NOT NULL DEFAULT 0,
///     limit_date TIMESTAMPTZ NOT NULL,
///     completed_date TIMESTAMPTZ,
///     status task_status NOT NULL DEFAULT 'active',
///     cost NUMERIC(10,2) NOT NULL DEFAULT 0,
///     currency currency NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Completion invariant
///
/// `completed_date` is non-null exactly when `status = 'completed'`. The
/// stamp is always set server-side: transitioning to completed writes NOW(),
/// transitioning back to active clears it. Client-provided completion dates
/// are ignored.
///
/// # Assignment atomicity
///
/// Creating a task with assignees and reconciling an assignment set both run
/// inside a single transaction: either the task and all its assignment rows
/// exist, or none do.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use std::collections::HashSet;
use uuid::Uuid;

use super::paging::{PageRequest, SortOrder};
use super::task_user::TaskUser;
use super::user::User;
use super::ModelError;

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is open
    Active,

    /// Task has been completed; `completed_date` is set
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Active => "active",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "active" => Some(TaskStatus::Active),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// Monetary currency for task costs
///
/// A single variant today; stored as a database enum so new currencies are a
/// migration away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "currency", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Mxn,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Mxn => "MXN",
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub id: Uuid,

    /// Task name
    pub name: String,

    /// Longer description, bounded at 1024 characters
    pub description: String,

    /// Estimated hours to complete, 2 decimal places
    pub estimated_time: Decimal,

    /// Deadline (timezone-aware)
    pub limit_date: DateTime<Utc>,

    /// When the task was completed; None while active
    pub completed_date: Option<DateTime<Utc>>,

    /// Current lifecycle state
    pub status: TaskStatus,

    /// Monetary cost, 2 decimal places
    pub cost: Decimal,

    /// Currency of `cost`
    pub currency: Currency,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// A task together with its assigned users
#[derive(Debug, Clone)]
pub struct TaskWithUsers {
    pub task: Task,
    pub users: Vec<User>,
}

/// Input for creating a new task
///
/// A client-provided completion date is deliberately absent: the service
/// stamps it when status is completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub name: String,
    pub description: String,
    pub estimated_time: Decimal,
    pub limit_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub cost: Decimal,
    pub currency: Currency,
}

/// Sparse input for updating a task
///
/// `None` means "leave untouched"; `Some` applies the value even when it is
/// falsy (cost = 0 is a legitimate update).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub estimated_time: Option<Decimal>,
    pub limit_date: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub cost: Option<Decimal>,
    pub currency: Option<Currency>,
}

/// Column the task list can be sorted by
///
/// Unrecognized values silently fall back to `Id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSortBy {
    #[default]
    Id,
    Name,
    Status,
}

impl TaskSortBy {
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("name") => TaskSortBy::Name,
            Some("status") => TaskSortBy::Status,
            _ => TaskSortBy::Id,
        }
    }

    /// Whitelisted column name interpolated into ORDER BY
    pub fn column(&self) -> &'static str {
        match self {
            TaskSortBy::Id => "id",
            TaskSortBy::Name => "name",
            TaskSortBy::Status => "status",
        }
    }
}

/// Normalized filter for the task list query
#[derive(Debug, Clone, Default)]
pub struct TaskListFilter {
    /// Case-insensitive substring matched against the task name and
    /// description and the assigned users' names and emails (OR-combined)
    pub search: Option<String>,

    pub page: PageRequest,
    pub sort: SortOrder,
    pub sort_by: TaskSortBy,

    pub status: Option<TaskStatus>,

    /// Only tasks assigned to this user
    pub user_id: Option<Uuid>,

    /// Only tasks whose deadline falls on this calendar day (UTC)
    pub limit_day: Option<NaiveDate>,
}

impl TaskListFilter {
    /// WHERE clause and the number of binds it consumes
    ///
    /// Bind order must match the `.bind` calls in `Task::list`: status, day
    /// start, day end, user id, search pattern.
    fn where_clause(&self) -> (String, u8) {
        let mut conditions: Vec<String> = Vec::new();
        let mut bind = 0u8;

        if self.status.is_some() {
            bind += 1;
            conditions.push(format!("t.status = ${bind}"));
        }
        if self.limit_day.is_some() {
            conditions.push(format!(
                "t.limit_date >= ${} AND t.limit_date < ${}",
                bind + 1,
                bind + 2
            ));
            bind += 2;
        }
        if self.user_id.is_some() {
            bind += 1;
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM task_users tu \
                 WHERE tu.task_id = t.id AND tu.user_id = ${bind})"
            ));
        }
        if self.search.is_some() {
            bind += 1;
            conditions.push(format!(
                "(t.name ILIKE ${bind} OR t.description ILIKE ${bind} \
                 OR EXISTS (SELECT 1 FROM task_users tu \
                            JOIN users u ON u.id = tu.user_id \
                            WHERE tu.task_id = t.id \
                              AND (u.name ILIKE ${bind} OR u.email ILIKE ${bind})))"
            ));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        (clause, bind)
    }

    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|s| format!("%{}%", s.trim().to_lowercase()))
    }
}

/// Inclusive-day bounds as a half-open UTC timestamp range
pub fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    let end = (day + Days::new(1)).and_time(NaiveTime::MIN).and_utc();
    (start, end)
}

/// Removes duplicate ids while preserving first-seen order
pub fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Computes the symmetric-difference reconciliation between the current
/// assignment set and the desired full-replacement set
///
/// Returns (to_remove, to_add): users only in `current` are removed, users
/// only in `desired` are added, users in both are untouched.
pub fn reconcile_assignees(current: &[Uuid], desired: &[Uuid]) -> (Vec<Uuid>, Vec<Uuid>) {
    let current_set: HashSet<Uuid> = current.iter().copied().collect();
    let desired_set: HashSet<Uuid> = desired.iter().copied().collect();

    let to_remove = current
        .iter()
        .copied()
        .filter(|id| !desired_set.contains(id))
        .collect();
    let to_add = desired
        .iter()
        .copied()
        .filter(|id| !current_set.contains(id))
        .collect();

    (to_remove, to_add)
}

const TASK_COLUMNS: &str = "id, name, description, estimated_time, limit_date, completed_date, \
                            status, cost, currency, created_at, updated_at";

/// Daily completion count for the statistics date series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompletedPerDay {
    pub date: NaiveDate,
    pub count: i64,
}

impl Task {
    /// Creates a task and its assignments in one transaction
    ///
    /// When `assignees` is non-empty every id must resolve to an existing
    /// user; otherwise the whole create rolls back and
    /// `ModelError::UnknownUser` is returned — no orphan task row remains.
    /// If the status is completed, `completed_date` is stamped server-side.
    pub async fn create(
        pool: &PgPool,
        data: CreateTask,
        assignees: &[Uuid],
    ) -> Result<TaskWithUsers, ModelError> {
        let completed_date = match data.status {
            TaskStatus::Completed => Some(Utc::now()),
            TaskStatus::Active => None,
        };

        let mut tx = pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO tasks (name, description, estimated_time, limit_date,
                               completed_date, status, cost, currency)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TASK_COLUMNS}
            "#
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(data.name)
            .bind(data.description)
            .bind(data.estimated_time)
            .bind(data.limit_date)
            .bind(completed_date)
            .bind(data.status)
            .bind(data.cost)
            .bind(data.currency)
            .fetch_one(&mut *tx)
            .await?;

        let assignees = dedup_ids(assignees);
        let users = if assignees.is_empty() {
            Vec::new()
        } else {
            let users = User::find_by_ids(&mut *tx, &assignees).await?;
            if users.len() != assignees.len() {
                return Err(ModelError::UnknownUser);
            }
            TaskUser::link(&mut *tx, task.id, &assignees).await?;
            users
        };

        tx.commit().await?;

        Ok(TaskWithUsers { task, users })
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Applies a sparse update and optionally reconciles the assignment set,
    /// all in one transaction
    ///
    /// Only fields present in `data` are written. Setting status to
    /// completed stamps `completed_date`; setting it back to active clears
    /// it. `assignees` of `Some(set)` replaces the current assignment set
    /// via symmetric-difference reconciliation; `Some(&[])` removes every
    /// assignment; `None` leaves assignments untouched.
    ///
    /// Returns `Ok(None)` when the task does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
        assignees: Option<&[Uuid]>,
    ) -> Result<Option<TaskWithUsers>, ModelError> {
        let mut tx = pool.begin().await?;

        let exists_sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let existing = sqlx::query_as::<_, Task>(&exists_sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_none() {
            return Ok(None);
        }

        if let Some(desired) = assignees {
            let desired = dedup_ids(desired);
            if !desired.is_empty() {
                let users = User::find_by_ids(&mut *tx, &desired).await?;
                if users.len() != desired.len() {
                    return Err(ModelError::UnknownUser);
                }
            }

            let current = TaskUser::user_ids_for_task(&mut *tx, id).await?;
            let (to_remove, to_add) = reconcile_assignees(&current, &desired);
            TaskUser::unlink(&mut *tx, id, &to_remove).await?;
            TaskUser::link(&mut *tx, id, &to_add).await?;
        }

        // Dynamic sparse update; $1 is always the task id.
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${bind_count}"));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }
        if data.estimated_time.is_some() {
            bind_count += 1;
            query.push_str(&format!(", estimated_time = ${bind_count}"));
        }
        if data.limit_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", limit_date = ${bind_count}"));
        }
        match data.status {
            Some(TaskStatus::Completed) => {
                bind_count += 1;
                query.push_str(&format!(", status = ${bind_count}, completed_date = NOW()"));
            }
            Some(TaskStatus::Active) => {
                bind_count += 1;
                query.push_str(&format!(", status = ${bind_count}, completed_date = NULL"));
            }
            None => {}
        }
        if data.cost.is_some() {
            bind_count += 1;
            query.push_str(&format!(", cost = ${bind_count}"));
        }
        if data.currency.is_some() {
            bind_count += 1;
            query.push_str(&format!(", currency = ${bind_count}"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(estimated_time) = data.estimated_time {
            q = q.bind(estimated_time);
        }
        if let Some(limit_date) = data.limit_date {
            q = q.bind(limit_date);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(cost) = data.cost {
            q = q.bind(cost);
        }
        if let Some(currency) = data.currency {
            q = q.bind(currency);
        }

        let task = q.fetch_one(&mut *tx).await?;
        let users = TaskUser::users_for_task(&mut *tx, id).await?;

        tx.commit().await?;

        Ok(Some(TaskWithUsers { task, users }))
    }

    /// Deletes a task
    ///
    /// Returns false when the task does not exist. Fails with a foreign key
    /// violation when assignments still reference the task.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists tasks with filtering, search, sorting and pagination
    ///
    /// Returns the page of tasks (each with its assigned users) and the
    /// total number of matching tasks before pagination.
    pub async fn list(
        pool: &PgPool,
        filter: &TaskListFilter,
    ) -> Result<(Vec<TaskWithUsers>, i64), sqlx::Error> {
        let (where_clause, bind) = filter.where_clause();
        let pattern = filter.search_pattern();
        let bounds = filter.limit_day.map(day_bounds);

        let rows_sql = format!(
            r#"
            SELECT t.id, t.name, t.description, t.estimated_time, t.limit_date,
                   t.completed_date, t.status, t.cost, t.currency,
                   t.created_at, t.updated_at
            FROM tasks t{where_clause}
            ORDER BY t.{sort_col} {sort_dir}
            LIMIT ${limit_bind} OFFSET ${offset_bind}
            "#,
            sort_col = filter.sort_by.column(),
            sort_dir = filter.sort.as_sql(),
            limit_bind = bind + 1,
            offset_bind = bind + 2,
        );

        let mut rows_query = sqlx::query_as::<_, Task>(&rows_sql);
        if let Some(status) = filter.status {
            rows_query = rows_query.bind(status);
        }
        if let Some((start, end)) = bounds {
            rows_query = rows_query.bind(start).bind(end);
        }
        if let Some(user_id) = filter.user_id {
            rows_query = rows_query.bind(user_id);
        }
        if let Some(ref pattern) = pattern {
            rows_query = rows_query.bind(pattern.clone());
        }
        let tasks = rows_query
            .bind(filter.page.limit)
            .bind(filter.page.offset())
            .fetch_all(pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM tasks t{where_clause}");
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        if let Some(status) = filter.status {
            count_query = count_query.bind(status);
        }
        if let Some((start, end)) = bounds {
            count_query = count_query.bind(start).bind(end);
        }
        if let Some(user_id) = filter.user_id {
            count_query = count_query.bind(user_id);
        }
        if let Some(pattern) = pattern {
            count_query = count_query.bind(pattern);
        }
        let (total,) = count_query.fetch_one(pool).await?;

        // Assignments for the whole page in one query.
        let task_ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        let mut by_task: HashMap<Uuid, Vec<User>> = HashMap::new();
        for assigned in TaskUser::users_for_tasks(pool, &task_ids).await? {
            by_task.entry(assigned.task_id).or_default().push(assigned.user);
        }

        let tasks = tasks
            .into_iter()
            .map(|task| {
                let users = by_task.remove(&task.id).unwrap_or_default();
                TaskWithUsers { task, users }
            })
            .collect();

        Ok((tasks, total))
    }

    /// Dense daily series of completed-task counts over an inclusive date
    /// range
    ///
    /// Produces one row per calendar day, including days with zero
    /// completions, ordered ascending by date.
    pub async fn completed_per_day(
        pool: &PgPool,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CompletedPerDay>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CompletedPerDay>(
            r#"
            SELECT series.day::date AS date,
                   COALESCE(completed.count, 0) AS count
            FROM generate_series($1::date, $2::date, interval '1 day') AS series(day)
            LEFT JOIN (
                SELECT completed_date::date AS day, COUNT(*) AS count
                FROM tasks
                WHERE status = 'completed'
                  AND completed_date >= $1::date
                  AND completed_date < $2::date + interval '1 day'
                GROUP BY completed_date::date
            ) AS completed ON completed.day = series.day::date
            ORDER BY series.day
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Mean completion time in hours over an inclusive date range, rounded
    /// to 2 decimal places
    ///
    /// Averages `completed_date - created_at` across completed tasks whose
    /// completion falls in the range. Returns `None` when no task qualifies.
    pub async fn average_completion_hours(
        pool: &PgPool,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Decimal>, sqlx::Error> {
        let average: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT ROUND(AVG(EXTRACT(EPOCH FROM (completed_date - created_at)) / 3600.0)::numeric, 2)
            FROM tasks
            WHERE status = 'completed'
              AND completed_date >= $1::date
              AND completed_date < $2::date + interval '1 day'
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

        Ok(average)
    }
}
