/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'user');
/// CREATE TYPE user_status AS ENUM ('enabled', 'disabled');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     last_name VARCHAR(255) NOT NULL,
///     second_last_name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     role user_role NOT NULL,
///     status user_status NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The two per-user aggregates (completed task count and completed task
/// cost) are never stored; `User::list` recomputes them per query from the
/// assignment table.
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::models::user::{CreateUser, User, UserRole, UserStatus};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     name: "Juan".to_string(),
///     last_name: "Perez".to_string(),
///     second_last_name: "Martinez".to_string(),
///     email: "juanperez@example.com".to_string(),
///     role: UserRole::User,
///     status: UserStatus::Enabled,
/// }).await?;
/// println!("Created user: {}", user.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::paging::{PageRequest, SortOrder};

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }

    /// Parses a query-string value; unknown labels yield None so the caller
    /// can reject them before the store sees the value
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(UserRole::Admin),
            "user" => Some(UserRole::User),
            _ => None,
        }
    }
}

/// User account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Enabled,
    Disabled,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Enabled => "enabled",
            UserStatus::Disabled => "disabled",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "enabled" => Some(UserStatus::Enabled),
            "disabled" => Some(UserStatus::Disabled),
            _ => None,
        }
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Given name(s)
    pub name: String,

    /// Paternal surname
    pub last_name: String,

    /// Maternal surname
    pub second_last_name: String,

    /// Email address, unique across all users
    pub email: String,

    /// Role within the system
    pub role: UserRole,

    /// Whether the account is enabled
    pub status: UserStatus,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub last_name: String,
    pub second_last_name: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
}

/// A user row joined with its completed-task aggregates
///
/// `tasks_completed_count` and `tasks_completed_cost` are computed at query
/// time from assignments whose task is completed; both are zero when the
/// user has no completed tasks.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,

    pub tasks_completed_count: i64,

    pub tasks_completed_cost: Decimal,
}

/// Column the user list can be sorted by
///
/// Unrecognized values silently fall back to `Id` rather than erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortBy {
    #[default]
    Id,
    Name,
    Email,
    Role,
    Status,
}

impl UserSortBy {
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("name") => UserSortBy::Name,
            Some("email") => UserSortBy::Email,
            Some("role") => UserSortBy::Role,
            Some("status") => UserSortBy::Status,
            _ => UserSortBy::Id,
        }
    }

    /// Whitelisted column name interpolated into ORDER BY
    pub fn column(&self) -> &'static str {
        match self {
            UserSortBy::Id => "id",
            UserSortBy::Name => "name",
            UserSortBy::Email => "email",
            UserSortBy::Role => "role",
            UserSortBy::Status => "status",
        }
    }
}

/// Normalized filter for the user list query
#[derive(Debug, Clone, Default)]
pub struct UserListFilter {
    /// Case-insensitive substring matched against email, name and both
    /// surnames (OR-combined)
    pub search: Option<String>,

    pub page: PageRequest,
    pub sort: SortOrder,
    pub sort_by: UserSortBy,

    pub status: Option<UserStatus>,
    pub role: Option<UserRole>,
}

impl UserListFilter {
    /// WHERE clause and the number of binds it consumes
    fn where_clause(&self) -> (String, u8) {
        let mut conditions: Vec<String> = Vec::new();
        let mut bind = 0u8;

        if self.status.is_some() {
            bind += 1;
            conditions.push(format!("u.status = ${bind}"));
        }
        if self.role.is_some() {
            bind += 1;
            conditions.push(format!("u.role = ${bind}"));
        }
        if self.search.is_some() {
            bind += 1;
            conditions.push(format!(
                "(u.email ILIKE ${bind} OR u.name ILIKE ${bind} \
                 OR u.last_name ILIKE ${bind} OR u.second_last_name ILIKE ${bind})"
            ));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        (clause, bind)
    }

    /// SQL pattern for the substring search, when present
    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|s| format!("%{}%", s.trim().to_lowercase()))
    }
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error when the email already exists (unique violation) or
    /// any other store failure occurs; callers classify the error via
    /// `db::classify`.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, last_name, second_last_name, email, role, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, last_name, second_last_name, email, role, status,
                      created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.last_name)
        .bind(data.second_last_name)
        .bind(data.email)
        .bind(data.role)
        .bind(data.status)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, last_name, second_last_name, email, role, status,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Fetches all users whose id is in `ids`
    ///
    /// The result can be shorter than `ids` when some ids do not resolve;
    /// assignment flows use the length mismatch to detect unknown users.
    pub async fn find_by_ids<'e, E>(executor: E, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, last_name, second_last_name, email, role, status,
                   created_at, updated_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;

        Ok(users)
    }

    /// Lists users with filtering, search, sorting and pagination
    ///
    /// Returns the page of users (each with its completed-task aggregates)
    /// and the total number of matching users before pagination.
    pub async fn list(
        pool: &PgPool,
        filter: &UserListFilter,
    ) -> Result<(Vec<UserWithStats>, i64), sqlx::Error> {
        let (where_clause, bind) = filter.where_clause();
        let pattern = filter.search_pattern();

        let rows_sql = format!(
            r#"
            SELECT u.id, u.name, u.last_name, u.second_last_name, u.email,
                   u.role, u.status, u.created_at, u.updated_at,
                   COALESCE(s.completed_count, 0) AS tasks_completed_count,
                   COALESCE(s.completed_cost, 0)::numeric(10,2) AS tasks_completed_cost
            FROM users u
            LEFT JOIN (
                SELECT tu.user_id,
                       COUNT(*) AS completed_count,
                       SUM(t.cost) AS completed_cost
                FROM task_users tu
                JOIN tasks t ON t.id = tu.task_id
                WHERE t.status = 'completed'
                GROUP BY tu.user_id
            ) s ON s.user_id = u.id{where_clause}
            ORDER BY u.{sort_col} {sort_dir}
            LIMIT ${limit_bind} OFFSET ${offset_bind}
            "#,
            sort_col = filter.sort_by.column(),
            sort_dir = filter.sort.as_sql(),
            limit_bind = bind + 1,
            offset_bind = bind + 2,
        );

        let mut rows_query = sqlx::query_as::<_, UserWithStats>(&rows_sql);
        if let Some(status) = filter.status {
            rows_query = rows_query.bind(status);
        }
        if let Some(role) = filter.role {
            rows_query = rows_query.bind(role);
        }
        if let Some(ref pattern) = pattern {
            rows_query = rows_query.bind(pattern.clone());
        }
        let users = rows_query
            .bind(filter.page.limit)
            .bind(filter.page.offset())
            .fetch_all(pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM users u{where_clause}");
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        if let Some(status) = filter.status {
            count_query = count_query.bind(status);
        }
        if let Some(role) = filter.role {
            count_query = count_query.bind(role);
        }
        if let Some(pattern) = pattern {
            count_query = count_query.bind(pattern);
        }
        let (total,) = count_query.fetch_one(pool).await?;

        Ok((users, total))
    }
}
