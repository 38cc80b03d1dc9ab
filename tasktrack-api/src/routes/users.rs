/// User endpoints
///
/// # Endpoints
///
/// - `POST /users` - Create a user
/// - `GET /users` - List users with pagination, search, filtering and sorting
///
/// List responses decorate each user with two derived aggregates: the number
/// and total cost of completed tasks assigned to them, both zero when the
/// user has no completed work. The aggregates are computed per query, never
/// stored.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::Envelope,
};
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tasktrack_shared::db::{classify, DbErrorKind};
use tasktrack_shared::models::paging::{PageRequest, SortOrder};
use tasktrack_shared::models::user::{
    CreateUser, User, UserListFilter, UserRole, UserSortBy, UserStatus, UserWithStats,
};
use uuid::Uuid;
use validator::Validate;

const PATH: &str = "/users";

/// Create user request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Given name(s)
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Paternal surname
    #[validate(length(min = 1, max = 255, message = "Last name must be 1-255 characters"))]
    pub last_name: String,

    /// Maternal surname
    #[validate(length(max = 255, message = "Second last name must be at most 255 characters"))]
    pub second_last_name: String,

    /// Email address, unique across users
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Role label, one of "admin" or "user"
    pub role: String,

    /// Status label, one of "enabled" or "disabled"
    pub status: String,
}

/// User as rendered on the wire, including the derived aggregates
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub last_name: String,
    pub second_last_name: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tasks_completed_count: i64,
    pub tasks_completed_cost: Decimal,
}

impl From<UserWithStats> for UserView {
    fn from(row: UserWithStats) -> Self {
        let UserWithStats {
            user,
            tasks_completed_count,
            tasks_completed_cost,
        } = row;
        let mut view = UserView::from(user);
        view.tasks_completed_count = tasks_completed_count;
        view.tasks_completed_cost = tasks_completed_cost;
        view
    }
}

impl From<User> for UserView {
    /// A freshly created user has no completed tasks yet
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            last_name: user.last_name,
            second_last_name: user.second_last_name,
            email: user.email,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
            tasks_completed_count: 0,
            tasks_completed_cost: Decimal::ZERO,
        }
    }
}

/// Query parameters for the user list
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub sort_by: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
}

/// User list payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListData {
    pub users: Vec<UserView>,
    pub page: i64,
    pub limit: i64,
    /// Matching users before pagination
    pub total: i64,
}

/// Maps store errors to the codes this resource reports
fn map_store_error(err: &sqlx::Error) -> ApiError {
    match classify(err) {
        DbErrorKind::UniqueViolation => {
            ApiError::conflict("EMAIL_ALREADY_EXISTS", "A user with this email already exists")
        }
        DbErrorKind::NotNullViolation => ApiError::bad_request(
            "MISSING_REQUIRED_FIELDS",
            "One or more required fields are missing",
        ),
        DbErrorKind::InvalidTextValue => ApiError::bad_request(
            "INVALID_ROLE_OR_STATUS",
            "Role or status value is not recognized",
        ),
        kind => ApiError::internal_db(&kind),
    }
}

fn invalid_role_or_status() -> ApiError {
    ApiError::bad_request(
        "INVALID_ROLE_OR_STATUS",
        "Role or status value is not recognized",
    )
}

/// Create a new user
///
/// # Endpoint
///
/// ```text
/// POST /users
/// Content-Type: application/json
///
/// {
///   "name": "Juan",
///   "lastName": "Perez",
///   "secondLastName": "Martinez",
///   "email": "juanperez@example.com",
///   "role": "user",
///   "status": "enabled"
/// }
/// ```
///
/// Returns 201 with the created user (zero aggregates), 409
/// `EMAIL_ALREADY_EXISTS` on duplicate email, 400 on missing fields or
/// unknown role/status labels.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<Envelope<UserView>> {
    req.validate().map_err(|e| ApiError::validation(&e).at(PATH))?;

    let role = UserRole::from_param(&req.role).ok_or_else(|| invalid_role_or_status().at(PATH))?;
    let status =
        UserStatus::from_param(&req.status).ok_or_else(|| invalid_role_or_status().at(PATH))?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            last_name: req.last_name,
            second_last_name: req.second_last_name,
            email: req.email,
            role,
            status,
        },
    )
    .await
    .map_err(|e| map_store_error(&e).at(PATH))?;

    tracing::info!(user_id = %user.id, "user created");

    Ok(Envelope::created(PATH, "User created", UserView::from(user)))
}

/// List users
///
/// # Endpoint
///
/// ```text
/// GET /users?page=1&limit=10&search=perez&sort=DESC&sortBy=email&status=enabled&role=user
/// ```
///
/// Page and limit below 1 fall back to the defaults (1 and 10); unknown sort
/// directions fall back to ASC and unknown sortBy columns to id. Unknown
/// status or role labels are rejected with 400 `INVALID_ROLE_OR_STATUS`.
/// `total` counts all matches before pagination.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Envelope<UserListData>> {
    let status = match query.status.as_deref() {
        Some(value) => {
            Some(UserStatus::from_param(value).ok_or_else(|| invalid_role_or_status().at(PATH))?)
        }
        None => None,
    };
    let role = match query.role.as_deref() {
        Some(value) => {
            Some(UserRole::from_param(value).ok_or_else(|| invalid_role_or_status().at(PATH))?)
        }
        None => None,
    };

    let filter = UserListFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        page: PageRequest::new(query.page, query.limit),
        sort: SortOrder::from_param(query.sort.as_deref()),
        sort_by: UserSortBy::from_param(query.sort_by.as_deref()),
        status,
        role,
    };

    let (users, total) = User::list(&state.db, &filter)
        .await
        .map_err(|e| map_store_error(&e).at(PATH))?;

    Ok(Envelope::ok(
        PATH,
        "Success",
        UserListData {
            users: users.into_iter().map(UserView::from).collect(),
            page: filter.page.page,
            limit: filter.page.limit,
            total,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let req = CreateUserRequest {
            name: "Juan".to_string(),
            last_name: "Perez".to_string(),
            second_last_name: "Martinez".to_string(),
            email: "not-an-email".to_string(),
            role: "user".to_string(),
            status: "enabled".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_user_view_serializes_camel_case() {
        let view = UserView {
            id: Uuid::new_v4(),
            name: "Juan".to_string(),
            last_name: "Perez".to_string(),
            second_last_name: "Martinez".to_string(),
            email: "juanperez@example.com".to_string(),
            role: UserRole::User,
            status: UserStatus::Enabled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            tasks_completed_count: 2,
            tasks_completed_cost: Decimal::new(15050, 2),
        };
        let value = serde_json::to_value(&view).unwrap();

        assert_eq!(value["lastName"], "Perez");
        assert_eq!(value["secondLastName"], "Martinez");
        assert_eq!(value["role"], "user");
        assert_eq!(value["tasksCompletedCount"], 2);
        assert_eq!(value["tasksCompletedCost"], "150.50");
    }

    #[test]
    fn test_store_error_mapping() {
        let err = map_store_error(&sqlx::Error::RowNotFound);
        assert_eq!(err.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
