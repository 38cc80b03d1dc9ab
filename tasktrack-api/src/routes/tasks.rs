/// Task endpoints
///
/// # Endpoints
///
/// - `POST /tasks` - Create a task, optionally with assigned users
/// - `GET /tasks` - List tasks with pagination, search, filtering and sorting
/// - `PUT /tasks/:id` - Sparse update, optionally replacing the assignment set
/// - `DELETE /tasks/:id` - Delete a task without assignments
///
/// Assignment semantics: `taskUsers` on create/update is a full-replacement
/// set of user ids. Every id must resolve to an existing user or the whole
/// operation rolls back with `USER_NOT_FOUND`. On update the set is
/// reconciled by symmetric difference, so untouched assignments keep their
/// original rows.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::Envelope,
};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tasktrack_shared::db::{classify, DbErrorKind};
use tasktrack_shared::models::paging::{PageRequest, SortOrder};
use tasktrack_shared::models::task::{
    CreateTask, Currency, Task, TaskListFilter, TaskSortBy, TaskStatus, TaskWithUsers, UpdateTask,
};
use tasktrack_shared::models::ModelError;
use uuid::Uuid;
use validator::Validate;

use super::users::UserView;

const PATH: &str = "/tasks";

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 1024, message = "Description must be at most 1024 characters"))]
    pub description: String,

    /// Estimated hours, 2 decimal places
    pub estimated_time: Decimal,

    /// Deadline
    pub limit_date: DateTime<Utc>,

    /// Status label, one of "active" or "completed"; a completed task gets
    /// its completion date stamped server-side
    pub status: String,

    pub cost: Decimal,

    /// Currency label, currently only "MXN"
    pub currency: String,

    /// Full set of assigned user ids
    #[serde(default)]
    pub task_users: Option<Vec<Uuid>>,
}

/// Update task request; absent fields are left untouched
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1024, message = "Description must be at most 1024 characters"))]
    pub description: Option<String>,

    pub estimated_time: Option<Decimal>,

    pub limit_date: Option<DateTime<Utc>>,

    pub status: Option<String>,

    pub cost: Option<Decimal>,

    pub currency: Option<String>,

    /// When present, replaces the whole assignment set; an empty list
    /// removes every assignment
    pub task_users: Option<Vec<Uuid>>,
}

/// Task as rendered on the wire, with its assigned users nested
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub estimated_time: Decimal,
    pub limit_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub cost: Decimal,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub task_users: Vec<UserView>,
}

impl From<TaskWithUsers> for TaskView {
    fn from(row: TaskWithUsers) -> Self {
        let task = row.task;
        Self {
            id: task.id,
            name: task.name,
            description: task.description,
            estimated_time: task.estimated_time,
            limit_date: task.limit_date,
            completed_date: task.completed_date,
            status: task.status,
            cost: task.cost,
            currency: task.currency,
            created_at: task.created_at,
            updated_at: task.updated_at,
            task_users: row.users.into_iter().map(UserView::from).collect(),
        }
    }
}

/// Query parameters for the task list
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub sort_by: Option<String>,
    pub status: Option<String>,

    /// Only tasks assigned to this user
    pub user_id: Option<String>,

    /// Only tasks whose deadline falls on this calendar day
    pub limit_date: Option<String>,
}

/// Task list payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListData {
    pub tasks: Vec<TaskView>,
    pub page: i64,
    pub limit: i64,
    /// Matching tasks before pagination
    pub total: i64,
}

/// Parses a calendar day from either a plain date or a full timestamp
pub(crate) fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    value
        .parse::<DateTime<Utc>>()
        .ok()
        .map(|ts| ts.date_naive())
}

fn invalid_status() -> ApiError {
    ApiError::bad_request("INVALID_STATUS", "Status value is not recognized")
}

fn task_not_found() -> ApiError {
    ApiError::not_found("TASK_NOT_FOUND", "Task not found")
}

fn user_not_found() -> ApiError {
    ApiError::not_found("USER_NOT_FOUND", "One or more assigned users do not exist")
}

fn parse_currency(value: &str) -> Result<Currency, ApiError> {
    match value {
        "MXN" => Ok(Currency::Mxn),
        _ => Err(ApiError::bad_request(
            "INVALID_CURRENCY",
            "Currency value is not recognized",
        )),
    }
}

/// Maps store errors to the codes this resource reports
fn map_store_error(err: &sqlx::Error) -> ApiError {
    match classify(err) {
        DbErrorKind::ForeignKeyViolation => {
            ApiError::conflict("TASK_HAS_USERS", "Task still has assigned users")
        }
        DbErrorKind::NotNullViolation => ApiError::bad_request(
            "MISSING_REQUIRED_FIELDS",
            "One or more required fields are missing",
        ),
        DbErrorKind::InvalidTextValue => invalid_status(),
        kind => ApiError::internal_db(&kind),
    }
}

fn map_model_error(err: ModelError) -> ApiError {
    match err {
        ModelError::UnknownUser => user_not_found(),
        ModelError::Db(e) => map_store_error(&e),
    }
}

/// Create a new task
///
/// # Endpoint
///
/// ```text
/// POST /tasks
/// Content-Type: application/json
///
/// {
///   "name": "Ship invoices",
///   "description": "Prepare and send July invoices",
///   "estimatedTime": "4.50",
///   "limitDate": "2025-07-15T00:00:00Z",
///   "status": "active",
///   "cost": "1200.00",
///   "currency": "MXN",
///   "taskUsers": ["0c9ab15e-..."]
/// }
/// ```
///
/// Returns 201 with the task and its nested users. When any id in
/// `taskUsers` does not resolve the create rolls back entirely and 404
/// `USER_NOT_FOUND` is returned.
pub async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Envelope<TaskView>> {
    req.validate().map_err(|e| ApiError::validation(&e).at(PATH))?;

    let status = TaskStatus::from_param(&req.status).ok_or_else(|| invalid_status().at(PATH))?;
    let currency = parse_currency(&req.currency).map_err(|e| e.at(PATH))?;
    let assignees = req.task_users.unwrap_or_default();

    let task = Task::create(
        &state.db,
        CreateTask {
            name: req.name,
            description: req.description,
            estimated_time: req.estimated_time,
            limit_date: req.limit_date,
            status,
            cost: req.cost,
            currency,
        },
        &assignees,
    )
    .await
    .map_err(|e| map_model_error(e).at(PATH))?;

    tracing::info!(task_id = %task.task.id, assignees = task.users.len(), "task created");

    Ok(Envelope::created(PATH, "Task created", TaskView::from(task)))
}

/// List tasks
///
/// # Endpoint
///
/// ```text
/// GET /tasks?page=1&limit=10&search=invoice&sort=DESC&sortBy=name&status=active&userId=...&limitDate=2025-07-15
/// ```
///
/// `limitDate` restricts results to tasks whose deadline falls on that
/// calendar day (UTC). Search matches the task name and description as well
/// as the assigned users' names and emails. `total` counts all matches
/// before pagination.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Envelope<TaskListData>> {
    let status = match query.status.as_deref() {
        Some(value) => Some(TaskStatus::from_param(value).ok_or_else(|| invalid_status().at(PATH))?),
        None => None,
    };
    let user_id = match query.user_id.as_deref() {
        Some(value) => Some(Uuid::parse_str(value).map_err(|_| {
            ApiError::bad_request("INVALID_USER_ID", "userId must be a valid UUID").at(PATH)
        })?),
        None => None,
    };
    let limit_day = match query.limit_date.as_deref() {
        Some(value) => Some(parse_day(value).ok_or_else(|| {
            ApiError::bad_request("INVALID_DATE", "limitDate must be a valid date").at(PATH)
        })?),
        None => None,
    };

    let filter = TaskListFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        page: PageRequest::new(query.page, query.limit),
        sort: SortOrder::from_param(query.sort.as_deref()),
        sort_by: TaskSortBy::from_param(query.sort_by.as_deref()),
        status,
        user_id,
        limit_day,
    };

    let (tasks, total) = Task::list(&state.db, &filter)
        .await
        .map_err(|e| map_store_error(&e).at(PATH))?;

    Ok(Envelope::ok(
        PATH,
        "Success",
        TaskListData {
            tasks: tasks.into_iter().map(TaskView::from).collect(),
            page: filter.page.page,
            limit: filter.page.limit,
            total,
        },
    ))
}

/// Update a task
///
/// # Endpoint
///
/// ```text
/// PUT /tasks/:id
/// ```
///
/// Absent fields are left untouched; present fields apply even when falsy
/// (cost = 0 sets the cost to zero). Setting status to "completed" stamps
/// the completion date; setting it to "active" clears it. When `taskUsers`
/// is present it replaces the whole assignment set.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Envelope<TaskView>> {
    let path = format!("{PATH}/{id}");

    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::bad_request("INVALID_TASK_ID", "Task id must be a valid UUID").at(&path))?;
    req.validate().map_err(|e| ApiError::validation(&e).at(&path))?;

    let status = match req.status.as_deref() {
        Some(value) => Some(TaskStatus::from_param(value).ok_or_else(|| invalid_status().at(&path))?),
        None => None,
    };
    let currency = match req.currency.as_deref() {
        Some(value) => Some(parse_currency(value).map_err(|e| e.at(&path))?),
        None => None,
    };

    let update = UpdateTask {
        name: req.name,
        description: req.description,
        estimated_time: req.estimated_time,
        limit_date: req.limit_date,
        status,
        cost: req.cost,
        currency,
    };

    let task = Task::update(&state.db, id, update, req.task_users.as_deref())
        .await
        .map_err(|e| map_model_error(e).at(&path))?
        .ok_or_else(|| task_not_found().at(&path))?;

    tracing::info!(task_id = %id, "task updated");

    Ok(Envelope::ok(&path, "Task updated", TaskView::from(task)))
}

/// Delete a task
///
/// # Endpoint
///
/// ```text
/// DELETE /tasks/:id
/// ```
///
/// Returns 404 `TASK_NOT_FOUND` when the task does not exist and 409
/// `TASK_HAS_USERS` while assignments still reference it.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Envelope<serde_json::Value>> {
    let path = format!("{PATH}/{id}");

    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::bad_request("INVALID_TASK_ID", "Task id must be a valid UUID").at(&path))?;

    let deleted = Task::delete(&state.db, id)
        .await
        .map_err(|e| map_store_error(&e).at(&path))?;
    if !deleted {
        return Err(task_not_found().at(&path));
    }

    tracing::info!(task_id = %id, "task deleted");

    Ok(Envelope::ok(
        &path,
        "Task deleted",
        serde_json::json!({ "id": id }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day_accepts_date_and_timestamp() {
        let expected = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
        assert_eq!(parse_day("2025-07-15"), Some(expected));
        assert_eq!(parse_day(" 2025-07-15 "), Some(expected));
        assert_eq!(parse_day("2025-07-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_day("not-a-date"), None);
    }

    #[test]
    fn test_parse_currency() {
        assert!(parse_currency("MXN").is_ok());
        assert!(parse_currency("USD").is_err());
        assert!(parse_currency("mxn").is_err());
    }

    #[test]
    fn test_update_request_absent_fields_deserialize_as_none() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"cost": "0"}"#).unwrap();
        assert_eq!(req.cost, Some(Decimal::ZERO));
        assert!(req.name.is_none());
        assert!(req.status.is_none());
        assert!(req.task_users.is_none());
    }

    #[test]
    fn test_store_error_mapping_foreign_key() {
        let err = map_store_error(&sqlx::Error::RowNotFound);
        assert_eq!(err.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
