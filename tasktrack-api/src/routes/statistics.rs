/// Completed-task statistics endpoints
///
/// # Endpoints
///
/// - `GET /statistics/tasks-completed/range` - Daily completion counts
/// - `GET /statistics/tasks-completed/average-time` - Mean completion hours
///
/// Both take required `startDate` and `endDate` query parameters and operate
/// on the inclusive day-truncated range: a task completed at any time during
/// `endDate` is counted.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::Envelope,
};
use axum::extract::{Query, State};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tasktrack_shared::models::task::{CompletedPerDay, Task};

use super::tasks::parse_day;

const RANGE_PATH: &str = "/statistics/tasks-completed/range";
const AVERAGE_PATH: &str = "/statistics/tasks-completed/average-time";

/// Query parameters shared by both statistics endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Average completion time payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageCompletionData {
    /// Mean of (completion - creation) in hours, 2 decimal places
    pub average_hours: Decimal,
}

/// Extracts and validates the required date range
fn parse_range(query: &DateRangeQuery, path: &str) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let (start_raw, end_raw) = match (query.start_date.as_deref(), query.end_date.as_deref()) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(ApiError::bad_request(
                "MISSING_DATE_RANGE",
                "startDate and endDate are required",
            )
            .at(path))
        }
    };

    let invalid = || {
        ApiError::bad_request(
            "INVALID_DATE_RANGE",
            "startDate and endDate must be valid dates",
        )
        .at(path)
    };
    let start = parse_day(start_raw).ok_or_else(invalid)?;
    let end = parse_day(end_raw).ok_or_else(invalid)?;

    Ok((start, end))
}

/// Daily completion counts over an inclusive date range
///
/// # Endpoint
///
/// ```text
/// GET /statistics/tasks-completed/range?startDate=2025-07-01&endDate=2025-07-07
/// ```
///
/// Returns one entry per calendar day in the range, ascending, including
/// days with zero completions.
pub async fn completed_by_range(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> ApiResult<Envelope<Vec<CompletedPerDay>>> {
    let (start, end) = parse_range(&query, RANGE_PATH)?;

    let series = Task::completed_per_day(&state.db, start, end)
        .await
        .map_err(|e| {
            ApiError::internal_db(&tasktrack_shared::db::classify(&e)).at(RANGE_PATH)
        })?;

    Ok(Envelope::ok(RANGE_PATH, "Success", series))
}

/// Mean completion time over an inclusive date range
///
/// # Endpoint
///
/// ```text
/// GET /statistics/tasks-completed/average-time?startDate=2025-07-01&endDate=2025-07-07
/// ```
///
/// Averages (completedDate - createdAt) in hours over tasks completed in the
/// range, rounded to 2 decimal places. 404 `NO_COMPLETED_TASKS` when no task
/// qualifies.
pub async fn average_completion_time(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> ApiResult<Envelope<AverageCompletionData>> {
    let (start, end) = parse_range(&query, AVERAGE_PATH)?;

    let average = Task::average_completion_hours(&state.db, start, end)
        .await
        .map_err(|e| {
            ApiError::internal_db(&tasktrack_shared::db::classify(&e)).at(AVERAGE_PATH)
        })?
        .ok_or_else(|| {
            ApiError::not_found(
                "NO_COMPLETED_TASKS",
                "No completed tasks found in the given range",
            )
            .at(AVERAGE_PATH)
        })?;

    Ok(Envelope::ok(
        AVERAGE_PATH,
        "Success",
        AverageCompletionData {
            average_hours: average,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_requires_both_dates() {
        let query = DateRangeQuery {
            start_date: Some("2025-07-01".to_string()),
            end_date: None,
        };
        let err = parse_range(&query, RANGE_PATH).unwrap_err();
        assert_eq!(err.code, "MISSING_DATE_RANGE");
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_range_rejects_garbage() {
        let query = DateRangeQuery {
            start_date: Some("yesterday".to_string()),
            end_date: Some("2025-07-07".to_string()),
        };
        let err = parse_range(&query, RANGE_PATH).unwrap_err();
        assert_eq!(err.code, "INVALID_DATE_RANGE");
    }

    #[test]
    fn test_parse_range_accepts_timestamps() {
        let query = DateRangeQuery {
            start_date: Some("2025-07-01T08:00:00Z".to_string()),
            end_date: Some("2025-07-07".to_string()),
        };
        let (start, end) = parse_range(&query, RANGE_PATH).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 7, 7).unwrap());
    }
}
