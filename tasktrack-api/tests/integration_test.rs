/// Integration tests for the TaskTrack API
///
/// These tests verify the full system works end-to-end:
/// - Response envelope shape and error codes
/// - User creation, duplicate email handling, list pagination and aggregates
/// - Task lifecycle (create with assignees, sparse update, reconciliation,
///   delete with assignment guard)
/// - Completed-task statistics
///
/// They need a running PostgreSQL reachable via `DATABASE_URL` and are
/// ignored by default; run them with `cargo test -- --ignored`.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::TestContext;
use serde_json::json;

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send("GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_create_user_envelope() {
    let ctx = TestContext::new().await.unwrap();

    let email = format!("create-test@{}.test", ctx.marker);
    let (status, body) = ctx
        .send(
            "POST",
            "/users",
            Some(json!({
                "name": format!("Juan-{}", ctx.marker),
                "lastName": "Perez",
                "secondLastName": "Martinez",
                "email": email,
                "role": "admin",
                "status": "enabled"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["path"], "/users");
    assert!(body["timestamp"].is_string());
    assert!(body.get("error").is_none());

    let data = &body["data"];
    assert_eq!(data["lastName"], "Perez");
    assert_eq!(data["secondLastName"], "Martinez");
    assert_eq!(data["email"], email);
    assert_eq!(data["role"], "admin");
    assert_eq!(data["status"], "enabled");
    assert_eq!(data["tasksCompletedCount"], 0);
    assert_eq!(data["tasksCompletedCost"], "0");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_duplicate_email_is_conflict() {
    let ctx = TestContext::new().await.unwrap();

    let payload = json!({
        "name": format!("Dup-{}", ctx.marker),
        "lastName": "Perez",
        "secondLastName": "Martinez",
        "email": format!("duplicate@{}.test", ctx.marker),
        "role": "user",
        "status": "enabled"
    });

    let (first, _) = ctx.send("POST", "/users", Some(payload.clone())).await;
    assert_eq!(first, StatusCode::CREATED);

    let (second, body) = ctx.send("POST", "/users", Some(payload)).await;
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["statusCode"], 409);
    assert_eq!(body["error"], "EMAIL_ALREADY_EXISTS");
    assert_eq!(body["path"], "/users");
    assert!(body.get("data").is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_unknown_role_is_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .send(
            "POST",
            "/users",
            Some(json!({
                "name": format!("Bad-{}", ctx.marker),
                "lastName": "Perez",
                "secondLastName": "Martinez",
                "email": format!("badrole@{}.test", ctx.marker),
                "role": "superuser",
                "status": "enabled"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_ROLE_OR_STATUS");

    let (status, body) = ctx
        .send("GET", "/users?role=superuser", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_ROLE_OR_STATUS");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_list_users_pagination_reports_full_total() {
    let ctx = TestContext::new().await.unwrap();

    for name in ["alice", "bob", "carol"] {
        ctx.create_user(name).await;
    }

    let uri = format!("/users?search={}&limit=2&page=1", ctx.marker);
    let (status, body) = ctx.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["users"].as_array().unwrap().len(), 2);
    assert_eq!(data["page"], 1);
    assert_eq!(data["limit"], 2);
    // total counts matches before pagination, not the page size
    assert_eq!(data["total"], 3);

    let uri = format!("/users?search={}&limit=2&page=2", ctx.marker);
    let (_, body) = ctx.send("GET", &uri, None).await;
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["total"], 3);

    // Invalid paging values fall back to the defaults
    let uri = format!("/users?search={}&limit=0&page=-2", ctx.marker);
    let (_, body) = ctx.send("GET", &uri, None).await;
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["limit"], 10);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_user_aggregates_count_only_completed_tasks() {
    let ctx = TestContext::new().await.unwrap();

    let user = ctx.create_user("worker").await;
    ctx.create_task("done", "completed", &[user]).await;
    ctx.create_task("open", "active", &[user]).await;

    let uri = format!("/users?search={}", ctx.marker);
    let (_, body) = ctx.send("GET", &uri, None).await;
    let users = body["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["tasksCompletedCount"], 1);
    assert_eq!(users[0]["tasksCompletedCost"], "100.00");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_create_task_with_assignees() {
    let ctx = TestContext::new().await.unwrap();

    let a = ctx.create_user("assignee-a").await;
    let b = ctx.create_user("assignee-b").await;

    let (status, body) = ctx
        .send(
            "POST",
            "/tasks",
            Some(json!({
                "name": format!("ship-{}", ctx.marker),
                "description": "ship the release",
                "estimatedTime": "8.00",
                "limitDate": "2025-07-20T00:00:00Z",
                "status": "active",
                "cost": "350.75",
                "currency": "MXN",
                "taskUsers": [a, b]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let data = &body["data"];
    assert_eq!(data["status"], "active");
    assert!(data["completedDate"].is_null());
    assert_eq!(data["cost"], "350.75");
    assert_eq!(data["currency"], "MXN");
    assert_eq!(data["taskUsers"].as_array().unwrap().len(), 2);

    // A task created as completed gets its completion date stamped
    let (_, body) = ctx
        .send(
            "POST",
            "/tasks",
            Some(json!({
                "name": format!("done-{}", ctx.marker),
                "description": "already done",
                "estimatedTime": "1.00",
                "limitDate": "2025-07-20T00:00:00Z",
                "status": "completed",
                "cost": "10.00",
                "currency": "MXN",
                "taskUsers": []
            })),
        )
        .await;
    assert!(body["data"]["completedDate"].is_string());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_create_task_with_unknown_user_leaves_no_orphan() {
    let ctx = TestContext::new().await.unwrap();

    let task_name = format!("orphan-{}", ctx.marker);
    let (status, body) = ctx
        .send(
            "POST",
            "/tasks",
            Some(json!({
                "name": task_name,
                "description": "should roll back",
                "estimatedTime": "1.00",
                "limitDate": "2025-07-20T00:00:00Z",
                "status": "active",
                "cost": "10.00",
                "currency": "MXN",
                "taskUsers": [uuid::Uuid::new_v4()]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "USER_NOT_FOUND");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE name = $1")
        .bind(&task_name)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(count, 0, "task row must not survive the rollback");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_update_task_sparse_fields_and_completion_stamp() {
    let ctx = TestContext::new().await.unwrap();

    let task = ctx.create_task("sparse", "active", &[]).await;

    // cost = 0 is a real update, other fields stay untouched
    let (status, body) = ctx
        .send("PUT", &format!("/tasks/{task}"), Some(json!({ "cost": "0" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cost"], "0.00");
    assert_eq!(body["data"]["name"], format!("sparse-{}", ctx.marker));

    // Completing stamps the date
    let (_, body) = ctx
        .send(
            "PUT",
            &format!("/tasks/{task}"),
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(body["data"]["status"], "completed");
    assert!(body["data"]["completedDate"].is_string());

    // Re-activating clears it
    let (_, body) = ctx
        .send(
            "PUT",
            &format!("/tasks/{task}"),
            Some(json!({ "status": "active" })),
        )
        .await;
    assert_eq!(body["data"]["status"], "active");
    assert!(body["data"]["completedDate"].is_null());

    // Unknown task id
    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/tasks/{}", uuid::Uuid::new_v4()),
            Some(json!({ "cost": "1" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "TASK_NOT_FOUND");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_update_task_replaces_assignment_set() {
    let ctx = TestContext::new().await.unwrap();

    let a = ctx.create_user("keep").await;
    let b = ctx.create_user("drop").await;
    let c = ctx.create_user("add").await;
    let task = ctx.create_task("reassign", "active", &[a, b]).await;

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/tasks/{task}"),
            Some(json!({ "taskUsers": [a, c] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut ids: Vec<String> = body["data"]["taskUsers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    let mut expected = vec![a.to_string(), c.to_string()];
    expected.sort();
    assert_eq!(ids, expected);

    // An empty set removes every assignment
    let (_, body) = ctx
        .send(
            "PUT",
            &format!("/tasks/{task}"),
            Some(json!({ "taskUsers": [] })),
        )
        .await;
    assert!(body["data"]["taskUsers"].as_array().unwrap().is_empty());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_delete_task_guarded_by_assignments() {
    let ctx = TestContext::new().await.unwrap();

    let user = ctx.create_user("blocker").await;
    let task = ctx.create_task("deletable", "active", &[user]).await;

    let (status, body) = ctx.send("DELETE", &format!("/tasks/{task}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "TASK_HAS_USERS");
    assert_eq!(body["statusCode"], 409);

    // Remove assignments, then delete succeeds
    ctx.send(
        "PUT",
        &format!("/tasks/{task}"),
        Some(json!({ "taskUsers": [] })),
    )
    .await;
    let (status, _) = ctx.send("DELETE", &format!("/tasks/{task}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.send("DELETE", &format!("/tasks/{task}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "TASK_NOT_FOUND");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_list_tasks_filters() {
    let ctx = TestContext::new().await.unwrap();

    let user = ctx.create_user("filtered").await;
    ctx.create_task("active-one", "active", &[user]).await;
    ctx.create_task("finished-one", "completed", &[]).await;

    // Status filter
    let uri = format!("/tasks?search={}&status=completed", ctx.marker);
    let (_, body) = ctx.send("GET", &uri, None).await;
    let tasks = body["data"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["status"], "completed");

    // Assigned-user filter
    let uri = format!("/tasks?search={}&userId={}", ctx.marker, user);
    let (_, body) = ctx.send("GET", &uri, None).await;
    let tasks = body["data"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["name"], format!("active-one-{}", ctx.marker));

    // Deadline-day filter; both fixtures use 2025-07-15
    let uri = format!("/tasks?search={}&limitDate=2025-07-15", ctx.marker);
    let (_, body) = ctx.send("GET", &uri, None).await;
    assert_eq!(body["data"]["total"], 2);

    let uri = format!("/tasks?search={}&limitDate=2025-07-16", ctx.marker);
    let (_, body) = ctx.send("GET", &uri, None).await;
    assert_eq!(body["data"]["total"], 0);

    // Search matches assigned user names too
    let uri = format!("/tasks?search=filtered-{}", ctx.marker);
    let (_, body) = ctx.send("GET", &uri, None).await;
    assert_eq!(body["data"]["total"], 1);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_statistics_range_is_dense() {
    let ctx = TestContext::new().await.unwrap();

    // Completed today via the server-side stamp
    ctx.create_task("stat", "completed", &[]).await;

    let today = Utc::now().date_naive();
    let start = today - Duration::days(1);
    let end = today + Duration::days(1);

    let uri = format!(
        "/statistics/tasks-completed/range?startDate={start}&endDate={end}"
    );
    let (status, body) = ctx.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let series = body["data"].as_array().unwrap();
    assert_eq!(series.len(), 3, "one entry per day, zero days included");
    assert_eq!(series[0]["date"], start.to_string());
    assert_eq!(series[2]["date"], end.to_string());
    assert!(series[1]["count"].as_i64().unwrap() >= 1);
    // The future day cannot have completions
    assert_eq!(series[2]["count"], 0);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_statistics_average_time() {
    let ctx = TestContext::new().await.unwrap();

    ctx.create_task("avg", "completed", &[]).await;

    let today = Utc::now().date_naive();
    let uri = format!(
        "/statistics/tasks-completed/average-time?startDate={today}&endDate={today}"
    );
    let (status, body) = ctx.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["averageHours"].is_string());

    // A range with no completions is a 404
    let uri = "/statistics/tasks-completed/average-time?startDate=1990-01-01&endDate=1990-01-02";
    let (status, body) = ctx.send("GET", uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NO_COMPLETED_TASKS");

    // Missing parameters are rejected up front
    let (status, body) = ctx
        .send("GET", "/statistics/tasks-completed/average-time", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_DATE_RANGE");

    ctx.cleanup().await.unwrap();
}
