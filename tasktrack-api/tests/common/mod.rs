/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup (migrations included)
/// - A router wired to the test database
/// - Request helpers that return the parsed envelope
/// - Marker-scoped cleanup so parallel tests do not step on each other
///
/// Tests need a running PostgreSQL reachable via `DATABASE_URL`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use tasktrack_api::app::{build_router, AppState};
use tasktrack_api::config::{ApiConfig, Config, DatabaseConfig};
use tower::Service as _;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,

    /// Unique token embedded in every name/email this context creates, so
    /// searches can be scoped and cleanup can find the rows again
    pub marker: String,
}

impl TestContext {
    /// Creates a new test context against the configured database
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL")?;

        let db = PgPool::connect(&database_url).await?;

        // Path relative to Cargo.toml, not this file
        sqlx::migrate!("../migrations").run(&db).await?;

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: 5,
            },
        };

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        let marker = Uuid::new_v4().simple().to_string();

        Ok(TestContext { db, app, marker })
    }

    /// Sends a request with an optional JSON body and parses the response
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).unwrap();

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    /// Creates a user through the API and returns its id
    pub async fn create_user(&self, name: &str) -> Uuid {
        let email = format!("{name}-{}@{}.test", Uuid::new_v4().simple(), self.marker);
        let (status, body) = self
            .send(
                "POST",
                "/users",
                Some(serde_json::json!({
                    "name": format!("{name}-{}", self.marker),
                    "lastName": "Perez",
                    "secondLastName": "Martinez",
                    "email": email,
                    "role": "user",
                    "status": "enabled"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "user create failed: {body}");

        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    /// Creates a task through the API and returns its id
    pub async fn create_task(
        &self,
        name: &str,
        status_label: &str,
        assignees: &[Uuid],
    ) -> Uuid {
        let (status, body) = self
            .send(
                "POST",
                "/tasks",
                Some(serde_json::json!({
                    "name": format!("{name}-{}", self.marker),
                    "description": "integration test task",
                    "estimatedTime": "2.50",
                    "limitDate": "2025-07-15T12:00:00Z",
                    "status": status_label,
                    "cost": "100.00",
                    "currency": "MXN",
                    "taskUsers": assignees,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "task create failed: {body}");

        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    /// Deletes every row this context created
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        let task_pattern = format!("%-{}", self.marker);
        let email_pattern = format!("%@{}.test", self.marker);

        sqlx::query(
            "DELETE FROM task_users WHERE task_id IN (SELECT id FROM tasks WHERE name LIKE $1)",
        )
        .bind(&task_pattern)
        .execute(&self.db)
        .await?;
        sqlx::query(
            "DELETE FROM task_users WHERE user_id IN (SELECT id FROM users WHERE email LIKE $1)",
        )
        .bind(&email_pattern)
        .execute(&self.db)
        .await?;
        sqlx::query("DELETE FROM tasks WHERE name LIKE $1")
            .bind(&task_pattern)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM users WHERE email LIKE $1")
            .bind(&email_pattern)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
