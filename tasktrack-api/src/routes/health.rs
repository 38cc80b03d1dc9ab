/// Health check endpoint
///
/// `GET /health` is the one route outside the response envelope: load
/// balancers and uptime probes want a flat body and a status code, nothing
/// else. The database probe reuses the same check the pool runs at startup,
/// so "connected" here means real round-trip connectivity, not just a
/// non-empty pool.

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tasktrack_shared::db::pool;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

impl HealthResponse {
    fn report(database_up: bool) -> Self {
        let (status, database) = if database_up {
            ("healthy", "connected")
        } else {
            ("degraded", "disconnected")
        };

        Self {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
        }
    }
}

/// Reports liveness and database connectivity
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_up = pool::health_check(&state.db).await.is_ok();
    if !database_up {
        tracing::warn!("health check could not reach the database");
    }

    Json(HealthResponse::report(database_up))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_reflects_database_state() {
        let up = HealthResponse::report(true);
        assert_eq!(up.status, "healthy");
        assert_eq!(up.database, "connected");

        let down = HealthResponse::report(false);
        assert_eq!(down.status, "degraded");
        assert_eq!(down.database, "disconnected");
    }
}
