use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Duration;

use crate::state::AppState;

const DB_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let db_ok = match &state.db_pool {
        // Bounded so the probe answers even when the first connect hangs.
        Some(pool) => match tokio::time::timeout(
            DB_PROBE_TIMEOUT,
            sqlx::query("SELECT 1").fetch_one(pool),
        )
        .await
        {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Health check DB query failed");
                false
            }
            Err(_) => {
                tracing::error!("Health check DB query timed out (3s)");
                false
            }
        },
        None => true,
    };

    let status = if db_ok { "ok" } else { "degraded" };
    Json(json!({
        "status": status,
        "now": Utc::now().to_rfc3339(),
        "db": db_ok,
        "mock": state.config.heating_bill_use_mock
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::State;

    use super::health;
    use crate::config::AppConfig;
    use crate::state::AppState;

    #[tokio::test]
    async fn healthy_without_database() {
        let state = AppState {
            config: Arc::new(AppConfig::from_lookup(|_| None)),
            db_pool: None,
        };
        let body = health(State(state)).await.0;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["db"], true);
        assert_eq!(body["mock"], false);
    }
}
