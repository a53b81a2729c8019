use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::instrument;

use crate::config::ObservabilityConfig;

/// Service identity reported by the health endpoint
#[derive(Debug, Clone)]
pub struct HealthState {
    pub service_name: String,
    pub service_version: String,
}

impl From<&ObservabilityConfig> for HealthState {
    fn from(config: &ObservabilityConfig) -> Self {
        Self {
            service_name: config.service_name.clone(),
            service_version: config.service_version.clone(),
        }
    }
}

/// Health check endpoint handler
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<Arc<HealthState>>) -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": state.service_name,
        "version": state.service_version,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let state = Arc::new(HealthState {
            service_name: "petlisting-staging".to_string(),
            service_version: "9.9.9".to_string(),
        });

        let Json(body) = health_check(State(state)).await.unwrap();

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "petlisting-staging");
        assert_eq!(body["version"], "9.9.9");
        assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
    }
}
