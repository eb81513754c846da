use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use formwork_core::config::AppConfig;

#[derive(Clone)]
pub struct HealthState {
    delivery_configured: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub delivery: HealthCheck,
    pub checked_at: String,
}

pub fn router(config: &AppConfig) -> Router {
    let state = HealthState { delivery_configured: config.provider.credentials().is_some() };
    Router::new().route("/health", get(health)).with_state(state)
}

/// Both delivery routes are legitimate, so the endpoint reports `ready`
/// either way; the delivery check tells operators which route is active.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let delivery = if state.delivery_configured {
        HealthCheck {
            status: "configured",
            detail: "provider credentials present; submissions go to the provider".to_string(),
        }
    } else {
        HealthCheck {
            status: "fallback",
            detail: "provider credentials absent; submissions use the mailto fallback"
                .to_string(),
        }
    };

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "formwork-server runtime initialized".to_string(),
        },
        delivery,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
