//! Credential-hiding relay endpoint.
//!
//! `POST /api/v1/email/send` accepts `{ "templateParams": { ... } }`,
//! injects the process-private EmailJS identifiers, forwards to the
//! provider, and mirrors the provider's verdict: `200` with the provider's
//! raw body on success, `500` with the raw body on rejection, `500` with a
//! generic line on transport failure. Non-POST methods get `405`; a body
//! that is not JSON gets `400` before anything is forwarded. Failure detail
//! stays in the server logs, never in the response.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Router};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use formwork_core::config::AppConfig;
use formwork_core::DeliveryError;
use formwork_relay::{HttpProviderClient, ProviderClient, ProviderSendRequest};

#[derive(Clone)]
pub struct SendState {
    provider: Arc<dyn ProviderClient>,
    service_id: Option<String>,
    template_id: Option<String>,
    user_id: Option<String>,
}

impl SendState {
    pub fn from_config(config: &AppConfig) -> Self {
        let provider = Arc::new(HttpProviderClient::new(config.provider.endpoint.clone()));
        Self::new(provider, config)
    }

    /// Identifiers may be absent: the request is forwarded as-is and the
    /// provider's rejection is mirrored, exactly like the original relay.
    pub fn new(provider: Arc<dyn ProviderClient>, config: &AppConfig) -> Self {
        let user_id = [&config.provider.user_id, &config.provider.public_key]
            .into_iter()
            .flatten()
            .map(|secret| secret.expose_secret().to_owned())
            .find(|value| !value.trim().is_empty());

        Self {
            provider,
            service_id: config.provider.service_id.clone(),
            template_id: config.provider.template_id.clone(),
            user_id,
        }
    }
}

pub fn router(state: SendState) -> Router {
    Router::new().route("/api/v1/email/send", post(send_email)).with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct SendRequest {
    #[serde(rename = "templateParams", default)]
    template_params: Map<String, Value>,
}

async fn send_email(State(state): State<SendState>, body: String) -> (StatusCode, String) {
    let correlation_id = Uuid::new_v4().simple().to_string();

    // An empty body means an empty parameter map, not a parse error.
    let raw = if body.trim().is_empty() { "{}" } else { body.as_str() };
    let request: SendRequest = match serde_json::from_str(raw) {
        Ok(request) => request,
        Err(parse_error) => {
            warn!(
                event_name = "relay.proxy.invalid_json",
                correlation_id = %correlation_id,
                error = %parse_error,
                "rejected request body"
            );
            return (StatusCode::BAD_REQUEST, "Invalid JSON".to_owned());
        }
    };

    let provider_request = ProviderSendRequest {
        service_id: state.service_id.clone(),
        template_id: state.template_id.clone(),
        user_id: state.user_id.clone(),
        template_params: request.template_params,
    };

    match state.provider.send(&provider_request).await {
        Ok(response) if response.is_success() => {
            info!(
                event_name = "relay.proxy.delivered",
                correlation_id = %correlation_id,
                status = response.status,
                "provider accepted submission"
            );
            (StatusCode::OK, response.body)
        }
        Ok(response) => {
            error!(
                event_name = "relay.proxy.provider_rejected",
                correlation_id = %correlation_id,
                status = response.status,
                "provider rejected submission"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, response.body)
        }
        Err(delivery_error) => {
            error!(
                event_name = "relay.proxy.transport_failure",
                correlation_id = %correlation_id,
                error = %delivery_error,
                "provider call failed"
            );
            let message = match delivery_error {
                DeliveryError::TransportFailure(message) => message,
                other => other.to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Server error sending email: {message}"))
        }
    }
}
