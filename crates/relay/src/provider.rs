use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use formwork_core::DeliveryError;

/// JSON body of the EmailJS send call. Identifiers are optional because the
/// proxy forwards whatever it holds and mirrors the provider's verdict;
/// absent identifiers are omitted from the serialized body.
#[derive(Clone, Debug, Serialize)]
pub struct ProviderSendRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub template_params: Map<String, Value>,
}

/// Raw provider verdict. The body text is opaque: success payloads and
/// rejection details are both passed through unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: String,
}

impl ProviderResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Seam over the provider HTTP call so callers and tests can script the
/// provider's behavior.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn send(&self, request: &ProviderSendRequest) -> Result<ProviderResponse, DeliveryError>;
}

#[async_trait]
impl<T> ProviderClient for std::sync::Arc<T>
where
    T: ProviderClient + ?Sized,
{
    async fn send(&self, request: &ProviderSendRequest) -> Result<ProviderResponse, DeliveryError> {
        (**self).send(request).await
    }
}

pub struct HttpProviderClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpProviderClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), endpoint: endpoint.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn send(&self, request: &ProviderSendRequest) -> Result<ProviderResponse, DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|error| DeliveryError::TransportFailure(error.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|error| DeliveryError::TransportFailure(error.to_string()))?;

        Ok(ProviderResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};

    use crate::provider::{ProviderResponse, ProviderSendRequest};

    #[test]
    fn absent_identifiers_are_omitted_from_the_body() {
        let request = ProviderSendRequest {
            service_id: Some("service_abc".to_owned()),
            template_id: None,
            user_id: None,
            template_params: Map::new(),
        };

        let body = serde_json::to_value(&request).expect("request serializes");
        assert_eq!(body, json!({ "service_id": "service_abc", "template_params": {} }));
    }

    #[test]
    fn only_2xx_statuses_count_as_success() {
        assert!(ProviderResponse { status: 200, body: "OK".to_owned() }.is_success());
        assert!(ProviderResponse { status: 202, body: String::new() }.is_success());
        assert!(!ProviderResponse { status: 400, body: String::new() }.is_success());
        assert!(!ProviderResponse { status: 500, body: String::new() }.is_success());
    }
}
