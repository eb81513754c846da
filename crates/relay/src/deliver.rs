use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use formwork_core::config::{AppConfig, EmailJsCredentials, RelayMode};
use formwork_core::{DeliveryError, SubmissionDeliverer, SubmissionRecord};

use crate::payload::{mailto_uri, FlatSubmission};
use crate::provider::{HttpProviderClient, ProviderClient, ProviderSendRequest};

/// Collaborator that hands a composed `mailto:` URI to the local
/// user-agent. The relay never opens anything itself; the embedding layer
/// decides what "open" means. Invoking the composer is treated as success.
pub trait MailComposer: Send + Sync {
    fn compose(&self, uri: &str);
}

/// Default composer: announces the URI so the embedding layer (or an
/// operator tailing logs) can open it.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingMailComposer;

impl MailComposer for TracingMailComposer {
    fn compose(&self, uri: &str) {
        info!(event_name = "relay.mailto_composed", uri = %uri, "composed mailto fallback");
    }
}

/// One configured way of pushing a flattened submission over the network.
#[async_trait]
pub trait SendTransport: Send + Sync {
    async fn send(&self, template_params: &Map<String, Value>) -> Result<(), DeliveryError>;
}

/// Direct provider call with locally-held credentials.
pub struct DirectTransport<C = HttpProviderClient> {
    client: C,
    credentials: EmailJsCredentials,
}

impl<C> DirectTransport<C>
where
    C: ProviderClient,
{
    pub fn new(client: C, credentials: EmailJsCredentials) -> Self {
        Self { client, credentials }
    }
}

#[async_trait]
impl<C> SendTransport for DirectTransport<C>
where
    C: ProviderClient,
{
    async fn send(&self, template_params: &Map<String, Value>) -> Result<(), DeliveryError> {
        let request = ProviderSendRequest {
            service_id: Some(self.credentials.service_id.clone()),
            template_id: Some(self.credentials.template_id.clone()),
            user_id: Some(self.credentials.user_id.expose_secret().to_owned()),
            template_params: template_params.clone(),
        };

        let response = self.client.send(&request).await?;
        if !response.is_success() {
            return Err(DeliveryError::ProviderRejected {
                status: response.status,
                body: response.body,
            });
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ProxyRequest<'a> {
    #[serde(rename = "templateParams")]
    template_params: &'a Map<String, Value>,
}

/// Call through the server proxy, which holds the provider credentials.
pub struct ProxiedTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl ProxiedTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), endpoint: endpoint.into() }
    }
}

#[async_trait]
impl SendTransport for ProxiedTransport {
    async fn send(&self, template_params: &Map<String, Value>) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ProxyRequest { template_params })
            .send()
            .await
            .map_err(|error| DeliveryError::TransportFailure(error.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|error| DeliveryError::TransportFailure(error.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(DeliveryError::ProviderRejected { status, body });
        }
        Ok(())
    }
}

/// Which way a relay will push submissions, for readiness reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteKind {
    DirectProvider,
    Proxy,
    Mailto,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectProvider => "direct provider call",
            Self::Proxy => "server proxy",
            Self::Mailto => "mailto fallback",
        }
    }
}

enum RelayRoute {
    Transport(Arc<dyn SendTransport>),
    Mailto(Arc<dyn MailComposer>),
}

/// The single relay interface both call sites share. Route resolution
/// happens once at construction; `deliver` is a single attempt with no
/// retries and no duplicate suppression.
pub struct SubmissionRelay {
    route: RelayRoute,
    kind: RouteKind,
    recipient: String,
}

impl SubmissionRelay {
    /// Resolves the delivery route from configuration: complete direct
    /// credentials or a proxy URL select a network transport, anything
    /// else falls back to the mail composer.
    pub fn from_config(config: &AppConfig) -> Self {
        let recipient = config.relay.recipient.clone();
        match config.relay.mode {
            RelayMode::Direct => match config.provider.credentials() {
                Some(credentials) => {
                    let client = HttpProviderClient::new(config.provider.endpoint.clone());
                    Self::with_transport(
                        Arc::new(DirectTransport::new(client, credentials)),
                        RouteKind::DirectProvider,
                        recipient,
                    )
                }
                None => Self::with_composer(Arc::new(TracingMailComposer), recipient),
            },
            RelayMode::Proxied => match config.relay.proxy_url.as_deref() {
                Some(proxy_url) if !proxy_url.trim().is_empty() => Self::with_transport(
                    Arc::new(ProxiedTransport::new(proxy_url.trim())),
                    RouteKind::Proxy,
                    recipient,
                ),
                _ => Self::with_composer(Arc::new(TracingMailComposer), recipient),
            },
        }
    }

    pub fn with_transport(
        transport: Arc<dyn SendTransport>,
        kind: RouteKind,
        recipient: impl Into<String>,
    ) -> Self {
        Self { route: RelayRoute::Transport(transport), kind, recipient: recipient.into() }
    }

    pub fn with_composer(composer: Arc<dyn MailComposer>, recipient: impl Into<String>) -> Self {
        Self {
            route: RelayRoute::Mailto(composer),
            kind: RouteKind::Mailto,
            recipient: recipient.into(),
        }
    }

    pub fn route_kind(&self) -> RouteKind {
        self.kind
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    /// Flattens the record and pushes it down the resolved route. The
    /// mailto route cannot fail observably: once the composer is invoked
    /// the delivery counts as done.
    pub async fn deliver(&self, record: &SubmissionRecord) -> Result<(), DeliveryError> {
        let flat = FlatSubmission::from_record(record, &self.recipient);
        match &self.route {
            RelayRoute::Transport(transport) => transport.send(&flat.template_params()).await,
            RelayRoute::Mailto(composer) => {
                composer.compose(&mailto_uri(record, &self.recipient));
                Ok(())
            }
        }
    }
}

#[async_trait]
impl SubmissionDeliverer for SubmissionRelay {
    async fn deliver(&self, record: &SubmissionRecord) -> Result<(), DeliveryError> {
        SubmissionRelay::deliver(self, record).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use secrecy::SecretString;

    use formwork_core::config::{AppConfig, EmailJsCredentials, RelayMode};
    use formwork_core::{DeliveryError, SubmissionRecord};

    use crate::deliver::{DirectTransport, MailComposer, RouteKind, SubmissionRelay};
    use crate::provider::{ProviderClient, ProviderResponse, ProviderSendRequest};

    #[derive(Default)]
    struct ScriptedProviderClient {
        responses: Mutex<VecDeque<Result<ProviderResponse, DeliveryError>>>,
        requests: Mutex<Vec<ProviderSendRequest>>,
    }

    impl ScriptedProviderClient {
        fn with_responses(responses: Vec<Result<ProviderResponse, DeliveryError>>) -> Self {
            Self { responses: Mutex::new(responses.into()), requests: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl ProviderClient for ScriptedProviderClient {
        async fn send(
            &self,
            request: &ProviderSendRequest,
        ) -> Result<ProviderResponse, DeliveryError> {
            self.requests.lock().expect("requests lock").push(request.clone());
            self.responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .unwrap_or(Ok(ProviderResponse { status: 200, body: "OK".to_owned() }))
        }
    }

    #[derive(Default)]
    struct RecordingComposer {
        composed: Mutex<Vec<String>>,
    }

    impl MailComposer for RecordingComposer {
        fn compose(&self, uri: &str) {
            self.composed.lock().expect("composed lock").push(uri.to_owned());
        }
    }

    fn credentials() -> EmailJsCredentials {
        EmailJsCredentials {
            service_id: "service_abc".to_owned(),
            template_id: "template_contact".to_owned(),
            user_id: SecretString::from("user_xyz".to_owned()),
        }
    }

    fn record_with_name(name: &str) -> SubmissionRecord {
        SubmissionRecord { name: name.to_owned(), ..Default::default() }
    }

    #[tokio::test]
    async fn direct_route_posts_credentials_and_flattened_params() {
        let client = Arc::new(ScriptedProviderClient::default());
        let relay = SubmissionRelay::with_transport(
            Arc::new(DirectTransport::new(client.clone(), credentials())),
            RouteKind::DirectProvider,
            "partners@example.com",
        );

        relay.deliver(&record_with_name("Acme")).await.expect("delivery succeeds");

        let requests = client.requests.lock().expect("requests lock");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].service_id.as_deref(), Some("service_abc"));
        assert_eq!(requests[0].template_id.as_deref(), Some("template_contact"));
        assert_eq!(requests[0].user_id.as_deref(), Some("user_xyz"));
        assert_eq!(requests[0].template_params["to_email"], "partners@example.com");
        assert_eq!(requests[0].template_params["name"], "Acme");
    }

    #[tokio::test]
    async fn provider_rejection_carries_status_and_body() {
        let client = Arc::new(ScriptedProviderClient::with_responses(vec![Ok(
            ProviderResponse { status: 500, body: "rate limited".to_owned() },
        )]));
        let relay = SubmissionRelay::with_transport(
            Arc::new(DirectTransport::new(client, credentials())),
            RouteKind::DirectProvider,
            "partners@example.com",
        );

        let error = relay
            .deliver(&record_with_name("Acme"))
            .await
            .expect_err("non-success status is a rejection");

        assert_eq!(
            error,
            DeliveryError::ProviderRejected { status: 500, body: "rate limited".to_owned() }
        );
    }

    #[tokio::test]
    async fn transport_failures_pass_through_unchanged() {
        let client = Arc::new(ScriptedProviderClient::with_responses(vec![Err(
            DeliveryError::TransportFailure("dns failure".to_owned()),
        )]));
        let relay = SubmissionRelay::with_transport(
            Arc::new(DirectTransport::new(client, credentials())),
            RouteKind::DirectProvider,
            "partners@example.com",
        );

        let error = relay.deliver(&record_with_name("Acme")).await.expect_err("transport fails");
        assert_eq!(error, DeliveryError::TransportFailure("dns failure".to_owned()));
    }

    #[tokio::test]
    async fn missing_credentials_route_to_the_composer_without_network_calls() {
        let composer = Arc::new(RecordingComposer::default());
        let relay = SubmissionRelay::with_composer(composer.clone(), "partners@example.com");

        relay.deliver(&record_with_name("Acme")).await.expect("mailto path always succeeds");

        let composed = composer.composed.lock().expect("composed lock");
        assert_eq!(composed.len(), 1);
        assert!(composed[0].starts_with("mailto:partners@example.com?"));
        assert!(composed[0].contains("Partnership%20Request%20from%20Acme"));
        // Every flattened field lands in the body as `key: value`.
        let to_email_line = urlencoding::encode("to_email: partners@example.com").into_owned();
        assert!(composed[0].contains(&to_email_line));
        assert!(composed[0].contains(&urlencoding::encode("name: Acme").into_owned()));
    }

    #[tokio::test]
    async fn wizard_submit_through_the_unconfigured_relay_composes_mail() {
        use formwork_core::{FieldName, FieldUpdate, IntakeController, SubmitOutcome, WizardStep};

        let mut controller = IntakeController::new();
        let updates = [
            FieldUpdate::SetScalar { field: FieldName::Name, value: "Acme".to_owned() },
            FieldUpdate::SetScalar { field: FieldName::Industry, value: "SaaS".to_owned() },
            FieldUpdate::SetScalar {
                field: FieldName::CompanySize,
                value: "1-10 employees".to_owned(),
            },
            FieldUpdate::ToggleLabel {
                field: FieldName::ProjectType,
                label: "UI/UX Design".to_owned(),
            },
            FieldUpdate::ToggleLabel {
                field: FieldName::Challenges,
                label: "Performance issues".to_owned(),
            },
            FieldUpdate::ToggleLabel {
                field: FieldName::Goals,
                label: "Accelerate growth".to_owned(),
            },
            FieldUpdate::SetScalar { field: FieldName::Email, value: "a@b.co".to_owned() },
            FieldUpdate::SetScalar { field: FieldName::PreferredContact, value: "chat".to_owned() },
            FieldUpdate::SetScalar { field: FieldName::Budget, value: "discuss".to_owned() },
        ];
        for update in &updates {
            controller.apply(update).expect("update applies");
        }
        for _ in 0..4 {
            controller.advance().expect("advance runs");
        }

        let composer = Arc::new(RecordingComposer::default());
        let relay = SubmissionRelay::with_composer(composer.clone(), "partners@example.com");

        let outcome = controller.submit(&relay).await.expect("submit runs");
        assert!(matches!(outcome, SubmitOutcome::Delivered { .. }));
        assert_eq!(controller.current_step(), WizardStep::Success);
        assert!(!controller.state().submission_in_flight);

        let composed = composer.composed.lock().expect("composed lock");
        assert_eq!(composed.len(), 1);
        assert!(composed[0].contains(&urlencoding::encode("email: a@b.co").into_owned()));
        assert!(composed[0].contains(&urlencoding::encode("budget: discuss").into_owned()));
    }

    #[test]
    fn route_resolution_follows_mode_and_credentials() {
        let mut config = AppConfig::default();
        assert_eq!(
            SubmissionRelay::from_config(&config).route_kind(),
            RouteKind::Mailto,
            "direct mode without credentials falls back to mailto"
        );

        config.provider.service_id = Some("service_abc".to_owned());
        config.provider.template_id = Some("template_contact".to_owned());
        config.provider.public_key = Some(SecretString::from("public_key_value".to_owned()));
        assert_eq!(
            SubmissionRelay::from_config(&config).route_kind(),
            RouteKind::DirectProvider
        );

        config.relay.mode = RelayMode::Proxied;
        config.relay.proxy_url = Some("https://formwork.dev/api/v1/email/send".to_owned());
        assert_eq!(SubmissionRelay::from_config(&config).route_kind(), RouteKind::Proxy);
    }
}
