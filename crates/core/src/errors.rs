use thiserror::Error;

/// Failure vocabulary for one delivery attempt. There is no retry layer on
/// top of this: a failed delivery surfaces to the wizard and the user
/// re-triggers submission manually.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The provider answered with a non-success status; `body` is the raw
    /// response text passed through for the banner message.
    #[error("email provider rejected the request: {status} {body}")]
    ProviderRejected { status: u16, body: String },
    /// The request never completed (connection refused, DNS failure, ...).
    #[error("email delivery transport failed: {0}")]
    TransportFailure(String),
}

#[cfg(test)]
mod tests {
    use super::DeliveryError;

    #[test]
    fn provider_rejection_display_carries_the_response_body() {
        let error = DeliveryError::ProviderRejected { status: 500, body: "rate limited".to_owned() };
        assert!(error.to_string().contains("rate limited"));
        assert!(error.to_string().contains("500"));
    }

    #[test]
    fn transport_failure_display_carries_the_underlying_message() {
        let error = DeliveryError::TransportFailure("connection refused".to_owned());
        assert!(error.to_string().contains("connection refused"));
    }
}
