//! Submission Relay - delivery of completed intake records
//!
//! This crate takes a validated `SubmissionRecord` and gets it to the
//! partnerships inbox:
//! - **Flattening** (`payload`) - record fields to the flat `key: value`
//!   map the email template consumes, plus the `mailto:` composer payload
//! - **Provider client** (`provider`) - the EmailJS send endpoint call
//! - **Routing** (`deliver`) - one `SubmissionRelay` covering the direct
//!   provider call, the credential-hiding server proxy, and the local
//!   mail-composer fallback
//!
//! # Route selection
//!
//! ```text
//! direct mode + complete credentials  → provider endpoint
//! proxied mode + proxy URL            → server proxy endpoint
//! anything else                       → mailto composer (always succeeds)
//! ```
//!
//! One delivery is one attempt: there is no retry, queueing, or duplicate
//! suppression. A failure surfaces to the wizard and the visitor re-submits.

pub mod deliver;
pub mod payload;
pub mod provider;

pub use deliver::{
    DirectTransport, MailComposer, ProxiedTransport, RouteKind, SendTransport, SubmissionRelay,
    TracingMailComposer,
};
pub use payload::{mailto_uri, FlatSubmission};
pub use provider::{HttpProviderClient, ProviderClient, ProviderResponse, ProviderSendRequest};
