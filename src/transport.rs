//! Transport layer: the seam between the client and the sandbox endpoint.

pub mod http;

pub use http::{HttpTransport, TransportError};

use crate::types::ClassificationRequest;
use crate::Result;
use async_trait::async_trait;

/// One outbound sandbox call: the wire body plus the per-task header value.
#[derive(Debug, Clone, Copy)]
pub struct SandboxCall<'a> {
    /// Sent as `X-Function-Name`.
    pub function_name: &'a str,
    pub request: &'a ClassificationRequest,
}

/// Anything that can deliver a [`SandboxCall`] and return the model's raw text.
///
/// [`HttpTransport`] is the production implementation; tests substitute
/// in-process stubs to control latency and failures.
#[async_trait]
pub trait SandboxInvoker: Send + Sync {
    async fn invoke(&self, call: SandboxCall<'_>) -> Result<String>;
}
