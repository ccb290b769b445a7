use super::{SandboxCall, SandboxInvoker};
use crate::config::ClientConfig;
use crate::types::InvokeResponse;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Proxy;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const HEADER_FUNCTION_NAME: &str = "x-function-name";
pub const HEADER_PLATFORM_ID: &str = "x-platform-id";

/// reqwest-backed sandbox transport. Cheap to share behind an `Arc`; the
/// underlying connection pool is reused across calls.
///
/// Only connecting is bounded here. The per-request deadline belongs to the
/// caller, so that a per-call timeout may be longer than the configured one.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    platform_id: String,
    auth_token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = &config.proxy {
            let proxy = Proxy::all(proxy_url)
                .map_err(|e| Error::configuration(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            platform_id: config.platform_id.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn headers(&self, function_name: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HEADER_FUNCTION_NAME, header_value(function_name)?);
        headers.insert(HEADER_PLATFORM_ID, header_value(&self.platform_id)?);
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::validation(format!("invalid header value '{}'", value)))
}

#[async_trait]
impl SandboxInvoker for HttpTransport {
    async fn invoke(&self, call: SandboxCall<'_>) -> Result<String> {
        let start = Instant::now();
        debug!(
            function = call.function_name,
            model = call.request.model_name.as_str(),
            temperature = call.request.temperature,
            instance_id = call.request.instance_id.as_str(),
            prompt_chars = call.request.user_prompt.chars().count(),
            "sandbox request"
        );

        let mut req = self
            .client
            .post(&self.endpoint)
            .headers(self.headers(call.function_name)?)
            .json(call.request);
        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await.map_err(|e| {
            warn!(
                function = call.function_name,
                duration_ms = start.elapsed().as_millis() as u64,
                error = %e,
                "sandbox request failed to send"
            );
            Error::Transport(TransportError::Http(e))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        let parsed = serde_json::from_str::<InvokeResponse>(&body).ok();

        if !status.is_success() {
            let message = parsed
                .as_ref()
                .and_then(InvokeResponse::detail_message)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            warn!(
                function = call.function_name,
                http_status = status.as_u16(),
                duration_ms = start.elapsed().as_millis() as u64,
                message = message.as_str(),
                "sandbox returned an error"
            );
            return Err(Error::Remote {
                status: status.as_u16(),
                message,
            });
        }

        info!(
            function = call.function_name,
            http_status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "sandbox request completed"
        );

        let parsed = parsed.ok_or_else(|| {
            Error::MalformedResponse(format!(
                "response body is not a JSON object ({} bytes)",
                body.len()
            ))
        })?;
        let detail = parsed.detail_message();
        match (parsed.response, detail) {
            (Some(text), _) => Ok(text),
            (None, Some(detail)) => Err(Error::MalformedResponse(detail)),
            (None, None) => Err(Error::MalformedResponse(
                "missing 'response' field".to_string(),
            )),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Http(e) if e.is_timeout())
    }
}
