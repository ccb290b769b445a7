use crate::task::TaskKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error context for configuration and validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "config.endpoint", "task.temperature")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected range, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "dialogue_input")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type for the classification client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Remote error: HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request for task '{task}' timed out after {after_ms}ms")]
    Timeout { task: TaskKind, after_ms: u64 },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Task '{task}' failed: {source}")]
    TaskFailed {
        task: TaskKind,
        #[source]
        source: Box<Error>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::validation_with_context(msg, ErrorContext::new())
    }

    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub(crate) fn for_task(self, task: TaskKind) -> Self {
        match self {
            Error::TaskFailed { .. } | Error::Cancelled | Error::Timeout { .. } => self,
            other => Error::TaskFailed {
                task,
                source: Box::new(other),
            },
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// The most specific human-readable message for this error.
    ///
    /// Remote failures surface the sandbox `detail` string verbatim; wrapped
    /// sub-task failures surface their inner message.
    pub fn message(&self) -> String {
        match self {
            Error::Remote { message, .. } => message.clone(),
            Error::TaskFailed { source, .. } => source.message(),
            Error::Configuration { message, .. } | Error::Validation { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }

    /// The task a failure is attributed to, if any.
    pub fn task(&self) -> Option<TaskKind> {
        match self {
            Error::TaskFailed { task, .. } | Error::Timeout { task, .. } => Some(*task),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Transport(e) => e.is_timeout(),
            Error::TaskFailed { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// Uniform failure value for callers that want to branch on a plain value
/// rather than on [`Error`] variants.
///
/// Serializes as `{"error": true, "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientError {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskKind>,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            task: None,
        }
    }
}

impl From<&Error> for ClientError {
    fn from(err: &Error) -> Self {
        Self {
            error: true,
            message: err.message(),
            task: err.task(),
        }
    }
}

impl From<Error> for ClientError {
    fn from(err: Error) -> Self {
        ClientError::from(&err)
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ClientError {}
