//! Request-side types.

use crate::task::TaskDefinition;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Dialogue text to classify. Never empty; otherwise opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueInput(String);

impl DialogueInput {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::validation_with_context(
                "dialogue must not be empty",
                ErrorContext::new()
                    .with_field_path("user_prompt")
                    .with_source("dialogue_input"),
            ));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for DialogueInput {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DialogueInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How many prior turns the sandbox should include as context.
///
/// Serialized as an integer, or as the literal string `"all"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDepth {
    Steps(u32),
    All,
}

impl Serialize for HistoryDepth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            HistoryDepth::Steps(n) => serializer.serialize_u32(*n),
            HistoryDepth::All => serializer.serialize_str("all"),
        }
    }
}

impl<'de> Deserialize<'de> for HistoryDepth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u32),
            Str(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(HistoryDepth::Steps(n)),
            Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

impl FromStr for HistoryDepth {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(HistoryDepth::All);
        }
        s.parse::<u32>()
            .map(HistoryDepth::Steps)
            .map_err(|_| format!("history depth must be a non-negative integer or 'all', got '{}'", s))
    }
}

/// Body of one POST to the sandbox endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub instance_id: String,
    pub developer_prompt: String,
    pub user_prompt: String,
    pub model_name: String,
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_steps: Option<HistoryDepth>,
}

impl ClassificationRequest {
    pub fn from_task(
        task: &TaskDefinition,
        dialogue: &DialogueInput,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            developer_prompt: task.developer_prompt.clone(),
            user_prompt: dialogue.as_str().to_string(),
            model_name: task.model_name.clone(),
            temperature: task.temperature,
            history_steps: task.history,
        }
    }
}

/// Sandbox response body. Successful calls carry `response`; failed ones
/// usually carry `detail`, which may be a string or a structured value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvokeResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl InvokeResponse {
    pub fn detail_message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.trim().is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
