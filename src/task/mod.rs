//! Task definitions: one entry per labeled sub-request the client can run.
//!
//! A task bundles the fixed developer prompt, its closed label set, the model
//! and sampling temperature, and the `X-Function-Name` the sandbox logs it under.
//! The client iterates over definitions uniformly; nothing is task-specific
//! outside of [`crate::parse`].

mod catalog;
pub mod prompts;

pub use catalog::{TaskCatalog, TaskOverride};

use crate::types::HistoryDepth;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "gpt-4.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Eight-way emotion label.
    Emotion,
    /// Lexical tension score with its component counts.
    Tension,
    /// Emotion label plus a Low/Medium/High intensity level, in one call.
    Intensity,
    /// Legacy nine-way customer tone label.
    Tone,
    /// Emotion label plus a 0 to 1 degree score, in one call.
    Score,
}

impl TaskKind {
    pub const ALL: [TaskKind; 5] = [
        TaskKind::Emotion,
        TaskKind::Tension,
        TaskKind::Intensity,
        TaskKind::Tone,
        TaskKind::Score,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Emotion => "emotion",
            TaskKind::Tension => "tension",
            TaskKind::Intensity => "intensity",
            TaskKind::Tone => "tone",
            TaskKind::Score => "score",
        }
    }

    /// Whether the task produces a label from a closed set.
    pub fn is_labeled(&self) -> bool {
        !matches!(self, TaskKind::Tension)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "emotion" => Ok(TaskKind::Emotion),
            "tension" => Ok(TaskKind::Tension),
            "intensity" => Ok(TaskKind::Intensity),
            "tone" => Ok(TaskKind::Tone),
            "score" => Ok(TaskKind::Score),
            other => Err(format!(
                "unknown task '{}', expected one of: emotion, tension, intensity, tone, score",
                other
            )),
        }
    }
}

/// Everything needed to build one sandbox request for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub kind: TaskKind,
    pub function_name: String,
    pub developer_prompt: String,
    pub model_name: String,
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryDepth>,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl TaskDefinition {
    /// Built-in definition for a task kind.
    ///
    /// Quantitative tasks run at a low temperature, judgment tasks higher.
    pub fn builtin(kind: TaskKind) -> Self {
        let (function_name, prompt, temperature, labels) = match kind {
            TaskKind::Emotion => (
                "emotion-classify",
                prompts::EMOTION_PROMPT,
                0.6,
                prompts::EMOTION_LABELS,
            ),
            TaskKind::Tension => ("tension-measure", prompts::TENSION_PROMPT, 0.3, &[][..]),
            TaskKind::Intensity => (
                "emotion-intensity",
                prompts::INTENSITY_PROMPT,
                0.6,
                prompts::EMOTION_LABELS,
            ),
            TaskKind::Tone => ("tone-classify", prompts::TONE_PROMPT, 0.7, prompts::TONE_LABELS),
            TaskKind::Score => (
                "emotion-score",
                prompts::SCORE_PROMPT,
                0.6,
                prompts::EMOTION_LABELS,
            ),
        };
        Self {
            kind,
            function_name: function_name.to_string(),
            developer_prompt: prompt.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            temperature,
            history: None,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_history(mut self, history: HistoryDepth) -> Self {
        self.history = Some(history);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let ctx = || ErrorContext::new().with_source(format!("task:{}", self.kind));
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(Error::validation_with_context(
                "temperature must be within [0, 1]",
                ctx()
                    .with_field_path("temperature")
                    .with_details(format!("got {}", self.temperature)),
            ));
        }
        if self.developer_prompt.trim().is_empty() {
            return Err(Error::validation_with_context(
                "developer prompt must not be empty",
                ctx().with_field_path("developer_prompt"),
            ));
        }
        if self.model_name.trim().is_empty() {
            return Err(Error::validation_with_context(
                "model name must not be empty",
                ctx().with_field_path("model_name"),
            ));
        }
        if self.function_name.trim().is_empty() {
            return Err(Error::validation_with_context(
                "function name must not be empty",
                ctx().with_field_path("function_name"),
            ));
        }
        if self.kind.is_labeled() && self.labels.is_empty() {
            return Err(Error::validation_with_context(
                "labeled task requires a closed label set",
                ctx().with_field_path("labels"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_definitions_are_valid() {
        for kind in TaskKind::ALL {
            let def = TaskDefinition::builtin(kind);
            def.validate().unwrap();
            assert_eq!(def.kind, kind);
        }
    }

    #[test]
    fn test_quantitative_task_runs_colder() {
        let emotion = TaskDefinition::builtin(TaskKind::Emotion);
        let tension = TaskDefinition::builtin(TaskKind::Tension);
        assert!(tension.temperature < emotion.temperature);
    }

    #[test]
    fn test_prompts_enumerate_their_labels() {
        for kind in TaskKind::ALL {
            let def = TaskDefinition::builtin(kind);
            for label in &def.labels {
                assert!(
                    def.developer_prompt.contains(label.as_str()),
                    "{} prompt does not mention {}",
                    kind,
                    label
                );
            }
        }
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let def = TaskDefinition::builtin(TaskKind::Emotion).with_temperature(1.2);
        let err = def.validate().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_task_kind_parsing() {
        assert_eq!("Tension".parse::<TaskKind>().unwrap(), TaskKind::Tension);
        assert_eq!(" tone ".parse::<TaskKind>().unwrap(), TaskKind::Tone);
        assert_eq!("score".parse::<TaskKind>().unwrap(), TaskKind::Score);
        assert!("mood".parse::<TaskKind>().is_err());
    }
}
