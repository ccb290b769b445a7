//! Result-side types.

use crate::task::TaskKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A label from a task's closed set, or the sentinel for anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Known(String),
    Undeterminable,
}

impl Label {
    pub fn as_known(&self) -> Option<&str> {
        match self {
            Label::Known(s) => Some(s),
            Label::Undeterminable => None,
        }
    }

    pub fn is_undeterminable(&self) -> bool {
        matches!(self, Label::Undeterminable)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Known(s) => f.write_str(s),
            Label::Undeterminable => f.write_str("undeterminable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntensityLevel {
    Low,
    Medium,
    High,
}

impl IntensityLevel {
    pub const ALL: [IntensityLevel; 3] =
        [IntensityLevel::Low, IntensityLevel::Medium, IntensityLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntensityLevel::Low => "Low",
            IntensityLevel::Medium => "Medium",
            IntensityLevel::High => "High",
        }
    }
}

/// Tension score and the lexical counts it was computed from.
///
/// `tension = (modifier + idiom + 2 * degree_head) / word_count`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TensionMetrics {
    pub modifier: Option<u32>,
    pub idiom: Option<u32>,
    pub degree_head: Option<u32>,
    pub word_count: Option<u32>,
    pub tension: Option<f64>,
}

/// Value extracted from a task's raw response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Verdict {
    Label {
        label: Label,
    },
    Tension {
        metrics: TensionMetrics,
    },
    Intensity {
        label: Label,
        level: Option<IntensityLevel>,
    },
    /// Emotion label with its degree in `[0, 1]`.
    Score {
        label: Label,
        score: Option<f64>,
    },
}

impl Verdict {
    pub fn label(&self) -> Option<&Label> {
        match self {
            Verdict::Label { label }
            | Verdict::Intensity { label, .. }
            | Verdict::Score { label, .. } => Some(label),
            Verdict::Tension { .. } => None,
        }
    }
}

/// Successful outcome of one sub-request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub kind: TaskKind,
    pub function_name: String,
    /// Model output exactly as the sandbox returned it.
    pub raw: String,
    pub verdict: Verdict,
    pub latency_ms: u64,
}

/// Failed sub-request, only reported under the partial combine policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub kind: TaskKind,
    pub message: String,
}

/// Combined outcome of one `classify` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Successful outputs, in the order the tasks were requested.
    pub outputs: Vec<TaskOutput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<TaskFailure>,
    pub timestamp: DateTime<Utc>,
}

impl ClassificationResult {
    pub fn output(&self, kind: TaskKind) -> Option<&TaskOutput> {
        self.outputs.iter().find(|o| o.kind == kind)
    }

    pub fn raw(&self, kind: TaskKind) -> Option<&str> {
        self.output(kind).map(|o| o.raw.as_str())
    }

    /// The primary label: the first labeled output in task order.
    pub fn label(&self) -> Option<&Label> {
        self.outputs.iter().find_map(|o| o.verdict.label())
    }

    pub fn tension(&self) -> Option<f64> {
        self.outputs.iter().find_map(|o| match &o.verdict {
            Verdict::Tension { metrics } => metrics.tension,
            _ => None,
        })
    }

    pub fn intensity(&self) -> Option<IntensityLevel> {
        self.outputs.iter().find_map(|o| match &o.verdict {
            Verdict::Intensity { level, .. } => *level,
            _ => None,
        })
    }

    pub fn score(&self) -> Option<f64> {
        self.outputs.iter().find_map(|o| match &o.verdict {
            Verdict::Score { score, .. } => *score,
            _ => None,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Raw responses of all successful tasks joined by newlines, in task order.
    pub fn summary(&self) -> String {
        self.outputs
            .iter()
            .map(|o| o.raw.trim())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
