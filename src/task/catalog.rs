use super::{TaskDefinition, TaskKind};
use crate::types::HistoryDepth;
use crate::{Error, ErrorContext, Result};
use serde::Deserialize;
use std::path::Path;

/// The set of task definitions a client can dispatch, at most one per kind.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCatalog {
    definitions: Vec<TaskDefinition>,
}

/// Partial task definition layered over the built-in one for its kind.
///
/// ```yaml
/// - kind: tension
///   model_name: gemini-2.5-flash
///   temperature: 0.2
/// - kind: emotion
///   history: all
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskOverride {
    pub kind: Option<TaskKind>,
    pub function_name: Option<String>,
    pub developer_prompt: Option<String>,
    pub model_name: Option<String>,
    pub temperature: Option<f32>,
    pub history: Option<HistoryDepth>,
    pub labels: Option<Vec<String>>,
}

impl TaskOverride {
    fn apply(self, kind: TaskKind) -> TaskDefinition {
        let mut def = TaskDefinition::builtin(kind);
        if let Some(v) = self.function_name {
            def.function_name = v;
        }
        if let Some(v) = self.developer_prompt {
            def.developer_prompt = v;
        }
        if let Some(v) = self.model_name {
            def.model_name = v;
        }
        if let Some(v) = self.temperature {
            def.temperature = v;
        }
        if self.history.is_some() {
            def.history = self.history;
        }
        if let Some(v) = self.labels {
            def.labels = v;
        }
        def
    }
}

impl TaskCatalog {
    pub fn empty() -> Self {
        Self {
            definitions: Vec::new(),
        }
    }

    /// All built-in tasks.
    pub fn builtin() -> Self {
        Self {
            definitions: TaskKind::ALL
                .iter()
                .map(|k| TaskDefinition::builtin(*k))
                .collect(),
        }
    }

    /// Load the built-in catalog with YAML overrides applied on top.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let overrides: Vec<TaskOverride> = serde_yaml::from_str(yaml)?;
        let mut catalog = Self::builtin();
        for (idx, ov) in overrides.into_iter().enumerate() {
            let kind = ov.kind.ok_or_else(|| {
                Error::configuration_with_context(
                    "task entry is missing 'kind'",
                    ErrorContext::new()
                        .with_field_path(format!("tasks[{}].kind", idx))
                        .with_source("task_catalog"),
                )
            })?;
            let def = ov.apply(kind);
            def.validate()?;
            catalog.insert(def);
        }
        Ok(catalog)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Insert or replace the definition for `def.kind`.
    pub fn insert(&mut self, def: TaskDefinition) {
        match self.definitions.iter_mut().find(|d| d.kind == def.kind) {
            Some(slot) => *slot = def,
            None => self.definitions.push(def),
        }
    }

    pub fn get(&self, kind: TaskKind) -> Option<&TaskDefinition> {
        self.definitions.iter().find(|d| d.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Point every task at the same model.
    pub fn with_model(mut self, model: &str) -> Self {
        for def in &mut self.definitions {
            def.model_name = model.to_string();
        }
        self
    }

    /// Apply the same history depth to every task.
    pub fn with_history(mut self, history: HistoryDepth) -> Self {
        for def in &mut self.definitions {
            def.history = Some(history);
        }
        self
    }
}

impl Default for TaskCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
