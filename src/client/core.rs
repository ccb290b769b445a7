use crate::client::options::{ClassifyOptions, CombinePolicy};
use crate::parse::parse_verdict;
use crate::task::{TaskCatalog, TaskDefinition, TaskKind};
use crate::transport::{SandboxCall, SandboxInvoker};
use crate::types::{
    ClassificationRequest, ClassificationResult, DialogueInput, TaskFailure, TaskOutput,
};
use crate::{ClientError, Error, ErrorContext, Result};
use chrono::Utc;
use futures::future::{join_all, try_join_all};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-call lifecycle. There is no retry state and no partial state visible
/// to the caller; this only shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Requesting,
    Succeeded,
    Failed,
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CallState::Idle => "idle",
            CallState::Requesting => "requesting",
            CallState::Succeeded => "succeeded",
            CallState::Failed => "failed",
        })
    }
}

/// Sends dialogue to the sandbox once per requested task and combines the
/// answers into one [`ClassificationResult`].
///
/// Holds no per-call state; one client can serve concurrent calls.
pub struct ClassificationClient {
    pub(crate) invoker: Arc<dyn SandboxInvoker>,
    pub(crate) catalog: TaskCatalog,
    pub(crate) default_timeout: Duration,
    pub(crate) instance_id: Option<String>,
}

impl ClassificationClient {
    pub fn builder() -> crate::client::builder::ClassificationClientBuilder {
        crate::client::builder::ClassificationClientBuilder::new()
    }

    /// Client configured entirely from the environment with built-in tasks.
    pub fn from_env() -> Result<Self> {
        Self::builder().build()
    }

    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Classify `dialogue` with the tasks selected in `options`.
    ///
    /// Empty or blank dialogue is rejected before any request is sent. All
    /// selected tasks are dispatched concurrently; the result lists their
    /// outputs in the order the tasks were requested, regardless of which
    /// response arrived first.
    pub async fn classify(
        &self,
        dialogue: &str,
        options: &ClassifyOptions,
    ) -> Result<ClassificationResult> {
        let dialogue = DialogueInput::new(dialogue)?;
        let tasks = self.plan(options)?;
        let timeout = options.timeout.unwrap_or(self.default_timeout);
        let cancel = options.cancel.clone().unwrap_or_default();
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let kinds: Vec<TaskKind> = tasks.iter().map(|t| t.kind).collect();
        debug!(state = %CallState::Idle, tasks = ?kinds, "classify");
        debug!(
            state = %CallState::Requesting,
            policy = ?options.policy,
            timeout_ms = timeout.as_millis() as u64,
            "classify"
        );
        let start = Instant::now();

        let calls = tasks
            .iter()
            .map(|task| self.run_task(task, &dialogue, timeout, &cancel));

        let combined = match options.policy {
            // try_join_all drops the remaining in-flight calls on first error.
            CombinePolicy::FailFast => try_join_all(calls).await.map(|outputs| ClassificationResult {
                outputs,
                failures: Vec::new(),
                timestamp: Utc::now(),
            }),
            CombinePolicy::Partial => {
                combine_partial(kinds.iter().copied().zip(join_all(calls).await).collect())
            }
        };

        match &combined {
            Ok(result) => info!(
                state = %CallState::Succeeded,
                tasks = ?kinds,
                failures = result.failures.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "classify finished"
            ),
            Err(err) => warn!(
                state = %CallState::Failed,
                tasks = ?kinds,
                duration_ms = start.elapsed().as_millis() as u64,
                error = %err,
                "classify failed"
            ),
        }
        combined
    }

    /// Like [`classify`](Self::classify) but always returns a JSON value: the
    /// serialized result on success, or the serialized [`ClientError`].
    pub async fn classify_to_value(
        &self,
        dialogue: &str,
        options: &ClassifyOptions,
    ) -> serde_json::Value {
        let outcome = self
            .classify(dialogue, options)
            .await
            .and_then(|result| result_to_value(&result));
        match outcome {
            Ok(value) => value,
            Err(err) => {
                let client_error = ClientError::from(&err);
                serde_json::to_value(&client_error).unwrap_or_else(|_| {
                    serde_json::json!({ "error": true, "message": client_error.message })
                })
            }
        }
    }

    fn plan(&self, options: &ClassifyOptions) -> Result<Vec<TaskDefinition>> {
        let kinds = options.unique_tasks();
        if kinds.is_empty() {
            return Err(Error::validation_with_context(
                "at least one task must be selected",
                ErrorContext::new().with_field_path("options.tasks"),
            ));
        }
        kinds
            .into_iter()
            .map(|kind| {
                let mut def = self.catalog.get(kind).cloned().ok_or_else(|| {
                    Error::configuration_with_context(
                        format!("no definition registered for task '{}'", kind),
                        ErrorContext::new()
                            .with_field_path("catalog")
                            .with_source("classify"),
                    )
                })?;
                if options.history.is_some() {
                    def.history = options.history;
                }
                Ok(def)
            })
            .collect()
    }

    async fn run_task(
        &self,
        task: &TaskDefinition,
        dialogue: &DialogueInput,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<TaskOutput> {
        let instance_id = self
            .instance_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let request = ClassificationRequest::from_task(task, dialogue, instance_id);
        let call = SandboxCall {
            function_name: &task.function_name,
            request: &request,
        };

        let start = Instant::now();
        let outcome: Result<String> = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            outcome = tokio::time::timeout(timeout, self.invoker.invoke(call)) => match outcome {
                Ok(inner) => inner,
                Err(_) => Err(Error::Timeout {
                    task: task.kind,
                    after_ms: timeout.as_millis() as u64,
                }),
            },
        };
        let raw = outcome.map_err(|e| e.for_task(task.kind))?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let verdict = parse_verdict(task, &raw);
        if verdict.label().is_some_and(|l| l.is_undeterminable()) {
            warn!(
                task = %task.kind,
                raw = raw.as_str(),
                "model answer is outside the closed label set"
            );
        }
        debug!(task = %task.kind, latency_ms, verdict = ?verdict, "task completed");

        Ok(TaskOutput {
            kind: task.kind,
            function_name: task.function_name.clone(),
            raw,
            verdict,
            latency_ms,
        })
    }
}

fn combine_partial(outcomes: Vec<(TaskKind, Result<TaskOutput>)>) -> Result<ClassificationResult> {
    let mut outputs = Vec::new();
    let mut errors = Vec::new();
    for (kind, outcome) in outcomes {
        match outcome {
            Ok(output) => outputs.push(output),
            Err(err) => errors.push((kind, err)),
        }
    }
    if outputs.is_empty() {
        return Err(errors
            .into_iter()
            .map(|(_, err)| err)
            .next()
            .unwrap_or_else(|| Error::validation("no tasks were dispatched")));
    }
    for (kind, err) in &errors {
        warn!(task = %kind, error = %err, "dropping failed task from partial result");
    }
    let failures = errors
        .iter()
        .map(|(kind, err)| TaskFailure {
            kind: *kind,
            message: err.message(),
        })
        .collect();
    Ok(ClassificationResult {
        outputs,
        failures,
        timestamp: Utc::now(),
    })
}

fn result_to_value(result: &ClassificationResult) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(result)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("summary".to_string(), serde_json::json!(result.summary()));
    }
    Ok(value)
}
