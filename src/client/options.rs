use crate::task::TaskKind;
use crate::types::HistoryDepth;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How sub-task outcomes combine into one result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CombinePolicy {
    /// Any sub-task failure fails the whole call; no partial result.
    #[default]
    FailFast,
    /// Return successful outputs alongside per-task failures. The call only
    /// fails when every sub-task fails.
    Partial,
}

/// Per-call options for [`super::ClassificationClient::classify`].
#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    pub tasks: Vec<TaskKind>,
    pub policy: CombinePolicy,
    /// Overrides the client's default per-request timeout.
    pub timeout: Option<Duration>,
    /// Overrides each task's configured history depth.
    pub history: Option<HistoryDepth>,
    pub cancel: Option<CancellationToken>,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            tasks: vec![TaskKind::Emotion],
            policy: CombinePolicy::default(),
            timeout: None,
            history: None,
            cancel: None,
        }
    }
}

impl ClassifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emotion label plus tension score, dispatched concurrently.
    pub fn emotion_and_tension() -> Self {
        Self::new().tasks([TaskKind::Emotion, TaskKind::Tension])
    }

    pub fn tasks(mut self, tasks: impl IntoIterator<Item = TaskKind>) -> Self {
        self.tasks = tasks.into_iter().collect();
        self
    }

    pub fn policy(mut self, policy: CombinePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn partial(self) -> Self {
        self.policy(CombinePolicy::Partial)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn history(mut self, history: HistoryDepth) -> Self {
        self.history = Some(history);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Requested tasks with duplicates removed, first occurrence wins.
    pub(crate) fn unique_tasks(&self) -> Vec<TaskKind> {
        let mut out: Vec<TaskKind> = Vec::with_capacity(self.tasks.len());
        for kind in &self.tasks {
            if !out.contains(kind) {
                out.push(*kind);
            }
        }
        out
    }
}
