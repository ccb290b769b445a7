//! Batch executor.

use super::dataset::Sample;
use crate::client::{ClassificationClient, ClassifyOptions};
use crate::types::{ClassificationResult, IntensityLevel, Label};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Outcome of classifying one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub index: usize,
    pub character: String,
    pub sentence: String,
    pub expected_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ClassificationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl BatchRecord {
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    pub fn predicted_label(&self) -> Option<&Label> {
        self.result.as_ref()?.label()
    }

    pub fn tension(&self) -> Option<f64> {
        self.result.as_ref()?.tension()
    }

    pub fn intensity(&self) -> Option<IntensityLevel> {
        self.result.as_ref()?.intensity()
    }

    pub fn score(&self) -> Option<f64> {
        self.result.as_ref()?.score()
    }

    /// Whether the prediction is a known label equal to the expected one.
    pub fn is_correct(&self) -> bool {
        self.predicted_label()
            .and_then(Label::as_known)
            .is_some_and(|p| p == self.expected_label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStrategy {
    Sequential,
    Concurrent { max_concurrency: usize },
}
impl Default for BatchStrategy {
    fn default() -> Self {
        BatchStrategy::Sequential
    }
}

#[derive(Debug, Clone)]
pub struct BatchExecutorConfig {
    pub strategy: BatchStrategy,
    /// When false, no new samples start after the first failure.
    pub continue_on_error: bool,
    /// Minimum spacing between the starts of consecutive samples, in both
    /// strategies.
    pub pause: Option<Duration>,
    pub options: ClassifyOptions,
}
impl Default for BatchExecutorConfig {
    fn default() -> Self {
        Self {
            strategy: BatchStrategy::default(),
            continue_on_error: true,
            pause: None,
            options: ClassifyOptions::emotion_and_tension(),
        }
    }
}
impl BatchExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_strategy(mut self, s: BatchStrategy) -> Self {
        self.strategy = s;
        self
    }
    pub fn with_continue_on_error(mut self, c: bool) -> Self {
        self.continue_on_error = c;
        self
    }
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = Some(pause).filter(|p| !p.is_zero());
        self
    }
    pub fn with_options(mut self, options: ClassifyOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone)]
pub struct BatchRun {
    /// Records in sample order. Samples skipped after a stop are absent.
    pub records: Vec<BatchRecord>,
    pub execution_time: Duration,
    pub total_samples: usize,
}

impl BatchRun {
    pub fn success_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }
    pub fn failure_count(&self) -> usize {
        self.records.len() - self.success_count()
    }

    /// Write one JSON object per record.
    pub fn write_jsonl<W: Write>(&self, mut out: W) -> crate::Result<()> {
        for record in &self.records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }
}

pub struct BatchExecutor<'a> {
    client: &'a ClassificationClient,
    config: BatchExecutorConfig,
}
impl<'a> BatchExecutor<'a> {
    pub fn new(client: &'a ClassificationClient) -> Self {
        Self::with_config(client, BatchExecutorConfig::default())
    }
    pub fn with_config(client: &'a ClassificationClient, config: BatchExecutorConfig) -> Self {
        Self { client, config }
    }
    pub fn config(&self) -> &BatchExecutorConfig {
        &self.config
    }

    pub async fn run(&self, samples: Vec<Sample>) -> BatchRun {
        let start = Instant::now();
        let total = samples.len();
        info!(samples = total, strategy = ?self.config.strategy, "batch started");

        let mut records = match self.config.strategy {
            BatchStrategy::Sequential => self.run_sequential(samples).await,
            BatchStrategy::Concurrent { max_concurrency } => {
                self.run_concurrent(samples, max_concurrency.max(1)).await
            }
        };
        records.sort_by_key(|r| r.index);

        let run = BatchRun {
            records,
            execution_time: start.elapsed(),
            total_samples: total,
        };
        info!(
            processed = run.records.len(),
            failures = run.failure_count(),
            duration_ms = run.execution_time.as_millis() as u64,
            "batch finished"
        );
        run
    }

    async fn run_sequential(&self, samples: Vec<Sample>) -> Vec<BatchRecord> {
        let gate = StartGate::new(self.config.pause);
        let mut records = Vec::with_capacity(samples.len());
        for sample in samples {
            gate.wait().await;
            let record = self.classify_sample(sample).await;
            let failed = !record.is_success();
            records.push(record);
            if failed && !self.config.continue_on_error {
                warn!("stopping batch after first failure");
                break;
            }
        }
        records
    }

    async fn run_concurrent(&self, samples: Vec<Sample>, limit: usize) -> Vec<BatchRecord> {
        let stop = AtomicBool::new(false);
        let stop = &stop;
        let gate = StartGate::new(self.config.pause);
        let gate = &gate;
        futures::stream::iter(samples)
            .map(|sample| async move {
                gate.wait().await;
                if stop.load(Ordering::Acquire) {
                    return None;
                }
                let record = self.classify_sample(sample).await;
                if !record.is_success() && !self.config.continue_on_error {
                    stop.store(true, Ordering::Release);
                }
                Some(record)
            })
            .buffer_unordered(limit)
            .filter_map(|r| async move { r })
            .collect()
            .await
    }

    async fn classify_sample(&self, sample: Sample) -> BatchRecord {
        let start = Instant::now();
        let outcome = self
            .client
            .classify(&sample.sentence, &self.config.options)
            .await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        let (result, error) = match outcome {
            Ok(result) => (Some(result), None),
            Err(err) => {
                warn!(index = sample.index, error = %err, "sample failed");
                (None, Some(err.message()))
            }
        };
        BatchRecord {
            index: sample.index,
            character: sample.character,
            sentence: sample.sentence,
            expected_label: sample.expected_label,
            result,
            error,
            elapsed_ms,
        }
    }
}

/// Spaces sample starts at least `pause` apart, however many are in flight.
struct StartGate {
    pause: Option<Duration>,
    last_start: Mutex<Option<tokio::time::Instant>>,
}

impl StartGate {
    fn new(pause: Option<Duration>) -> Self {
        Self {
            pause,
            last_start: Mutex::new(None),
        }
    }

    async fn wait(&self) {
        let Some(pause) = self.pause else {
            return;
        };
        let mut last = self.last_start.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + pause).await;
        }
        *last = Some(tokio::time::Instant::now());
    }
}
