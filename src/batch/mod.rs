//! 批次評估模組：對標註資料集逐句分類並統計準確率與延遲。
//!
//! # Batch Evaluation Module
//!
//! Runs a labeled dataset through a [`ClassificationClient`](crate::ClassificationClient)
//! and summarizes how the sandbox performed.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Dataset`] | Sentences grouped by character and expected emotion label |
//! | [`BatchExecutor`] | Classifies samples sequentially or with bounded concurrency |
//! | [`BatchRun`] | Per-sample records, writable as JSON lines |
//! | [`BatchReport`] | Accuracy, confusion pairs, latency percentiles, tension, intensity and score stats |
//!
//! ## Example
//!
//! ```rust,no_run
//! use sandbox_classify::batch::{BatchExecutor, BatchReport, Dataset};
//! use sandbox_classify::ClassificationClient;
//!
//! # async fn run() -> sandbox_classify::Result<()> {
//! let client = ClassificationClient::from_env()?;
//! let dataset = Dataset::from_json_file("sentences.json")?;
//! let run = BatchExecutor::new(&client).run(dataset.samples()).await;
//! println!("{}", BatchReport::from_records(&run.records));
//! # Ok(())
//! # }
//! ```
//!
//! ## Strategies
//!
//! - **Sequential**: one sample at a time, with an optional pause between samples
//! - **Concurrent**: up to N samples in flight; records are still reported in dataset order
//!
//! A pause spaces sample starts at least that far apart under either strategy.

mod dataset;
mod executor;
mod report;

pub use dataset::{CharacterSentences, Dataset, LabeledSentences, Sample};
pub use executor::{BatchExecutor, BatchExecutorConfig, BatchRecord, BatchRun, BatchStrategy};
pub use report::{
    quantile, BatchReport, ConfusionPair, LabelAccuracy, LabelIntensity, LabelTension,
    SummaryStats,
};
