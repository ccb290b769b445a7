//! # sandbox-classify
//!
//! 對話情緒分類客戶端：將一段對話送往沙盒推論端點，取得情緒、張力、強度與語氣判斷。
//!
//! Client library for classifying dialogue through a remote LLM sandbox endpoint.
//!
//! ## Overview
//!
//! Each classification task (emotion, tension, intensity, tone) is one sandbox
//! call carrying a task-specific developer prompt. The client dispatches the
//! selected tasks concurrently, parses each raw answer into a typed verdict,
//! and returns a single [`ClassificationResult`] stamped with a UTC timestamp.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sandbox_classify::{ClassificationClient, ClassifyOptions};
//!
//! #[tokio::main]
//! async fn main() -> sandbox_classify::Result<()> {
//!     // Reads SANDBOX_URL and the auth token from the environment or keyring.
//!     let client = ClassificationClient::from_env()?;
//!
//!     let result = client
//!         .classify("我今天真的好累，什麼都不想做。", &ClassifyOptions::emotion_and_tension())
//!         .await?;
//!     println!("{}", result.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder and per-call options |
//! | [`config`] | Endpoint, credential and timeout configuration |
//! | [`task`] | Task kinds, prompts and the task catalog |
//! | [`types`] | Wire request and result types |
//! | [`parse`] | Extraction of labels and metrics from raw model text |
//! | [`transport`] | HTTP transport and the [`SandboxInvoker`] seam |
//! | [`batch`] | Dataset evaluation and reporting |
//! | [`error`] | Error types |

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod parse;
pub mod task;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{ClassificationClient, ClassificationClientBuilder, ClassifyOptions, CombinePolicy};
pub use config::ClientConfig;
pub use error::{ClientError, Error, ErrorContext};
pub use task::{TaskCatalog, TaskDefinition, TaskKind};
pub use transport::{HttpTransport, SandboxCall, SandboxInvoker};
pub use types::{
    ClassificationRequest, ClassificationResult, DialogueInput, HistoryDepth, IntensityLevel,
    Label, TaskFailure, TaskOutput, TensionMetrics, Verdict,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
