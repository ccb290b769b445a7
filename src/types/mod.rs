//! 類型模組：請求與結果的核心資料型別。
//!
//! # Types Module
//!
//! Strongly-typed representations of what goes over the wire to the sandbox
//! and what comes back to the caller.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`DialogueInput`] | Validated, non-empty dialogue text |
//! | [`ClassificationRequest`] | Wire body for one sandbox call |
//! | [`HistoryDepth`] | How much prior conversation the sandbox should consider |
//! | [`InvokeResponse`] | Raw sandbox response body |
//! | [`ClassificationResult`] | Combined, normalized outcome of one `classify` call |
//! | [`Verdict`] | Per-task extracted value (label, tension, intensity) |

pub mod request;
pub mod result;

pub use request::{ClassificationRequest, DialogueInput, HistoryDepth, InvokeResponse};
pub use result::{
    ClassificationResult, IntensityLevel, Label, TaskFailure, TaskOutput, TensionMetrics, Verdict,
};
