//! Classification client.
//!
//! Keep the public surface small and predictable: build a client once, then
//! call [`ClassificationClient::classify`] with per-call [`ClassifyOptions`].
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
pub mod options;

pub use builder::ClassificationClientBuilder;
pub use core::{CallState, ClassificationClient};
pub use options::{ClassifyOptions, CombinePolicy};
