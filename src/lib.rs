// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod content;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod rank;
pub mod relevance;
pub mod status;
pub mod taxonomy;

// `crate_root::api::router` and `crate_root::router`
pub use crate::api::router;
pub use crate::pipeline::{Pipeline, SearchOutcome};
