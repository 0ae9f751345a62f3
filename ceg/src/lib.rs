#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! The Orchestrator (§4.L) and its composition root: configuration loading,
//! the aggregated [`error::CegError`] surface, and the [`orchestrator::Pipeline`]
//! that drives every other crate in the workspace end to end.
//!
//! The CLI binary at `src/bin/ceg.rs` is the reference wiring of this
//! library against the interfaces named in §6 — a real deployment swaps in
//! its own [`ceg_core::store::GraphStore`] and
//! [`ceg_core::impact::MarketDataProvider`] and registers its own
//! [`ceg_core::source::SourceAdapter`]s.

/// [`config::PipelineConfig`] and its nested timeout/retry sections.
pub mod config;

/// [`error::CegError`]: the aggregated failure surface and CLI exit-code mapping.
pub mod error;

/// The [`orchestrator::Pipeline`] driving fetch → batch → extract → ... → reconcile.
pub mod orchestrator;

pub use config::PipelineConfig;
pub use error::CegError;
pub use orchestrator::Pipeline;
