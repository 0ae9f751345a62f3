#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! Core data model, closed vocabularies, and external-interface traits for the
//! Causal Event Graph (CEG) pipeline.
//!
//! This crate has no async runtime or transport dependencies of its own: it
//! defines the shapes that flow between the ingestion, linking, scoring and
//! graph-writing stages, plus the traits (§6 of the specification) that the
//! orchestrator composes against. Concrete adapters live in downstream
//! crates (`ceg-data`, `ceg-extraction`, `ceg-linker`, `ceg-graph`).

/// [`CoreError`]: invariant violations on the shared data model itself.
pub mod error;

/// [`Source`] configuration and external-interface traits for ingestion.
pub mod source;

/// Raw [`Record`]s as yielded by a [`source::SourceAdapter`].
pub mod record;

/// Structured LLM [`Extraction`] output.
pub mod extraction;

/// [`Instrument`] and [`Company`] node types.
pub mod instrument;

/// The closed [`EventType`](event::EventType) vocabulary and the [`Event`](event::Event) vertex.
pub mod event;

/// [`CausalLink`](causal::CausalLink) edges and the CMNLN confidence envelope.
pub mod causal;

/// [`ImpactEdge`](impact::ImpactEdge) and market-data interfaces.
pub mod impact;

/// [`ImportanceScore`](importance::ImportanceScore) components.
pub mod importance;

/// [`TriggeredWatch`](watch::TriggeredWatch) and [`EventPrediction`](watch::EventPrediction).
pub mod watch;

/// The [`GraphStore`](store::GraphStore) interface (§6).
pub mod store;

pub use error::{CausalLinkWeights, CoreError};
