//! Event extraction, importance scoring, causal inference (CMNLN), the
//! market-impact event study, and idempotent graph writes (§4.E-I).

pub mod cmnln;
pub mod error;
pub mod event_extractor;
pub mod importance;
pub mod market_impact;
pub mod writer;

pub use error::GraphError;
pub use event_extractor::extract_events;
pub use market_impact::MarketImpactEngine;
pub use writer::GraphWriter;
