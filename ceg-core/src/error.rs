use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while validating or constructing core CEG types.
///
/// Transport, extraction and storage failures have their own error enums in
/// the crates that own those concerns (`ceg-data::IngestError`,
/// `ceg-extraction::ExtractionError`, `ceg-graph::GraphError`, ...); this
/// enum only covers invariant violations on the shared data model itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum CoreError {
    /// A [`crate::causal::CausalLink`] was constructed with `cause.ts >= effect.ts`.
    #[error("causal link violates temporal ordering: cause={cause_ts} effect={effect_ts}")]
    NonCausalOrdering { cause_ts: String, effect_ts: String },

    /// A confidence sub-score fell outside `[0, 1]`.
    #[error("confidence component {name} out of range [0,1]: {value}")]
    ConfidenceOutOfRange { name: &'static str, value: f64 },

    /// An [`crate::event::EventType`] string did not match the closed vocabulary (§6).
    #[error("unknown event type: {0}")]
    UnknownEventType(String),
}

/// Named, versioned weights for the CMNLN confidence-combine formula (§4.G,
/// §6 "CausalLink confidence envelope"). Implementations must not change the
/// numeric weights without bumping [`CausalLinkWeights::version`] so that
/// historical rows remain interpretable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CausalLinkWeights {
    pub prior: f64,
    pub text: f64,
    pub market: f64,
    pub version: &'static str,
}

impl CausalLinkWeights {
    /// The normative weights from spec.md §4.G / §6: `0.4 * prior + 0.3 * text + 0.3 * market`.
    pub const NORMATIVE: Self = Self {
        prior: 0.4,
        text: 0.3,
        market: 0.3,
        version: "cmnln-v1",
    };

    /// Combine the three sub-scores, clamping the result to `[0, 1]`.
    pub fn combine(&self, prior: f64, text: f64, market: f64) -> f64 {
        (self.prior * prior + self.text * text + self.market * market).clamp(0.0, 1.0)
    }
}

impl Default for CausalLinkWeights {
    fn default() -> Self {
        Self::NORMATIVE
    }
}
