use serde::{Deserialize, Serialize};

/// Weights for the five importance components (SPEC_FULL.md §4). These sum
/// to 1.0 and are normative; a non-default [`ImportanceWeights`] is only
/// ever used in experimentation, never in the reference pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceWeights {
    pub novelty: f64,
    pub burst: f64,
    pub credibility: f64,
    pub breadth: f64,
    pub price_impact: f64,
}

impl Default for ImportanceWeights {
    fn default() -> Self {
        Self {
            novelty: 0.25,
            burst: 0.20,
            credibility: 0.25,
            breadth: 0.15,
            price_impact: 0.15,
        }
    }
}

/// The five-component importance breakdown for one [`crate::event::Event`]
/// (§3, §6). Each component lives in `[0, 1]`; `total` is their weighted sum,
/// also clamped to `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceScore {
    pub novelty: f64,
    pub burst: f64,
    pub credibility: f64,
    pub breadth: f64,
    pub price_impact: f64,
    pub total: f64,
}

impl ImportanceScore {
    pub fn compute(components: [f64; 5], weights: &ImportanceWeights) -> Self {
        let [novelty, burst, credibility, breadth, price_impact] = components;
        let total = novelty * weights.novelty
            + burst * weights.burst
            + credibility * weights.credibility
            + breadth * weights.breadth
            + price_impact * weights.price_impact;
        Self {
            novelty,
            burst,
            credibility,
            breadth,
            price_impact,
            total: total.clamp(0.0, 1.0),
        }
    }
}
