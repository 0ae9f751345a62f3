use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Urgency level tagged by the extraction model.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Default)]
pub enum Urgency {
    #[default]
    Normal,
    High,
    Breaking,
}

/// A company mention surfaced by the extraction model, with optional hints
/// the [`crate::instrument`] linker can use to short-circuit resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyMention {
    pub raw_text: String,
    pub ticker_hint: Option<SmolStr>,
    pub sector_hint: Option<SmolStr>,
}

/// Structured output for one [`crate::record::Record`] (§3).
///
/// This is the single tagged-union type that downstream code pattern-matches
/// against instead of introspecting free-form LLM JSON. An empty
/// [`Extraction`] (no tags, zero confidence) is a valid value, never an
/// absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Extraction {
    pub people: Vec<String>,
    pub companies: Vec<CompanyMention>,
    pub markets: Vec<SmolStr>,
    /// Free-form numeric metrics surfaced by the model (eg/ "eps_beat_pct").
    pub financial_metrics: Vec<(SmolStr, f64)>,
    pub event_types: Vec<SmolStr>,
    pub is_advertisement: bool,
    pub content_types: Vec<SmolStr>,
    pub language: Option<SmolStr>,
    pub urgency: Urgency,
    /// Overall extraction confidence in `[0, 1]`.
    pub confidence: f64,
}

impl Extraction {
    /// The zero-confidence, no-tags placeholder used when the model has
    /// nothing to report for a record. Must still be emitted, never omitted
    /// (§4.C, §8 boundary cases).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_significant_content(&self) -> bool {
        !self.event_types.is_empty() || !self.financial_metrics.is_empty()
    }
}
