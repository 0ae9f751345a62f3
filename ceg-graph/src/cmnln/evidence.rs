use ceg_core::event::EventType;
use smol_str::SmolStr;
use std::collections::HashSet;

/// Minimal view of an [`ceg_core::event::Event`] needed to score it as
/// evidence, independent of how the caller sourced it (graph query result,
/// in-memory batch, ...).
#[derive(Debug, Clone)]
pub struct EvidenceContext {
    pub id: SmolStr,
    pub ts: chrono::DateTime<chrono::Utc>,
    pub event_type: EventType,
    pub title_keywords: Vec<String>,
    pub entities: Vec<SmolStr>,
    pub source_trust: u8,
    pub importance: f64,
}

/// Acceptance threshold for a candidate evidence event (§4.G step 7).
pub const EVIDENCE_ACCEPT_THRESHOLD: f64 = 0.3;

/// Event-type pairs treated as semantically adjacent for the evidence
/// engine's semantic-relevance component (SPEC_FULL.md §4). Symmetric:
/// checked in both directions.
const TYPE_ADJACENCY: &[(EventType, EventType)] = &[
    (EventType::Sanctions, EventType::MarketDrop),
    (EventType::Sanctions, EventType::Regulatory),
    (EventType::RateHike, EventType::RubAppreciation),
    (EventType::RateHike, EventType::BankStockUp),
    (EventType::RateCut, EventType::RubDepreciation),
    (EventType::EarningsMiss, EventType::StockDrop),
    (EventType::EarningsBeat, EventType::StockRally),
    (EventType::GuidanceCut, EventType::StockDrop),
    (EventType::Default, EventType::BondCrash),
    (EventType::SupplyChain, EventType::ProductionDown),
    (EventType::Accident, EventType::StockDrop),
];

fn types_adjacent(a: EventType, b: EventType) -> bool {
    TYPE_ADJACENCY
        .iter()
        .any(|(x, y)| (*x == a && *y == b) || (*x == b && *y == a))
}

fn keyword_overlap(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let set_a: HashSet<&String> = a.iter().collect();
    let set_b: HashSet<&String> = b.iter().collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Temporal proximity: a Gaussian centred on the midpoint of `(cause.ts,
/// effect.ts)`, `sigma = 0.2` of the normalised position, scaled ×1.5 and
/// clamped (SPEC_FULL.md §4).
fn temporal_proximity(
    candidate_ts: chrono::DateTime<chrono::Utc>,
    cause_ts: chrono::DateTime<chrono::Utc>,
    effect_ts: chrono::DateTime<chrono::Utc>,
) -> f64 {
    let span = (effect_ts - cause_ts).num_seconds() as f64;
    if span <= 0.0 {
        return 0.0;
    }
    let relative_position = (candidate_ts - cause_ts).num_seconds() as f64 / span;
    const SIGMA: f64 = 0.2;
    let gaussian = (-((relative_position - 0.5).powi(2)) / (2.0 * SIGMA * SIGMA)).exp();
    (gaussian * 1.5).clamp(0.0, 1.0)
}

/// Semantic relevance: a flat bonus when the candidate's type is adjacent to
/// either endpoint's type, plus keyword overlap with either endpoint's
/// title (SPEC_FULL.md §4).
fn semantic_relevance(candidate: &EvidenceContext, cause: &EvidenceContext, effect: &EvidenceContext) -> f64 {
    let adjacency_bonus = if types_adjacent(candidate.event_type, cause.event_type)
        || types_adjacent(candidate.event_type, effect.event_type)
    {
        0.6
    } else {
        0.0
    };
    let overlap = keyword_overlap(&candidate.title_keywords, &cause.title_keywords)
        .max(keyword_overlap(&candidate.title_keywords, &effect.title_keywords));
    (adjacency_bonus + overlap * 0.4).clamp(0.0, 1.0)
}

/// Entity overlap: shared tickers/companies between the candidate and
/// either endpoint, normalised by the union (SPEC_FULL.md §4).
fn entity_overlap(candidate: &EvidenceContext, cause: &EvidenceContext, effect: &EvidenceContext) -> f64 {
    let combined: HashSet<&SmolStr> = cause.entities.iter().chain(effect.entities.iter()).collect();
    let candidate_set: HashSet<&SmolStr> = candidate.entities.iter().collect();
    if combined.is_empty() || candidate_set.is_empty() {
        return 0.0;
    }
    let intersection = combined.intersection(&candidate_set).count();
    let union = combined.union(&candidate_set).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Combined evidence score for `candidate` as support for the `cause ->
/// effect` link (§4.G step 7): temporal proximity 0.3, semantic relevance
/// 0.3, entity overlap 0.25, source trust 0.1, importance 0.05.
pub fn evidence_score(candidate: &EvidenceContext, cause: &EvidenceContext, effect: &EvidenceContext) -> f64 {
    let temporal = temporal_proximity(candidate.ts, cause.ts, effect.ts);
    let semantic = semantic_relevance(candidate, cause, effect);
    let entities = entity_overlap(candidate, cause, effect);
    let trust = candidate.source_trust as f64 / 10.0;
    let importance = candidate.importance.clamp(0.0, 1.0);

    (temporal * 0.3 + semantic * 0.3 + entities * 0.25 + trust * 0.1 + importance * 0.05).clamp(0.0, 1.0)
}

/// Select up to [`ceg_core::causal::CausalLink::EVIDENCE_HARD_CAP`] evidence
/// ids from `candidates` (events strictly between `cause.ts` and
/// `effect.ts`), keeping those scoring at or above
/// [`EVIDENCE_ACCEPT_THRESHOLD`], ranked highest first (§4.G step 7).
pub fn select_evidence(
    cause: &EvidenceContext,
    effect: &EvidenceContext,
    candidates: &[EvidenceContext],
) -> Vec<SmolStr> {
    let mut scored: Vec<(f64, SmolStr)> = candidates
        .iter()
        .filter(|candidate| candidate.ts > cause.ts && candidate.ts < effect.ts)
        .map(|candidate| (evidence_score(candidate, cause, effect), candidate.id.clone()))
        .filter(|(score, _)| *score >= EVIDENCE_ACCEPT_THRESHOLD)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(ceg_core::causal::CausalLink::EVIDENCE_HARD_CAP)
        .map(|(_, id)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn ctx(id: &str, hours: i64, event_type: EventType, entities: &[&str]) -> EvidenceContext {
        EvidenceContext {
            id: id.into(),
            ts: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours),
            event_type,
            title_keywords: vec!["sberbank".to_string(), "sanctions".to_string()],
            entities: entities.iter().map(|e| SmolStr::new(*e)).collect(),
            source_trust: 7,
            importance: 0.5,
        }
    }

    #[test]
    fn midpoint_candidate_scores_highest_temporal_component() {
        let cause = ctx("c", 0, EventType::Sanctions, &["SBER"]);
        let effect = ctx("e", 10, EventType::MarketDrop, &["SBER"]);
        let mid = ctx("mid", 5, EventType::Regulatory, &["SBER"]);
        let early = ctx("early", 1, EventType::Regulatory, &["SBER"]);

        assert!(evidence_score(&mid, &cause, &effect) > evidence_score(&early, &cause, &effect));
    }

    #[test]
    fn select_evidence_respects_hard_cap_and_window() {
        let cause = ctx("c", 0, EventType::Sanctions, &["SBER"]);
        let effect = ctx("e", 100, EventType::MarketDrop, &["SBER"]);
        let candidates: Vec<_> = (1..20)
            .map(|h| ctx(&format!("mid{h}"), h, EventType::Regulatory, &["SBER"]))
            .collect();

        let selected = select_evidence(&cause, &effect, &candidates);
        assert!(selected.len() <= 5);
    }

    #[test]
    fn candidates_outside_open_interval_are_excluded() {
        let cause = ctx("c", 0, EventType::Sanctions, &["SBER"]);
        let effect = ctx("e", 10, EventType::MarketDrop, &["SBER"]);
        let outside = ctx("outside", 20, EventType::Regulatory, &["SBER"]);
        assert!(select_evidence(&cause, &effect, &[outside]).is_empty());
    }
}
