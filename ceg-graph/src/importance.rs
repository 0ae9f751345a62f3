use ceg_core::event::EventType;
use ceg_core::importance::{ImportanceScore, ImportanceWeights};

/// Rarity prior per event type (SPEC_FULL.md §4, `_get_event_type_rarity`).
/// Types absent from this table default to 0.5.
pub fn event_type_rarity(event_type: EventType) -> f64 {
    match event_type {
        EventType::Sanctions => 0.9,
        EventType::Default => 0.95,
        EventType::Ipo => 0.85,
        EventType::Ma => 0.75,
        EventType::RateHike | EventType::RateCut => 0.65,
        EventType::EarningsMiss | EventType::EarningsBeat => 0.4,
        EventType::Earnings => 0.3,
        _ => 0.5,
    }
}

/// Event types treated as "broad" for the breadth bonus (§4.F).
fn is_broad_type(event_type: EventType) -> bool {
    matches!(
        event_type,
        EventType::Sanctions | EventType::Regulatory | EventType::MarketDrop
    )
}

/// Event types in the high-credibility subset that earn a credibility bonus
/// beyond the anchor-type bonus (§4.F).
fn is_high_credibility_type(event_type: EventType) -> bool {
    matches!(
        event_type,
        EventType::Sanctions | EventType::Default | EventType::RateHike | EventType::RateCut
    )
}

/// Novelty: `1 - (similar_event_count_30d / 5)` clamped, blended 0.7/0.3
/// with the event-type rarity prior (SPEC_FULL.md §4,
/// `_calculate_novelty_score`).
pub fn novelty(similar_event_count_30d: u32, event_type: EventType) -> f64 {
    let base = (1.0 - similar_event_count_30d as f64 / 5.0).clamp(0.0, 1.0);
    let blended = base * 0.7 + event_type_rarity(event_type) * 0.3;
    blended.clamp(0.0, 1.0)
}

/// Burst: `min(1, (count_24h - 1)^0.7 / 10)`, with a +0.3 bump when more
/// than 70% of those events fell in the trailing 6h (SPEC_FULL.md §4,
/// `_calculate_burst_score`).
pub fn burst(count_24h: u32, count_last_6h: u32) -> f64 {
    if count_24h == 0 {
        return 0.1;
    }
    let base = (((count_24h - 1).max(0) as f64).powf(0.7) / 10.0).min(1.0);
    let bumped = if count_24h > 0 && count_last_6h as f64 > count_24h as f64 * 0.7 {
        base + 0.3
    } else {
        base
    };
    bumped.clamp(0.0, 1.0)
}

/// Credibility: source trust centred on 5 (`(trust-5)*0.1`), plus a bonus
/// for anchor types, a bonus for the high-credibility type subset, and a
/// corroboration bonus scaled by `0.1` (SPEC_FULL.md §4,
/// `_calculate_credibility_score`).
pub fn credibility(
    trust_level: u8,
    is_anchor: bool,
    event_type: EventType,
    corroboration_bonus: f64,
) -> f64 {
    let mut score = 0.5 + (trust_level as f64 - 5.0) * 0.1;
    if is_anchor {
        score += 0.2;
    }
    if is_high_credibility_type(event_type) {
        score += 0.15;
    }
    score += corroboration_bonus.clamp(0.0, 1.0) * 0.1;
    score.clamp(0.0, 1.0)
}

/// Breadth: the piecewise unique-entity-count function from spec.md §4.F,
/// plus a sector-diversity bonus (`diversity * 0.2`) and a flat bonus for
/// broad event types.
pub fn breadth(unique_entity_count: usize, sector_diversity: f64, event_type: EventType) -> f64 {
    let base = match unique_entity_count {
        0 | 1 => 0.1,
        2..=3 => 0.3,
        4..=10 => 0.6,
        _ => 0.9,
    };
    let mut score = base + sector_diversity.clamp(0.0, 1.0) * 0.2;
    if is_broad_type(event_type) {
        score += 0.2;
    }
    score.clamp(0.0, 1.0)
}

/// Price impact: mean of per-ticker normalised price/volume impact, with a
/// bonus when the max exceeds 0.7 (spec.md §4.F).
pub fn price_impact(ticker_impacts: &[f64]) -> f64 {
    if ticker_impacts.is_empty() {
        return 0.0;
    }
    let mean = ticker_impacts.iter().sum::<f64>() / ticker_impacts.len() as f64;
    let max = ticker_impacts.iter().cloned().fold(f64::MIN, f64::max);
    let bonus = if max > 0.7 { 0.2 } else { 0.0 };
    (mean + bonus).clamp(0.0, 1.0)
}

/// Inputs consumed by [`score`], gathered by the orchestrator from recent
/// graph state before calling into the Importance Scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportanceInputs {
    pub similar_event_count_30d: u32,
    pub count_24h: u32,
    pub count_last_6h: u32,
    pub trust_level: u8,
    pub is_anchor: bool,
    pub corroboration_bonus: f64,
    pub unique_entity_count: usize,
    pub sector_diversity: f64,
}

pub fn score(
    event_type: EventType,
    inputs: ImportanceInputs,
    ticker_impacts: &[f64],
    weights: &ImportanceWeights,
) -> ImportanceScore {
    let components = [
        novelty(inputs.similar_event_count_30d, event_type),
        burst(inputs.count_24h, inputs.count_last_6h),
        credibility(
            inputs.trust_level,
            inputs.is_anchor,
            event_type,
            inputs.corroboration_bonus,
        ),
        breadth(inputs.unique_entity_count, inputs.sector_diversity, event_type),
        price_impact(ticker_impacts),
    ];
    ImportanceScore::compute(components, weights)
}
