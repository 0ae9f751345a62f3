use ceg_core::causal::{CausalLink, CausalLinkKind, LagClass, Sign};
use ceg_core::event::EventType;
use smol_str::SmolStr;

pub mod chains;
pub mod evidence;
pub mod markers;
pub mod priors;

use priors::find_prior;

/// Discard threshold on `conf_total` (§4.G step 5).
pub const DISCARD_THRESHOLD: f64 = 0.3;

/// Evaluate one candidate `(cause, effect)` pair against the CMNLN rules
/// (§4.G steps 1-6), returning the resulting [`CausalLink`] or `None` when
/// the pair fails the temporal guard or the combined confidence falls below
/// [`DISCARD_THRESHOLD`].
///
/// `conf_market` is the caller-supplied market-confidence component (§4.G
/// step 4: "best over tickers" of the event-study significance, already
/// computed via [`crate::market_impact::MarketImpactEngine`] before this
/// call — this function has no network access of its own).
#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    cause_id: SmolStr,
    effect_id: SmolStr,
    cause_type: EventType,
    effect_type: EventType,
    cause_ts: chrono::DateTime<chrono::Utc>,
    effect_ts: chrono::DateTime<chrono::Utc>,
    effect_text: &str,
    conf_market: f64,
) -> Option<CausalLink> {
    if cause_ts >= effect_ts {
        return None;
    }
    let _ = effect_type; // matched only via the prior table's cause_type, per the original engine

    let (conf_prior, sign, lag_class) = match find_prior(cause_type) {
        Some(prior) => {
            let mut conf_prior = prior.conf_prior;
            if !prior.expected_lag.matches(effect_ts - cause_ts) {
                conf_prior *= 0.5;
            }
            (conf_prior, prior.sign, prior.expected_lag)
        }
        None => (0.0, Sign::Mixed, LagClass::from_delay(effect_ts - cause_ts)),
    };

    let conf_text = markers::text_marker_confidence(effect_text);

    let kind = classify_kind(conf_prior, conf_text);

    let link = CausalLink::new(
        cause_id,
        effect_id,
        cause_ts,
        effect_ts,
        kind,
        sign,
        lag_class,
        conf_prior,
        conf_text,
        conf_market,
    )
    .ok()?;

    if link.confidence < DISCARD_THRESHOLD {
        return None;
    }

    Some(link)
}

/// `CONFIRMED` when both prior and text clear 0.6; `RETRO` when the prior
/// alone clears 0.5; otherwise `HYPOTHESIS` (§4.G step 6).
fn classify_kind(conf_prior: f64, conf_text: f64) -> CausalLinkKind {
    if conf_prior >= 0.6 && conf_text >= 0.6 {
        CausalLinkKind::Confirmed
    } else if conf_prior >= 0.5 && conf_text < 0.6 {
        CausalLinkKind::Retro
    } else {
        CausalLinkKind::Hypothesis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn ts(hour: i64) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    #[test]
    fn rejects_reversed_temporal_order() {
        let result = evaluate(
            "c".into(),
            "e".into(),
            EventType::Sanctions,
            EventType::MarketDrop,
            ts(5),
            ts(0),
            "",
            0.0,
        );
        assert!(result.is_none());
    }

    #[test]
    fn known_prior_with_markers_and_market_confirms() {
        let link = evaluate(
            "c".into(),
            "e".into(),
            EventType::Sanctions,
            EventType::MarketDrop,
            ts(0),
            ts(6),
            "Рынок упал из-за новых санкций",
            0.8,
        )
        .unwrap();
        assert_eq!(link.kind, CausalLinkKind::Confirmed);
        assert_eq!(link.sign, Sign::Negative);
        assert_eq!(link.lag_class.to_string(), "0-1d");
    }

    #[test]
    fn lag_mismatch_halves_prior_confidence() {
        // sanctions -> market_drop expects 0-1d; pushing effect 10 days out
        // should fall outside the window and halve conf_prior.
        let in_window = evaluate(
            "c".into(),
            "e".into(),
            EventType::Sanctions,
            EventType::MarketDrop,
            ts(0),
            ts(6),
            "",
            0.0,
        );
        let out_of_window = evaluate(
            "c".into(),
            "e".into(),
            EventType::Sanctions,
            EventType::MarketDrop,
            ts(0),
            ts(24 * 10),
            "",
            0.0,
        );
        assert!(in_window.unwrap().confidence > out_of_window.map(|l| l.confidence).unwrap_or(0.0));
    }

    #[test]
    fn no_prior_and_no_text_and_no_market_is_discarded() {
        let result = evaluate(
            "c".into(),
            "e".into(),
            EventType::Ipo,
            EventType::StockVolatility,
            ts(0),
            ts(1),
            "",
            0.0,
        );
        assert!(result.is_none());
    }
}
