use ceg_core::event::{Event, EventType};
use ceg_core::watch::{EventPrediction, EventPredictionOutcome};
use ceg_graph::cmnln::priors::priors_for_cause;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Running accuracy statistics over reconciled predictions (§4.J "contribute
/// to accuracy stats"). Not part of spec.md's data model by name, but
/// required by §7's "Prediction stale" row ("contribute to accuracy
/// stats") — kept here as the natural home for the counters it implies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionAccuracy {
    pub fulfilled: u64,
    pub unfulfilled: u64,
    pub retro_fulfilled: u64,
}

impl PredictionAccuracy {
    pub fn hit_rate(&self) -> f64 {
        let total = self.fulfilled + self.unfulfilled + self.retro_fulfilled;
        if total == 0 {
            0.0
        } else {
            (self.fulfilled + self.retro_fulfilled) as f64 / total as f64
        }
    }

    fn record(&mut self, outcome: EventPredictionOutcome) {
        match outcome {
            EventPredictionOutcome::Fulfilled => self.fulfilled += 1,
            EventPredictionOutcome::Unfulfilled => self.unfulfilled += 1,
            EventPredictionOutcome::RetroFulfilled => self.retro_fulfilled += 1,
        }
    }
}

/// Generate L2 predictions for a high-importance trigger event (§4.J L2),
/// enumerating the domain-prior rows whose `cause_type` matches the
/// trigger's type. `probability` is taken directly from the prior's
/// `conf_prior`; `target_window` is the prior's expected-lag bounds
/// projected forward from the trigger's timestamp.
///
/// Returns no predictions when the trigger does not clear
/// [`crate::rules::L2_TRIGGER_IMPORTANCE`] — callers should check that
/// before calling, this function only re-asserts it as a guard.
pub fn generate_predictions(
    trigger: &Event,
    importance_total: f64,
    generated_at: chrono::DateTime<chrono::Utc>,
) -> Vec<EventPrediction> {
    if importance_total < crate::rules::L2_TRIGGER_IMPORTANCE {
        return Vec::new();
    }

    priors_for_cause(trigger.event_type)
        .enumerate()
        .map(|(idx, prior)| {
            let (lo, hi) = prior.expected_lag.bounds();
            EventPrediction {
                id: SmolStr::new(format!("{}-pred-{idx}", trigger.id)),
                predicted_type: prior.effect_type,
                probability: prior.conf_prior,
                target_window: (trigger.ts + lo, trigger.ts + hi),
                base_event: trigger.id.clone(),
                generated_at,
                outcome: None,
            }
        })
        .collect()
}

/// Does `candidate` fulfil `prediction` (§4.J "Prediction fulfilment"): same
/// event type, inside the target window, and sharing at least one entity
/// (company or ticker) with the base event's context.
fn fulfils(prediction: &EventPrediction, candidate: &Event, base_entities: &[SmolStr]) -> bool {
    if candidate.event_type != prediction.predicted_type {
        return false;
    }
    if !prediction.window_contains(candidate.ts) {
        return false;
    }
    if base_entities.is_empty() {
        return true;
    }
    candidate
        .attrs
        .companies
        .iter()
        .chain(candidate.attrs.tickers.iter())
        .any(|entity| base_entities.contains(entity))
}

/// Reconcile every still-open prediction in `open` against `candidate`
/// (§4.J): the first matching prediction flips to `Fulfilled` and its
/// outcome is folded into `accuracy`. Matching is lazy — performed on each
/// new event rather than via a scheduled scan.
pub fn reconcile_new_event(
    open: &mut [EventPrediction],
    candidate: &Event,
    base_entities: &[SmolStr],
    accuracy: &mut PredictionAccuracy,
) -> Option<SmolStr> {
    for prediction in open.iter_mut() {
        if !prediction.is_open() {
            continue;
        }
        if fulfils(prediction, candidate, base_entities) {
            prediction.outcome = Some(EventPredictionOutcome::Fulfilled);
            accuracy.record(EventPredictionOutcome::Fulfilled);
            return Some(prediction.id.clone());
        }
    }
    None
}

/// Retroactively fulfil a prediction whose window already closed, when the
/// [`crate::reconciler::RetroactiveReconciler`] turns up a match during its
/// backward pass (§4.K). Distinct from [`reconcile_new_event`] so accuracy
/// stats can distinguish on-time hits from retroactively discovered ones.
pub fn reconcile_retroactive(
    closed: &mut [EventPrediction],
    candidate: &Event,
    base_entities: &[SmolStr],
    accuracy: &mut PredictionAccuracy,
) -> Option<SmolStr> {
    for prediction in closed.iter_mut() {
        if prediction.outcome != Some(EventPredictionOutcome::Unfulfilled) {
            continue;
        }
        if candidate.event_type != prediction.predicted_type {
            continue;
        }
        if base_entities.is_empty()
            || candidate
                .attrs
                .companies
                .iter()
                .chain(candidate.attrs.tickers.iter())
                .any(|entity| base_entities.contains(entity))
        {
            prediction.outcome = Some(EventPredictionOutcome::RetroFulfilled);
            accuracy.record(EventPredictionOutcome::RetroFulfilled);
            return Some(prediction.id.clone());
        }
    }
    None
}

/// Sweep `predictions` for windows that elapsed without a match (§7
/// "Prediction stale"), marking them `Unfulfilled` and folding the outcome
/// into `accuracy`.
pub fn sweep_stale(
    predictions: &mut [EventPrediction],
    now: chrono::DateTime<chrono::Utc>,
    accuracy: &mut PredictionAccuracy,
) {
    for prediction in predictions.iter_mut() {
        if prediction.is_open() && now > prediction.target_window.1 {
            prediction.outcome = Some(EventPredictionOutcome::Unfulfilled);
            accuracy.record(EventPredictionOutcome::Unfulfilled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ceg_core::event::EventAttrs;
    use chrono::{TimeZone, Utc};

    fn trigger(event_type: EventType, ts: chrono::DateTime<Utc>) -> Event {
        Event {
            id: "trig1".into(),
            record_source: "src".into(),
            record_external_id: "ext1".into(),
            event_type,
            title: "title".into(),
            ts,
            attrs: EventAttrs {
                companies: vec!["gazprom".into()],
                tickers: vec!["GAZP".into()],
                numeric_fields: Vec::new(),
            },
            is_anchor: true,
            extraction_confidence: 0.9,
        }
    }

    #[test]
    fn below_trigger_importance_yields_no_predictions() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let predictions = generate_predictions(&trigger(EventType::Sanctions, ts), 0.3, ts);
        assert!(predictions.is_empty());
    }

    #[test]
    fn high_importance_sanctions_predicts_market_drop() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let predictions = generate_predictions(&trigger(EventType::Sanctions, ts), 0.8, ts);
        assert!(!predictions.is_empty());
        assert!(predictions.iter().any(|p| p.predicted_type == EventType::MarketDrop));
        assert!(predictions.iter().all(|p| p.target_window.0 >= ts));
    }

    #[test]
    fn matching_event_inside_window_fulfils_prediction() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut predictions = generate_predictions(&trigger(EventType::Sanctions, ts), 0.8, ts);
        let mut accuracy = PredictionAccuracy::default();

        let candidate = Event {
            event_type: EventType::MarketDrop,
            ts: ts + chrono::Duration::hours(6),
            ..trigger(EventType::MarketDrop, ts + chrono::Duration::hours(6))
        };

        let matched = reconcile_new_event(&mut predictions, &candidate, &["GAZP".into()], &mut accuracy);
        assert!(matched.is_some());
        assert_eq!(accuracy.fulfilled, 1);
    }

    #[test]
    fn stale_prediction_marked_unfulfilled_after_window() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut predictions = generate_predictions(&trigger(EventType::Sanctions, ts), 0.8, ts);
        let mut accuracy = PredictionAccuracy::default();

        let far_future = ts + chrono::Duration::days(60);
        sweep_stale(&mut predictions, far_future, &mut accuracy);
        assert!(predictions.iter().all(|p| p.outcome == Some(EventPredictionOutcome::Unfulfilled)));
        assert!(accuracy.unfulfilled > 0);
    }

    #[test]
    fn retroactive_match_after_window_closed_counts_separately() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut predictions = generate_predictions(&trigger(EventType::Sanctions, ts), 0.8, ts);
        let mut accuracy = PredictionAccuracy::default();
        sweep_stale(&mut predictions, ts + chrono::Duration::days(60), &mut accuracy);

        let late_candidate = Event {
            event_type: EventType::MarketDrop,
            ts: ts + chrono::Duration::days(90),
            ..trigger(EventType::MarketDrop, ts + chrono::Duration::days(90))
        };
        let matched = reconcile_retroactive(&mut predictions, &late_candidate, &["GAZP".into()], &mut accuracy);
        assert!(matched.is_some());
        assert_eq!(accuracy.retro_fulfilled, 1);
        assert_eq!(accuracy.unfulfilled, predictions.len() as u64 - 1);
    }
}
