use crate::event::EventType;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Escalation tier of a watcher rule (§4.J): `L0` direct match, `L1`
/// multi-step pattern, `L2` predictive.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, Display)]
pub enum WatchLevel {
    L0,
    L1,
    L2,
}

/// A configured watcher rule (§4.J, SPEC_FULL.md §4 `WatchRule`/
/// `WatchCondition`): `event_types`/`sectors_or_companies` define the match
/// scope, `importance_threshold`/`burst_threshold` gate the trigger, and
/// `auto_expire_hours` sets how long a [`TriggeredWatch`] opened from this
/// rule stays open before the expiry sweep reclaims it (default 168, §4.J
/// "Auto-expiry"). The same shape serves both L0 (resolves immediately) and
/// L1 (opens a longer-lived follow-up watch) — only the interpretation of
/// `auto_expire_hours` differs between the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchRule {
    pub id: SmolStr,
    pub level: WatchLevel,
    pub event_types: Vec<EventType>,
    /// Sector or company-id scope. Empty means "any".
    pub sectors_or_companies: Vec<SmolStr>,
    pub importance_threshold: f64,
    pub burst_threshold: f64,
    pub auto_expire_hours: i64,
}

/// A watch opened against a specific trigger event, still within its
/// configured window (§3, §4.J).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredWatch {
    pub rule_id: SmolStr,
    pub trigger_event: SmolStr,
    pub opened_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl TriggeredWatch {
    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Outcome of an [`EventPrediction`] once a matching event arrives or its
/// target window elapses (§3, §4.J "Prediction fulfilment").
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display)]
pub enum EventPredictionOutcome {
    /// A matching event occurred inside the target window.
    Fulfilled,
    /// The target window elapsed with nothing matching (§7 "Prediction
    /// stale").
    Unfulfilled,
    /// A matching event was found after the window closed, surfaced by the
    /// retroactive reconciler (§4.K).
    RetroFulfilled,
}

/// A forecast generated by an L2 watcher (§3): predicted event type,
/// probability, target time window, originating (base) event, generation
/// time, and fulfilment status. `outcome` is `None` while the prediction is
/// still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPrediction {
    pub id: SmolStr,
    pub predicted_type: EventType,
    pub probability: f64,
    pub target_window: (chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>),
    pub base_event: SmolStr,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub outcome: Option<EventPredictionOutcome>,
}

impl EventPrediction {
    pub fn is_open(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn window_contains(&self, ts: chrono::DateTime<chrono::Utc>) -> bool {
        ts >= self.target_window.0 && ts <= self.target_window.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn triggered_watch_expiry() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let watch = TriggeredWatch {
            rule_id: "r1".into(),
            trigger_event: "e1".into(),
            opened_at: now,
            expires_at: now + Duration::hours(1),
        };
        assert!(!watch.is_expired(now));
        assert!(watch.is_expired(now + Duration::hours(2)));
    }

    #[test]
    fn prediction_open_until_outcome_set() {
        let now = Utc::now();
        let mut prediction = EventPrediction {
            id: "p1".into(),
            predicted_type: EventType::MarketDrop,
            probability: 0.6,
            target_window: (now, now + Duration::hours(6)),
            base_event: "e1".into(),
            generated_at: now,
            outcome: None,
        };
        assert!(prediction.is_open());
        prediction.outcome = Some(EventPredictionOutcome::Fulfilled);
        assert!(!prediction.is_open());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let prediction = EventPrediction {
            id: "p1".into(),
            predicted_type: EventType::MarketDrop,
            probability: 0.6,
            target_window: (now, now + Duration::hours(6)),
            base_event: "e1".into(),
            generated_at: now,
            outcome: None,
        };
        assert!(prediction.window_contains(now));
        assert!(prediction.window_contains(now + Duration::hours(6)));
        assert!(!prediction.window_contains(now + Duration::hours(7)));
    }
}
