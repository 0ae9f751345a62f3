use ceg_core::causal::CausalLink;
use ceg_core::event::EventType;
use ceg_graph::cmnln;
use smol_str::SmolStr;

/// Default lookback window for successor/predecessor scans (§4.G, §4.K):
/// 30 days.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Default bound on how many candidate events are evaluated per new event,
/// in each direction (§4.K: "at most `retro_scan_cap` (default 100)
/// candidate successors per new event").
pub const DEFAULT_RETRO_SCAN_CAP: usize = 100;

/// Minimal view of an event needed to run it through a CMNLN pairwise
/// evaluation (§4.G), independent of how the caller sourced it.
#[derive(Debug, Clone)]
pub struct ReconcileCandidate {
    pub id: SmolStr,
    pub event_type: EventType,
    pub ts: chrono::DateTime<chrono::Utc>,
    pub text: String,
    pub tickers: Vec<SmolStr>,
}

/// Re-evaluates historical events against newly ingested ones within a
/// lookback window (§4.K). Runs after a batch of new Events has been
/// written; bounded by `retro_scan_cap` so a burst of ingestion cannot make
/// a single new event trigger unbounded pairwise work.
#[derive(Debug, Clone, Copy)]
pub struct RetroactiveReconciler {
    pub lookback: chrono::Duration,
    pub retro_scan_cap: usize,
}

impl Default for RetroactiveReconciler {
    fn default() -> Self {
        Self {
            lookback: chrono::Duration::days(DEFAULT_LOOKBACK_DAYS),
            retro_scan_cap: DEFAULT_RETRO_SCAN_CAP,
        }
    }
}

impl RetroactiveReconciler {
    pub fn new(lookback: chrono::Duration, retro_scan_cap: usize) -> Self {
        Self { lookback, retro_scan_cap }
    }

    /// Forward pass (§4.K): treat `new_event` as cause, scan `successors`
    /// (events after it) within the lookback window, capped at
    /// `retro_scan_cap`. `conf_market` supplies the event-study market
    /// confidence for each successor (computed by the caller via
    /// [`ceg_graph::market_impact::MarketImpactEngine`] before this call —
    /// this function, like [`cmnln::evaluate`], has no network access).
    pub fn reconcile_forward(
        &self,
        new_event: &ReconcileCandidate,
        successors: &[ReconcileCandidate],
        conf_market: impl Fn(&ReconcileCandidate) -> f64,
    ) -> Vec<CausalLink> {
        successors
            .iter()
            .filter(|successor| {
                successor.ts > new_event.ts && successor.ts - new_event.ts <= self.lookback
            })
            .take(self.retro_scan_cap)
            .filter_map(|successor| {
                cmnln::evaluate(
                    new_event.id.clone(),
                    successor.id.clone(),
                    new_event.event_type,
                    successor.event_type,
                    new_event.ts,
                    successor.ts,
                    &successor.text,
                    conf_market(successor),
                )
            })
            .collect()
    }

    /// Backward pass (§4.K): treat `new_event` as effect, scan
    /// `predecessors` (events before it) within the lookback window, capped
    /// at `retro_scan_cap`. Callers upsert the resulting links through the
    /// Graph Writer with `MergeRule::Strongest` so an existing edge is only
    /// replaced when the newly computed `conf_total` is higher ("events that
    /// occurred before and newly match as causes of older events can be
    /// updated if their conf_total increases").
    pub fn reconcile_backward(
        &self,
        new_event: &ReconcileCandidate,
        predecessors: &[ReconcileCandidate],
        conf_market: impl Fn(&ReconcileCandidate) -> f64,
    ) -> Vec<CausalLink> {
        let market_confidence = conf_market(new_event);
        predecessors
            .iter()
            .filter(|predecessor| {
                predecessor.ts < new_event.ts && new_event.ts - predecessor.ts <= self.lookback
            })
            .take(self.retro_scan_cap)
            .filter_map(|predecessor| {
                cmnln::evaluate(
                    predecessor.id.clone(),
                    new_event.id.clone(),
                    predecessor.event_type,
                    new_event.event_type,
                    predecessor.ts,
                    new_event.ts,
                    &new_event.text,
                    market_confidence,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candidate(id: &str, event_type: EventType, hour: i64, text: &str) -> ReconcileCandidate {
        ReconcileCandidate {
            id: id.into(),
            event_type,
            ts: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour),
            text: text.to_string(),
            tickers: vec!["GAZP".into()],
        }
    }

    #[test]
    fn forward_pass_links_new_event_to_later_successor() {
        let reconciler = RetroactiveReconciler::default();
        let new_event = candidate("enew", EventType::Sanctions, 0, "");
        let successors = vec![candidate("eold", EventType::MarketDrop, 6, "рынок упал из-за санкций")];

        let links = reconciler.reconcile_forward(&new_event, &successors, |_| 0.7);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].cause, "enew");
        assert_eq!(links[0].effect, "eold");
    }

    #[test]
    fn backward_pass_links_earlier_predecessor_to_new_event() {
        let reconciler = RetroactiveReconciler::default();
        // No causal markers in the effect's own text, matching the
        // retroactive scenario where the older event's original body has no
        // mention of the later-discovered cause (kind RETRO: prior clears
        // 0.5 but text is 0).
        let new_event = candidate("enew", EventType::MarketDrop, 6, "");
        let predecessors = vec![candidate("eold", EventType::Sanctions, 0, "")];

        let links = reconciler.reconcile_backward(&new_event, &predecessors, |_| 0.0);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].cause, "eold");
        assert_eq!(links[0].effect, "enew");
        assert_eq!(links[0].kind, ceg_core::causal::CausalLinkKind::Retro);
    }

    #[test]
    fn successors_outside_lookback_window_are_excluded() {
        let reconciler = RetroactiveReconciler::new(Duration::days(1), 100);
        let new_event = candidate("enew", EventType::Sanctions, 0, "");
        let successors = vec![candidate("far", EventType::MarketDrop, 24 * 10, "")];

        assert!(reconciler.reconcile_forward(&new_event, &successors, |_| 0.0).is_empty());
    }

    #[test]
    fn scan_is_capped_at_retro_scan_cap() {
        let reconciler = RetroactiveReconciler::new(Duration::days(30), 2);
        let new_event = candidate("enew", EventType::Sanctions, 0, "");
        let successors: Vec<_> = (1..10)
            .map(|h| candidate(&format!("s{h}"), EventType::MarketDrop, h, "санкции вызвали падение"))
            .collect();

        let links = reconciler.reconcile_forward(&new_event, &successors, |_| 0.9);
        assert!(links.len() <= 2);
    }
}
