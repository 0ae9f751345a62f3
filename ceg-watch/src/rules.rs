use ceg_core::event::{Event, EventType};
use ceg_core::watch::{TriggeredWatch, WatchLevel, WatchRule};

/// Default auto-expiry for a triggered watch (§4.J, §5): 168 hours.
pub const DEFAULT_AUTO_EXPIRE_HOURS: i64 = 168;

/// The default L0 rule set (§4.J examples): critical sanctions, defaults,
/// central-bank rate moves, large M&A, major accidents. Externalised here
/// as plain data so a deployment can load its own set from configuration
/// instead (REDESIGN FLAG, spec.md §9 open question 4).
pub fn default_l0_rules() -> Vec<WatchRule> {
    vec![
        WatchRule {
            id: "critical_sanctions".into(),
            level: WatchLevel::L0,
            event_types: vec![EventType::Sanctions],
            sectors_or_companies: Vec::new(),
            importance_threshold: 0.6,
            burst_threshold: 0.0,
            auto_expire_hours: DEFAULT_AUTO_EXPIRE_HOURS,
        },
        WatchRule {
            id: "defaults".into(),
            level: WatchLevel::L0,
            event_types: vec![EventType::Default],
            sectors_or_companies: Vec::new(),
            importance_threshold: 0.5,
            burst_threshold: 0.0,
            auto_expire_hours: DEFAULT_AUTO_EXPIRE_HOURS,
        },
        WatchRule {
            id: "central_bank_moves".into(),
            level: WatchLevel::L0,
            event_types: vec![EventType::RateHike, EventType::RateCut],
            sectors_or_companies: Vec::new(),
            importance_threshold: 0.5,
            burst_threshold: 0.0,
            auto_expire_hours: DEFAULT_AUTO_EXPIRE_HOURS,
        },
        WatchRule {
            id: "large_mna".into(),
            level: WatchLevel::L0,
            event_types: vec![EventType::Ma],
            sectors_or_companies: Vec::new(),
            importance_threshold: 0.55,
            burst_threshold: 0.0,
            auto_expire_hours: DEFAULT_AUTO_EXPIRE_HOURS,
        },
        WatchRule {
            id: "major_accidents".into(),
            level: WatchLevel::L0,
            event_types: vec![EventType::Accident],
            sectors_or_companies: Vec::new(),
            importance_threshold: 0.6,
            burst_threshold: 0.3,
            auto_expire_hours: DEFAULT_AUTO_EXPIRE_HOURS,
        },
    ]
}

/// The default L1 pattern set: sanctions and central-bank moves open a
/// multi-day sector-reaction watch (§4.J L1: "creates a follow-up watch for
/// configurable days that monitors sector reaction / cascade").
pub fn default_l1_rules() -> Vec<WatchRule> {
    vec![
        WatchRule {
            id: "sanctions_sector_reaction".into(),
            level: WatchLevel::L1,
            event_types: vec![EventType::Sanctions],
            sectors_or_companies: Vec::new(),
            importance_threshold: 0.5,
            burst_threshold: 0.0,
            auto_expire_hours: 7 * 24,
        },
        WatchRule {
            id: "rate_move_sector_reaction".into(),
            level: WatchLevel::L1,
            event_types: vec![EventType::RateHike, EventType::RateCut],
            sectors_or_companies: Vec::new(),
            importance_threshold: 0.4,
            burst_threshold: 0.0,
            auto_expire_hours: 5 * 24,
        },
    ]
}

fn matches(rule: &WatchRule, event: &Event, importance_total: f64, burst_component: f64) -> bool {
    if !rule.event_types.contains(&event.event_type) {
        return false;
    }
    if importance_total < rule.importance_threshold {
        return false;
    }
    if burst_component < rule.burst_threshold {
        return false;
    }
    if rule.sectors_or_companies.is_empty() {
        return true;
    }
    event
        .attrs
        .companies
        .iter()
        .chain(event.attrs.tickers.iter())
        .any(|entity| rule.sectors_or_companies.contains(entity))
}

/// Evaluate `event` against `rules` (either [`default_l0_rules`] or
/// [`default_l1_rules`]), returning one [`TriggeredWatch`] per matching rule
/// (§4.J).
pub fn evaluate(
    rules: &[WatchRule],
    event: &Event,
    importance_total: f64,
    burst_component: f64,
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<TriggeredWatch> {
    rules
        .iter()
        .filter(|rule| matches(rule, event, importance_total, burst_component))
        .map(|rule| TriggeredWatch {
            rule_id: rule.id.clone(),
            trigger_event: event.id.clone(),
            opened_at: now,
            expires_at: now + chrono::Duration::hours(rule.auto_expire_hours),
        })
        .collect()
}

/// Minimum importance an event must clear before it is eligible to seed an
/// L2 predictive watch (§4.J: "for high-importance triggers").
pub const L2_TRIGGER_IMPORTANCE: f64 = 0.6;

/// Sweep a set of triggered watches, returning the indices of those expired
/// as of `now` (§4.J "Auto-expiry": "an expiry sweep runs periodically and
/// marks expired, releasing capacity").
pub fn expired_indices(watches: &[TriggeredWatch], now: chrono::DateTime<chrono::Utc>) -> Vec<usize> {
    watches
        .iter()
        .enumerate()
        .filter(|(_, watch)| watch.is_expired(now))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ceg_core::event::EventAttrs;
    use chrono::{TimeZone, Utc};

    fn event(event_type: EventType) -> Event {
        Event {
            id: "e1".into(),
            record_source: "src".into(),
            record_external_id: "ext1".into(),
            event_type,
            title: "title".into(),
            ts: Utc::now(),
            attrs: EventAttrs::default(),
            is_anchor: true,
            extraction_confidence: 0.9,
        }
    }

    #[test]
    fn critical_sanctions_triggers_above_importance_threshold() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let rules = default_l0_rules();
        let triggered = evaluate(&rules, &event(EventType::Sanctions), 0.8, 0.0, now);
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].rule_id, "critical_sanctions");
        assert_eq!(
            triggered[0].expires_at,
            now + chrono::Duration::hours(DEFAULT_AUTO_EXPIRE_HOURS)
        );
    }

    #[test]
    fn below_importance_threshold_does_not_trigger() {
        let now = Utc::now();
        let rules = default_l0_rules();
        let triggered = evaluate(&rules, &event(EventType::Sanctions), 0.1, 0.0, now);
        assert!(triggered.is_empty());
    }

    #[test]
    fn l1_opens_a_multi_day_follow_up_watch() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let rules = default_l1_rules();
        let triggered = evaluate(&rules, &event(EventType::Sanctions), 0.7, 0.0, now);
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].expires_at, now + chrono::Duration::days(7));
    }

    #[test]
    fn expiry_sweep_finds_only_elapsed_watches() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        let watches = vec![
            TriggeredWatch {
                rule_id: "a".into(),
                trigger_event: "e1".into(),
                opened_at: now - chrono::Duration::days(20),
                expires_at: now - chrono::Duration::days(1),
            },
            TriggeredWatch {
                rule_id: "b".into(),
                trigger_event: "e2".into(),
                opened_at: now,
                expires_at: now + chrono::Duration::days(1),
            },
        ];
        assert_eq!(expired_indices(&watches, now), vec![0]);
    }
}
