use ceg_core::event::{default_anchor_types, EventType};
use ceg_core::extraction::{CompanyMention, Extraction};
use ceg_core::record::Record;
use ceg_graph::cmnln::evidence::{evidence_score, select_evidence, EvidenceContext};
use ceg_graph::cmnln::{evaluate, DISCARD_THRESHOLD};
use ceg_graph::extract_events;
use ceg_graph::importance;
use chrono::{Duration, TimeZone, Utc};

fn record(title: &str, published_at: chrono::DateTime<Utc>) -> Record {
    Record {
        source: "reuters".into(),
        external_id: "ext-1".into(),
        url: None,
        title: title.to_string(),
        body: String::new(),
        published_at,
        trust_level: 8,
    }
}

#[test]
fn extraction_to_causal_link_end_to_end() {
    let sanctions_ts = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let drop_ts = sanctions_ts + Duration::hours(6);

    let sanctions_extraction = Extraction {
        companies: vec![CompanyMention {
            raw_text: "Gazprom".to_string(),
            ticker_hint: None,
            sector_hint: None,
        }],
        event_types: vec!["sanctions".into()],
        confidence: 0.9,
        ..Extraction::empty()
    };
    let sanctions_events = extract_events(
        &record("Gazprom sanctioned", sanctions_ts),
        &sanctions_extraction,
        "seed-1",
        default_anchor_types(),
    );
    assert_eq!(sanctions_events.len(), 1);
    let sanctions_event = &sanctions_events[0];
    assert!(sanctions_event.is_anchor);

    let drop_extraction = Extraction {
        event_types: vec!["market_drop".into()],
        confidence: 0.7,
        ..Extraction::empty()
    };
    let drop_events = extract_events(
        &record("Market falls as a result", drop_ts),
        &drop_extraction,
        "seed-2",
        default_anchor_types(),
    );
    let drop_event = &drop_events[0];

    let link = evaluate(
        sanctions_event.id.clone(),
        drop_event.id.clone(),
        sanctions_event.event_type,
        drop_event.event_type,
        sanctions_event.ts,
        drop_event.ts,
        "Market fell due to new sanctions",
        0.7,
    )
    .expect("sanctions -> market_drop within the expected lag window should confirm");

    assert!(link.confidence >= DISCARD_THRESHOLD);
    assert_eq!(link.cause, sanctions_event.id);
    assert_eq!(link.effect, drop_event.id);
    assert_eq!(link.lag_class.to_string(), "0-1d");
}

#[test]
fn high_importance_anchor_feeds_watcher_trigger_threshold() {
    let inputs = importance::ImportanceInputs {
        similar_event_count_30d: 0,
        count_24h: 5,
        count_last_6h: 4,
        trust_level: 9,
        is_anchor: true,
        corroboration_bonus: 0.5,
        unique_entity_count: 6,
        sector_diversity: 0.4,
    };
    let score = importance::score(
        EventType::Sanctions,
        inputs,
        &[0.8, 0.3],
        &ceg_core::importance::ImportanceWeights::default(),
    );

    // A fresh, corroborated, high-trust sanctions event with real price
    // impact should clear the L0 default threshold (0.6) used in ceg-watch.
    assert!(score.total >= 0.6, "expected high importance, got {}", score.total);
}

#[test]
fn evidence_selection_prefers_midpoint_relevant_events() {
    let cause_ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let effect_ts = cause_ts + Duration::hours(10);

    let cause = EvidenceContext {
        id: "cause".into(),
        ts: cause_ts,
        event_type: EventType::Sanctions,
        title_keywords: vec!["gazprom".into(), "sanctions".into()],
        entities: vec!["GAZP".into()],
        source_trust: 8,
        importance: 0.7,
    };
    let effect = EvidenceContext {
        id: "effect".into(),
        ts: effect_ts,
        event_type: EventType::MarketDrop,
        title_keywords: vec!["gazprom".into(), "market".into()],
        entities: vec!["GAZP".into()],
        source_trust: 7,
        importance: 0.6,
    };
    let relevant_midpoint = EvidenceContext {
        id: "mid".into(),
        ts: cause_ts + Duration::hours(5),
        event_type: EventType::Regulatory,
        title_keywords: vec!["gazprom".into()],
        entities: vec!["GAZP".into()],
        source_trust: 7,
        importance: 0.5,
    };
    let irrelevant = EvidenceContext {
        id: "noise".into(),
        ts: cause_ts + Duration::hours(1),
        event_type: EventType::Ipo,
        title_keywords: vec!["unrelated".into()],
        entities: vec!["UNKNOWN".into()],
        source_trust: 3,
        importance: 0.1,
    };

    assert!(evidence_score(&relevant_midpoint, &cause, &effect) > evidence_score(&irrelevant, &cause, &effect));

    let selected = select_evidence(&cause, &effect, &[relevant_midpoint.clone(), irrelevant]);
    assert_eq!(selected, vec![relevant_midpoint.id]);
}
