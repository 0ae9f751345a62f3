use ceg_core::event::{Event, EventAttrs, EventType};
use ceg_core::extraction::Extraction;
use ceg_core::record::Record;
use smol_str::SmolStr;
use std::str::FromStr;

/// Pure function: `(Record, Extraction) -> Vec<Event>` (§4.E). One Event per
/// tagged event-type; emits nothing when the extraction carries no
/// event-type tags and no significant financial metric.
///
/// `anchor_types` is the configured anchor set (§9 REDESIGN FLAG 4: the
/// anchor set is externalised to [`ceg_core::event::default_anchor_types`]
/// only as a fallback; callers pass `PipelineConfig::anchor_types()` here).
///
/// Unrecognised event-type strings are dropped rather than propagated as an
/// error: the closed vocabulary is enforced upstream by the extraction
/// model's prompt contract, and a single bad tag should not sink the whole
/// record.
pub fn extract_events(
    record: &Record,
    extraction: &Extraction,
    id_seed: &str,
    anchor_types: &[EventType],
) -> Vec<Event> {
    if !extraction.has_significant_content() {
        return Vec::new();
    }

    let companies: Vec<SmolStr> = extraction
        .companies
        .iter()
        .map(|mention| SmolStr::new(mention.raw_text.trim()))
        .collect();

    extraction
        .event_types
        .iter()
        .filter_map(|raw| EventType::from_str(raw).ok())
        .enumerate()
        .map(|(idx, event_type)| {
            let mut event = Event {
                id: SmolStr::new(format!("{id_seed}-{idx}")),
                record_source: record.source.clone(),
                record_external_id: record.external_id.clone(),
                event_type,
                title: record.title.clone(),
                ts: record.published_at,
                attrs: EventAttrs {
                    companies: companies.clone(),
                    tickers: Vec::new(),
                    numeric_fields: extraction.financial_metrics.clone(),
                },
                is_anchor: false,
                extraction_confidence: extraction.confidence,
            };
            event.recompute_anchor(anchor_types);
            event
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ceg_core::event::default_anchor_types;
    use ceg_core::extraction::CompanyMention;
    use chrono::Utc;

    fn record() -> Record {
        Record {
            source: "reuters".into(),
            external_id: "ext-1".into(),
            url: None,
            title: "Sberbank sanctioned".to_string(),
            body: "body".to_string(),
            published_at: Utc::now(),
            trust_level: 8,
        }
    }

    #[test]
    fn empty_extraction_yields_no_events() {
        let events = extract_events(&record(), &Extraction::empty(), "seed", default_anchor_types());
        assert!(events.is_empty());
    }

    #[test]
    fn one_event_per_tagged_type_with_anchor_flag() {
        let extraction = Extraction {
            companies: vec![CompanyMention {
                raw_text: "Sberbank".to_string(),
                ticker_hint: None,
                sector_hint: None,
            }],
            event_types: vec!["sanctions".into(), "ipo".into()],
            confidence: 0.9,
            ..Extraction::empty()
        };
        let events = extract_events(&record(), &extraction, "seed", default_anchor_types());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::Sanctions);
        assert!(events[0].is_anchor);
        assert_eq!(events[1].event_type, EventType::Ipo);
        assert!(!events[1].is_anchor);
    }

    #[test]
    fn unknown_event_type_tags_are_dropped_not_fatal() {
        let extraction = Extraction {
            event_types: vec!["sanctions".into(), "not_a_real_type".into()],
            confidence: 0.5,
            ..Extraction::empty()
        };
        let events = extract_events(&record(), &extraction, "seed", default_anchor_types());
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn significant_metric_without_event_type_still_empty() {
        let extraction = Extraction {
            financial_metrics: vec![("eps_beat_pct".into(), 4.2)],
            confidence: 0.4,
            ..Extraction::empty()
        };
        // has_significant_content is true, but no event_types tags means no
        // Event is produced - only the type tags drive Event creation.
        assert!(extract_events(&record(), &extraction, "seed", default_anchor_types()).is_empty());
    }
}
