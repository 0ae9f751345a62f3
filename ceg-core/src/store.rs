use crate::causal::CausalLink;
use crate::event::Event;
use crate::impact::ImpactEdge;
use crate::instrument::{Company, Instrument};
use async_trait::async_trait;
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("node {id} not found")]
    NodeNotFound { id: String },
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Merge policy applied when an upsert collides with an existing edge
/// (§6, Graph Writer). `Strongest` keeps whichever of the two has the higher
/// confidence; `Latest` always replaces; `Additive` merges evidence lists.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MergeRule {
    Strongest,
    Latest,
    Additive,
}

/// A graph query restricted to the shapes the pipeline actually needs
/// (§6): either everything touching one event, or everything touching one
/// instrument within a time range.
#[derive(Debug, Clone)]
pub enum GraphQuery {
    EventNeighborhood {
        event: SmolStr,
        hops: u8,
    },
    InstrumentTimeline {
        instrument: SmolStr,
        from: chrono::DateTime<chrono::Utc>,
        to: chrono::DateTime<chrono::Utc>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct GraphQueryResult {
    pub events: Vec<Event>,
    pub links: Vec<CausalLink>,
    pub impacts: Vec<ImpactEdge>,
}

/// External-interface trait (§6) implemented by the Graph Writer's storage
/// backend. Upserts are keyed by stable ids (`Event::id`, `Instrument::id()`)
/// so reruns over the same source data are idempotent (invariant 4, §8).
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn upsert_event(&self, event: Event) -> Result<(), StoreError>;
    async fn upsert_instrument(&self, instrument: Instrument) -> Result<(), StoreError>;
    async fn upsert_company(&self, company: Company) -> Result<(), StoreError>;
    async fn upsert_causal_link(
        &self,
        link: CausalLink,
        merge_rule: MergeRule,
    ) -> Result<(), StoreError>;
    async fn upsert_impact_edge(&self, edge: ImpactEdge) -> Result<(), StoreError>;
    async fn query(&self, query: GraphQuery) -> Result<GraphQueryResult, StoreError>;
}

/// In-memory [`GraphStore`] for proof-of-concept runs and tests. Keyed by the
/// same stable ids the real relational/graph backend would use, so an
/// orchestrator exercised against this store observes the same idempotence
/// behaviour it would against a production backend.
/// **Do not use in production - no persistence, no fault tolerance.**
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    events: Mutex<HashMap<SmolStr, Event>>,
    instruments: Mutex<HashMap<String, Instrument>>,
    companies: Mutex<HashMap<SmolStr, Company>>,
    causal_links: Mutex<HashMap<(SmolStr, SmolStr), CausalLink>>,
    impact_edges: Mutex<HashMap<(SmolStr, SmolStr), ImpactEdge>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn upsert_event(&self, event: Event) -> Result<(), StoreError> {
        self.events.lock().insert(event.id.clone(), event);
        Ok(())
    }

    async fn upsert_instrument(&self, instrument: Instrument) -> Result<(), StoreError> {
        self.instruments.lock().insert(instrument.id(), instrument);
        Ok(())
    }

    async fn upsert_company(&self, company: Company) -> Result<(), StoreError> {
        self.companies.lock().insert(company.id.clone(), company);
        Ok(())
    }

    async fn upsert_causal_link(&self, link: CausalLink, merge_rule: MergeRule) -> Result<(), StoreError> {
        let key = (link.cause.clone(), link.effect.clone());
        let mut links = self.causal_links.lock();
        match (links.get(&key), merge_rule) {
            (Some(existing), MergeRule::Strongest) if existing.confidence >= link.confidence => {}
            _ => {
                links.insert(key, link);
            }
        }
        Ok(())
    }

    async fn upsert_impact_edge(&self, edge: ImpactEdge) -> Result<(), StoreError> {
        let key = (edge.event.clone(), edge.instrument.clone());
        self.impact_edges.lock().insert(key, edge);
        Ok(())
    }

    async fn query(&self, query: GraphQuery) -> Result<GraphQueryResult, StoreError> {
        match query {
            GraphQuery::EventNeighborhood { event, .. } => {
                let events = self
                    .events
                    .lock()
                    .get(&event)
                    .cloned()
                    .into_iter()
                    .collect::<Vec<_>>();
                let links = self
                    .causal_links
                    .lock()
                    .values()
                    .filter(|link| link.cause == event || link.effect == event)
                    .cloned()
                    .collect();
                let impacts = self
                    .impact_edges
                    .lock()
                    .values()
                    .filter(|edge| edge.event == event)
                    .cloned()
                    .collect();
                Ok(GraphQueryResult { events, links, impacts })
            }
            GraphQuery::InstrumentTimeline { instrument, from, to } => {
                let events = self
                    .events
                    .lock()
                    .values()
                    .filter(|event| {
                        event.ts >= from && event.ts <= to && event.attrs.tickers.contains(&instrument)
                    })
                    .cloned()
                    .collect();
                let impacts = self
                    .impact_edges
                    .lock()
                    .values()
                    .filter(|edge| edge.instrument == instrument)
                    .cloned()
                    .collect();
                Ok(GraphQueryResult {
                    events,
                    links: Vec::new(),
                    impacts,
                })
            }
        }
    }
}

#[cfg(test)]
mod in_memory_tests {
    use super::*;
    use crate::causal::{CausalLinkKind, LagClass, Sign};
    use crate::event::{EventAttrs, EventType};
    use chrono::Utc;

    fn event(id: &str) -> Event {
        Event {
            id: id.into(),
            record_source: "src".into(),
            record_external_id: "ext".into(),
            event_type: EventType::Sanctions,
            title: "title".into(),
            ts: Utc::now(),
            attrs: EventAttrs::default(),
            is_anchor: true,
            extraction_confidence: 0.9,
        }
    }

    #[tokio::test]
    async fn upsert_event_is_idempotent_by_id() {
        let store = InMemoryGraphStore::new();
        store.upsert_event(event("e1")).await.unwrap();
        store.upsert_event(event("e1")).await.unwrap();
        let result = store
            .query(GraphQuery::EventNeighborhood { event: "e1".into(), hops: 1 })
            .await
            .unwrap();
        assert_eq!(result.events.len(), 1);
    }

    #[tokio::test]
    async fn strongest_merge_rule_keeps_higher_confidence_link() {
        let store = InMemoryGraphStore::new();
        let weak = CausalLink::new(
            "c".into(),
            "e".into(),
            Utc::now(),
            Utc::now(),
            CausalLinkKind::Hypothesis,
            Sign::Negative,
            LagClass::ZeroToOneDay,
            0.1,
            0.1,
            0.1,
        )
        .unwrap();
        let strong = CausalLink::new(
            "c".into(),
            "e".into(),
            Utc::now(),
            Utc::now(),
            CausalLinkKind::Confirmed,
            Sign::Negative,
            LagClass::ZeroToOneDay,
            0.9,
            0.9,
            0.9,
        )
        .unwrap();

        store.upsert_causal_link(weak, MergeRule::Strongest).await.unwrap();
        store.upsert_causal_link(strong.clone(), MergeRule::Strongest).await.unwrap();

        let result = store
            .query(GraphQuery::EventNeighborhood { event: "c".into(), hops: 1 })
            .await
            .unwrap();
        assert_eq!(result.links.len(), 1);
        assert_eq!(result.links[0].confidence, strong.confidence);
    }
}
