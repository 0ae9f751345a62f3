use ceg_core::causal::CausalLink;
use ceg_core::event::Event;
use ceg_core::impact::ImpactEdge;
use ceg_core::instrument::{Company, Instrument};
use ceg_core::store::{GraphQuery, GraphQueryResult, GraphStore, MergeRule, StoreError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Retries, 3 attempts with exponential backoff base 2s (§4.I, §5).
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_secs(2);

/// Wraps a [`GraphStore`] with the retry policy required of the Graph
/// Writer (§4.I: "each operation retried with exponential backoff (3
/// attempts, base 2s)"; "a write failure for a single edge must not
/// prevent other writes in the same batch" — callers drive that guarantee
/// by calling each `upsert_*` independently and collecting failures rather
/// than short-circuiting on the first error).
pub struct GraphWriter<S> {
    store: Arc<S>,
}

impl<S> GraphWriter<S>
where
    S: GraphStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn upsert_event(&self, event: Event) -> Result<(), StoreError> {
        let id = event.id.clone();
        retry(|| self.store.upsert_event(event.clone()), &id).await
    }

    pub async fn upsert_instrument(&self, instrument: Instrument) -> Result<(), StoreError> {
        let id = instrument.id();
        retry(|| self.store.upsert_instrument(instrument.clone()), &id).await
    }

    pub async fn upsert_company(&self, company: Company) -> Result<(), StoreError> {
        let id = company.id.to_string();
        retry(|| self.store.upsert_company(company.clone()), &id).await
    }

    pub async fn upsert_causal_link(&self, link: CausalLink, merge_rule: MergeRule) -> Result<(), StoreError> {
        let id = format!("{}->{}", link.cause, link.effect);
        retry(|| self.store.upsert_causal_link(link.clone(), merge_rule), &id).await
    }

    pub async fn upsert_impact_edge(&self, edge: ImpactEdge) -> Result<(), StoreError> {
        let id = format!("{}~{}", edge.event, edge.instrument);
        retry(|| self.store.upsert_impact_edge(edge.clone()), &id).await
    }

    pub async fn query(&self, query: GraphQuery) -> Result<GraphQueryResult, StoreError> {
        self.store.query(query).await
    }
}

async fn retry<F, Fut>(mut operation: F, id: &str) -> Result<(), StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), StoreError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(()) => return Ok(()),
            Err(error) if attempt < MAX_ATTEMPTS => {
                let backoff = BACKOFF_BASE * 2u32.pow(attempt - 1);
                warn!(id, attempt, %error, backoff_secs = backoff.as_secs(), "graph write failed, retrying");
                tokio::time::sleep(backoff).await;
            }
            Err(error) => return Err(error),
        }
    }
}
