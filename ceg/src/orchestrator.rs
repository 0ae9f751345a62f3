//! The orchestrator (§4.L): one logical worker per enabled [`Source`],
//! driving fetch → batch → extract → (event → importance → CMNLN → impact →
//! write → watch → reconcile) for every record, with the concurrency,
//! timeout and retry discipline from §5.

use crate::config::PipelineConfig;
use crate::error::CegError;
use ceg_core::causal::CausalLink;
use ceg_core::event::{Event, EventType};
use ceg_core::impact::{ImpactWindow, MarketDataProvider, SIGNIFICANCE_Z_THRESHOLD};
use ceg_core::instrument::{Instrument, SecurityType};
use ceg_core::record::Record;
use ceg_core::source::{Cursor, Source, SourceAdapter};
use ceg_core::store::{GraphQuery, GraphStore, MergeRule};
use ceg_core::watch::{EventPrediction, TriggeredWatch, WatchRule};
use ceg_data::cursor::CursorStore;
use ceg_data::dedup::DedupFilter;
use ceg_data::{Batcher, Chunk};
use ceg_extraction::client::{ExtractionClient, ExtractionRequest};
use ceg_graph::cmnln::chains::{self, Chain, ChainConfig, ChainDirection};
use ceg_graph::event_extractor::extract_events;
use ceg_graph::importance::{self, ImportanceInputs};
use ceg_graph::market_impact::MarketImpactEngine;
use ceg_graph::writer::GraphWriter;
use ceg_linker::resolver::InstrumentLinker;
use ceg_watch::notify::NotificationDispatcher;
use ceg_watch::predictions::{self, PredictionAccuracy};
use ceg_watch::reconciler::{ReconcileCandidate, RetroactiveReconciler};
use ceg_watch::rules;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

/// In-process rolling window feeding the Importance Scorer's `count_24h`,
/// `count_last_6h`, `similar_event_count_30d` and breadth inputs (§4.F). The
/// Graph Store's query shapes (§6: event-neighbourhood, instrument-timeline)
/// are not suited to these aggregate counts, so the orchestrator keeps its
/// own bounded history instead of re-deriving them from the store on every
/// event — see DESIGN.md for the corresponding Open Question resolution.
#[derive(Debug, Default)]
struct RollingStats {
    events: VecDeque<(DateTime<Utc>, EventType, Vec<SmolStr>)>,
}

const ROLLING_WINDOW_DAYS: i64 = 30;

impl RollingStats {
    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - ChronoDuration::days(ROLLING_WINDOW_DAYS);
        while matches!(self.events.front(), Some((ts, _, _)) if *ts < cutoff) {
            self.events.pop_front();
        }
    }

    fn similar_event_count_30d(&self, event_type: EventType) -> u32 {
        self.events.iter().filter(|(_, ty, _)| *ty == event_type).count() as u32
    }

    fn count_since(&self, floor: DateTime<Utc>) -> u32 {
        self.events.iter().filter(|(ts, _, _)| *ts >= floor).count() as u32
    }

    fn unique_entity_count(&self, entities: &[SmolStr], floor: DateTime<Utc>) -> usize {
        let mut unique: HashSet<&SmolStr> = self
            .events
            .iter()
            .filter(|(ts, _, _)| *ts >= floor)
            .flat_map(|(_, _, ents)| ents.iter())
            .collect();
        unique.extend(entities.iter());
        unique.len()
    }

    fn record(&mut self, ts: DateTime<Utc>, event_type: EventType, entities: Vec<SmolStr>) {
        self.prune(ts);
        self.events.push_back((ts, event_type, entities));
    }
}

/// Sector diversity has no dedicated field on [`ceg_core::event::EventAttrs`]
/// (company sector hints are dropped at Event-Extractor time, §4.E); this is
/// the documented proxy used instead — see DESIGN.md.
fn sector_diversity_proxy(unique_entity_count: usize) -> f64 {
    (unique_entity_count as f64 / 10.0).clamp(0.0, 1.0)
}

/// Composes every downstream crate into the end-to-end pipeline (§4.L).
/// Generic over the Graph Store and Market Data Provider backends, which are
/// genuinely external interfaces (§1 Non-goals): the binary wires up
/// [`ceg_core::store::InMemoryGraphStore`]/[`ceg_core::impact::NullMarketDataProvider`]
/// for a proof-of-concept run, a real deployment supplies its own.
pub struct Pipeline<S, P> {
    config: Arc<PipelineConfig>,
    sources: AsyncMutex<HashMap<String, Box<dyn SourceAdapter>>>,
    cursor_store: Arc<dyn CursorStore>,
    dedup: Arc<DedupFilter>,
    extraction: Arc<dyn ExtractionClient>,
    linker: Arc<InstrumentLinker>,
    writer: Arc<GraphWriter<S>>,
    impact_engine: Arc<MarketImpactEngine<P>>,
    notifications: Arc<NotificationDispatcher>,
    l0_rules: Vec<WatchRule>,
    l1_rules: Vec<WatchRule>,
    reconciler: RetroactiveReconciler,

    stats: Mutex<RollingStats>,
    open_watches: Mutex<Vec<TriggeredWatch>>,
    predictions: Mutex<Vec<EventPrediction>>,
    accuracy: Mutex<PredictionAccuracy>,
    recent_events: Mutex<VecDeque<ReconcileCandidate>>,

    shutdown: Arc<AtomicBool>,
}

impl<S, P> Pipeline<S, P>
where
    S: GraphStore + 'static,
    P: MarketDataProvider + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<PipelineConfig>,
        cursor_store: Arc<dyn CursorStore>,
        extraction: Arc<dyn ExtractionClient>,
        linker: Arc<InstrumentLinker>,
        writer: Arc<GraphWriter<S>>,
        impact_engine: Arc<MarketImpactEngine<P>>,
        notifications: Arc<NotificationDispatcher>,
    ) -> Self {
        let reconciler = RetroactiveReconciler::new(
            ChronoDuration::days(config.retro_lookback_days),
            config.retro_scan_cap,
        );
        Self {
            config,
            sources: AsyncMutex::new(HashMap::new()),
            cursor_store,
            dedup: Arc::new(DedupFilter::new()),
            extraction,
            linker,
            writer,
            impact_engine,
            notifications,
            l0_rules: rules::default_l0_rules(),
            l1_rules: rules::default_l1_rules(),
            reconciler,
            stats: Mutex::new(RollingStats::default()),
            open_watches: Mutex::new(Vec::new()),
            predictions: Mutex::new(Vec::new()),
            accuracy: Mutex::new(PredictionAccuracy::default()),
            recent_events: Mutex::new(VecDeque::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register the adapter backing one configured [`Source`]. Owned as
    /// `Box<dyn SourceAdapter>` rather than shared via `Arc`, since its
    /// methods take `&mut self` (one worker per source, §4.L).
    pub async fn register_source(&self, code: impl Into<String>, adapter: Box<dyn SourceAdapter>) {
        self.sources.lock().await.insert(code.into(), adapter);
    }

    /// Current prediction accuracy snapshot (§4.J "contribute to accuracy
    /// stats"), exposed for the CLI to report on exit.
    pub fn accuracy(&self) -> PredictionAccuracy {
        *self.accuracy.lock()
    }

    /// Request a graceful shutdown: in-flight chunks drain, the cursor is
    /// persisted, and `run_once`/`run_realtime` return (§4.L "On shutdown").
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn resolve_source_codes(&self, requested: &[String]) -> Vec<String> {
        if requested.is_empty() {
            self.config.enabled_sources().map(|source| source.code.to_string()).collect()
        } else {
            requested.to_vec()
        }
    }

    /// One full pass over each requested source: backfill until the adapter
    /// reports fewer records than its fetch limit, then stop (§4.L, `--days`
    /// mode).
    pub async fn run_once(&self, requested: &[String]) -> Result<(), CegError> {
        for code in self.resolve_source_codes(requested) {
            if self.is_shutting_down() {
                return Err(CegError::Cancelled);
            }
            self.run_source_to_completion(&code).await?;
        }
        self.flush_aliases();
        Ok(())
    }

    /// Polls every requested source on its configured interval until
    /// shutdown is requested (`--realtime` mode, §4.L).
    pub async fn run_realtime(&self, requested: &[String]) -> Result<(), CegError> {
        let codes = self.resolve_source_codes(requested);
        let poll_interval = codes
            .iter()
            .filter_map(|code| self.config.source(code))
            .map(|source| source.options.poll_interval)
            .min()
            .unwrap_or(std::time::Duration::from_secs(30));

        loop {
            if self.is_shutting_down() {
                break;
            }
            for code in &codes {
                if self.is_shutting_down() {
                    break;
                }
                self.run_source_to_completion(code).await?;
            }
            tokio::select! {
                _ = tokio::time::sleep(poll_interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received, draining in-flight work");
                    self.request_shutdown();
                }
            }
        }
        self.flush_aliases();
        Ok(())
    }

    fn flush_aliases(&self) {
        if let Err(error) = self.linker.flush_aliases() {
            warn!(%error, "failed to flush learned-alias table on shutdown");
        }
    }

    async fn run_source_to_completion(&self, code: &str) -> Result<(), CegError> {
        let source = self
            .config
            .source(code)
            .cloned()
            .ok_or_else(|| CegError::Config(format!("unknown source {code}")))?;
        let mut adapter = self
            .sources
            .lock()
            .await
            .remove(code)
            .ok_or_else(|| CegError::Config(format!("no adapter registered for source {code}")))?;

        let result = self.drain_source(&source, adapter.as_mut()).await;

        self.sources.lock().await.insert(code.to_string(), adapter);
        result
    }

    async fn drain_source(&self, source: &Source, adapter: &mut dyn SourceAdapter) -> Result<(), CegError> {
        adapter
            .open()
            .await
            .map_err(|error| CegError::Config(format!("source {} failed to open: {error}", source.code)))?;

        loop {
            if self.is_shutting_down() {
                break;
            }

            let cursor = self
                .cursor_store
                .load(&source.code)
                .await?
                .unwrap_or_default();

            let records = match adapter.fetch_since(&cursor, source.options.fetch_limit).await {
                Ok(records) => records,
                Err(error) if error.is_fatal() => {
                    let _ = adapter.close().await;
                    return Err(CegError::Config(format!(
                        "source {} disabled: {error}",
                        source.code
                    )));
                }
                Err(error) => {
                    warn!(source = %source.code, %error, "fetch failed, stopping this cycle");
                    break;
                }
            };

            if records.is_empty() {
                break;
            }
            let exhausted = records.len() < source.options.fetch_limit;

            let fresh: Vec<Record> = self.dedup.retain_new(&records).into_iter().cloned().collect();
            let batcher = Batcher::new(self.config.batch_size);

            let mut last_cursor = cursor;
            for chunk in batcher.chunk(fresh) {
                if self.is_shutting_down() {
                    break;
                }
                match self.process_batch_with_retry(source, &chunk).await {
                    Ok(()) => {
                        if let Some(last) = chunk.records.last() {
                            last_cursor = Cursor {
                                last_external_id: Some(last.external_id.clone()),
                                last_timestamp: Some(last.published_at),
                                backfill_completed_at: last_cursor.backfill_completed_at,
                            };
                            self.cursor_store.save(&source.code, &last_cursor).await?;
                        }
                    }
                    Err(error) => {
                        warn!(
                            source = %source.code,
                            %error,
                            "batch dropped after exhausting its batch-level retry"
                        );
                    }
                }
            }

            if exhausted {
                break;
            }
        }

        let _ = adapter.close().await;
        Ok(())
    }

    /// Batch-level retry: the whole batch (every chunk's side effects) is
    /// retried at most once before being dropped, each attempt bounded by
    /// the batch deadline (§5 "Cancellation & timeouts").
    async fn process_batch_with_retry(&self, source: &Source, chunk: &Chunk) -> Result<(), CegError> {
        if chunk.is_empty() {
            return Ok(());
        }
        let deadline = self.config.batch_deadline();

        for attempt in 1..=2 {
            match tokio::time::timeout(deadline, self.process_batch(chunk)).await {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(error)) if attempt == 1 => {
                    warn!(source = %source.code, %error, "batch failed, retrying once");
                }
                Ok(Err(error)) => return Err(error),
                Err(_) if attempt == 1 => {
                    warn!(source = %source.code, "batch exceeded its deadline, retrying once");
                }
                Err(_) => {
                    return Err(CegError::Config(format!(
                        "batch for source {} exceeded its deadline twice",
                        source.code
                    )));
                }
            }
        }
        unreachable!("the loop above always returns within two attempts")
    }

    async fn process_batch(&self, chunk: &Chunk) -> Result<(), CegError> {
        let requests: Vec<ExtractionRequest> = chunk
            .records
            .iter()
            .map(|record| ExtractionRequest {
                id: SmolStr::new(format!("{}-{}", record.source, record.external_id)),
                text: format!("{}\n\n{}", record.title, record.body),
                source: record.source.clone(),
                timestamp: record.published_at,
            })
            .collect();

        let extractions = self.run_extraction(&requests).await?;

        let results: Vec<Result<(), CegError>> = stream::iter(chunk.records.iter().zip(extractions))
            .map(|(record, extraction)| self.process_record(record, extraction))
            .buffer_unordered(self.config.batch_size)
            .collect()
            .await;

        results.into_iter().collect::<Result<Vec<()>, CegError>>()?;
        Ok(())
    }

    /// Dispatches to the batch RPC when the client supports it, otherwise
    /// issues `requests.len()` concurrent single calls, preserving input
    /// order either way (§4.C: "exactly one Extraction per input, in input
    /// order").
    async fn run_extraction(&self, requests: &[ExtractionRequest]) -> Result<Vec<ceg_core::extraction::Extraction>, CegError> {
        if self.extraction.supports_batch() {
            Ok(self.extraction.extract_batch(requests).await?)
        } else {
            let futures = requests.iter().map(|request| self.extraction.extract_single(request));
            let results = futures::future::join_all(futures).await;
            Ok(results.into_iter().collect::<Result<Vec<_>, _>>()?)
        }
    }

    /// Per-record pipeline (§4.L): Event Extractor → Instrument Linker →
    /// Importance Scorer → Market Impact → CMNLN → Graph Writer → Watchers →
    /// Reconciler. Events within one record are processed in order; events
    /// from different records in the same chunk run concurrently.
    async fn process_record(&self, record: &Record, extraction: ceg_core::extraction::Extraction) -> Result<(), CegError> {
        let seed = format!("{}-{}", record.source, record.external_id);
        let anchor_types = self.config.anchor_types();
        let events = extract_events(record, &extraction, &seed, &anchor_types);

        for mut event in events {
            self.link_instruments(&mut event).await;

            let entities: Vec<SmolStr> = event
                .attrs
                .companies
                .iter()
                .chain(event.attrs.tickers.iter())
                .cloned()
                .collect();

            let inputs = {
                let stats = self.stats.lock();
                let day_ago = event.ts - ChronoDuration::hours(24);
                let six_hours_ago = event.ts - ChronoDuration::hours(6);
                ImportanceInputs {
                    similar_event_count_30d: stats.similar_event_count_30d(event.event_type),
                    count_24h: stats.count_since(day_ago),
                    count_last_6h: stats.count_since(six_hours_ago),
                    trust_level: record.trust_level,
                    is_anchor: event.is_anchor,
                    corroboration_bonus: 0.0,
                    unique_entity_count: stats.unique_entity_count(&entities, day_ago),
                    sector_diversity: sector_diversity_proxy(stats.unique_entity_count(&entities, day_ago)),
                }
            };

            let ticker_impacts = self.measure_impacts(&event).await;
            let conf_market = ticker_impacts.iter().cloned().fold(0.0_f64, f64::max);

            let importance = importance::score(event.event_type, inputs, &ticker_impacts, &self.config.importance_weights);

            self.stats.lock().record(event.ts, event.event_type, entities.clone());

            self.writer.upsert_event(event.clone()).await?;

            self.evaluate_watchers(&event, importance.total, importance.burst).await;
            self.reconcile_predictions(&event, &entities);

            if importance.total >= rules::L2_TRIGGER_IMPORTANCE {
                let generated = predictions::generate_predictions(&event, importance.total, event.ts);
                if !generated.is_empty() {
                    self.predictions.lock().extend(generated);
                }
            }

            self.infer_causal_links(&event, &record.body, conf_market).await?;
            self.push_recent_event(&event, &record.body);
        }

        Ok(())
    }

    /// Resolves every company mention on `event` via the Instrument Linker,
    /// persists any newly-seen [`Instrument`], and fills `event.attrs.tickers`
    /// with the resulting instrument ids (§4.D, invariant 1 §8).
    async fn link_instruments(&self, event: &mut Event) {
        let mut tickers = Vec::with_capacity(event.attrs.companies.len());
        for company in event.attrs.companies.clone() {
            let Some(result) = self.linker.resolve(company.as_str()).await else {
                continue;
            };
            let instrument = Instrument {
                exchange: self.config.default_exchange.as_str().into(),
                symbol: result.ticker.clone(),
                isin: None,
                primary_board: None,
                traded: true,
                market: "equity".into(),
                security_type: SecurityType::Equity,
            };
            let instrument_id = SmolStr::new(instrument.id());
            if let Err(error) = self.writer.upsert_instrument(instrument).await {
                warn!(%error, company = %company, "failed to persist linked instrument");
                continue;
            }
            tickers.push(instrument_id);
        }
        event.attrs.tickers = tickers;
    }

    /// Runs the market-impact event study over `event`'s linked tickers at
    /// the one-day window (§4.H), persisting every significant edge and
    /// returning a normalised (`z / SIGNIFICANCE_Z_THRESHOLD`, clamped)
    /// impact per ticker for the Importance Scorer and CMNLN's `conf_market`.
    async fn measure_impacts(&self, event: &Event) -> Vec<f64> {
        let mut impacts = Vec::with_capacity(event.attrs.tickers.len());
        for ticker in &event.attrs.tickers {
            match self
                .impact_engine
                .measure(&event.id, ticker, event.ts, ImpactWindow::OneDay)
                .await
            {
                Ok(Some(edge)) => {
                    let normalized = (edge.z_score.abs() / SIGNIFICANCE_Z_THRESHOLD).clamp(0.0, 1.0);
                    impacts.push(normalized);
                    if let Err(error) = self.writer.upsert_impact_edge(edge).await {
                        warn!(%error, event = %event.id, "failed to persist impact edge");
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, event = %event.id, ticker = %ticker, "market data unavailable, treating impact as non-significant");
                }
            }
        }
        impacts
    }

    async fn evaluate_watchers(&self, event: &Event, importance_total: f64, burst_component: f64) {
        let now = event.ts;
        for rule_set in [&self.l0_rules, &self.l1_rules] {
            let triggered = rules::evaluate(rule_set, event, importance_total, burst_component, now);
            for watch in triggered {
                let failed = self.notifications.dispatch(&watch).await;
                if !failed.is_empty() {
                    warn!(rule = %watch.rule_id, failed = ?failed, "some notification handlers failed");
                }
                self.open_watches.lock().push(watch);
            }
        }
        self.sweep_expired_watches(now);
    }

    fn sweep_expired_watches(&self, now: DateTime<Utc>) {
        let mut watches = self.open_watches.lock();
        for idx in rules::expired_indices(&watches, now).into_iter().rev() {
            watches.remove(idx);
        }
    }

    fn reconcile_predictions(&self, event: &Event, entities: &[SmolStr]) {
        let mut open = self.predictions.lock();
        let mut accuracy = self.accuracy.lock();
        predictions::sweep_stale(&mut open, event.ts, &mut accuracy);
        if let Some(matched) = predictions::reconcile_new_event(&mut open, event, entities, &mut accuracy) {
            info!(prediction = %matched, event = %event.id, "prediction fulfilled");
        }
        if let Some(matched) = predictions::reconcile_retroactive(&mut open, event, entities, &mut accuracy) {
            info!(prediction = %matched, event = %event.id, "prediction retroactively fulfilled");
        }
    }

    /// Runs `event` both as the effect against every still-recent candidate
    /// cause (§4.K backward pass: "events that occurred before and newly
    /// match as causes of older events can be updated") and as the cause
    /// against every still-recent candidate successor (§4.K forward pass:
    /// "treat new Event E as cause, scan events within the lookback window
    /// that occurred after it") — necessary because §6 lets a source
    /// adapter return most-recent-first, so a just-ingested *older* event
    /// can have already-processed, still-in-window events after it in
    /// `recent_events`. Writes any surviving link with
    /// [`MergeRule::Strongest`] so a later, stronger re-derivation can
    /// supersede an earlier weaker one without ever downgrading it.
    async fn infer_causal_links(&self, event: &Event, effect_text: &str, conf_market: f64) -> Result<(), CegError> {
        let window: Vec<ReconcileCandidate> = self.recent_events.lock().iter().cloned().collect();
        let candidate = ReconcileCandidate {
            id: event.id.clone(),
            event_type: event.event_type,
            ts: event.ts,
            text: effect_text.to_string(),
            tickers: event.attrs.tickers.clone(),
        };

        let backward_links = self
            .reconciler
            .reconcile_backward(&candidate, &window, |_| conf_market);
        let forward_links = self
            .reconciler
            .reconcile_forward(&candidate, &window, |_| conf_market);

        for link in backward_links.into_iter().chain(forward_links) {
            self.writer.upsert_causal_link(link, MergeRule::Strongest).await?;
        }
        Ok(())
    }

    fn push_recent_event(&self, event: &Event, text: &str) {
        let mut recent = self.recent_events.lock();
        recent.push_back(ReconcileCandidate {
            id: event.id.clone(),
            event_type: event.event_type,
            ts: event.ts,
            text: text.to_string(),
            tickers: event.attrs.tickers.clone(),
        });
        let cutoff = event.ts - self.reconciler.lookback;
        while matches!(recent.front(), Some(candidate) if candidate.ts < cutoff) {
            recent.pop_front();
        }
        while recent.len() > self.config.retro_scan_cap * 4 {
            recent.pop_front();
        }
    }

    /// On-demand chain discovery (§4.G "Chain discovery"): deliberately not
    /// part of the mandatory per-event loop above, since spec.md §4.L names
    /// only Event Extractor → Importance Scorer → CMNLN → Market Impact →
    /// Graph Writer → Watchers → Reconciler as the batch pipeline. Exposed
    /// here as an analytics entry point the CLI or a future API surface can
    /// call against the graph already written.
    pub async fn discover_chains(
        &self,
        root: &str,
        direction: ChainDirection,
        config: &ChainConfig,
    ) -> Result<Vec<Chain>, CegError> {
        let neighborhood = self
            .writer
            .query(GraphQuery::EventNeighborhood {
                event: root.into(),
                hops: config.max_depth as u8,
            })
            .await?;

        let mut outgoing: HashMap<SmolStr, Vec<CausalLink>> = HashMap::new();
        let mut incoming: HashMap<SmolStr, Vec<CausalLink>> = HashMap::new();
        let mut event_ts = HashMap::new();

        for event in &neighborhood.events {
            event_ts.insert(event.id.clone(), event.ts);
        }
        for link in neighborhood.links {
            outgoing.entry(link.cause.clone()).or_default().push(link.clone());
            incoming.entry(link.effect.clone()).or_default().push(link);
        }

        // No importance snapshot is available from a neighbourhood query
        // alone; `discover_chains` falls back to a neutral 0.5 per endpoint.
        let importance = HashMap::new();

        Ok(chains::discover_chains(
            &SmolStr::new(root),
            direction,
            config,
            &outgoing,
            &incoming,
            &event_ts,
            &importance,
        ))
    }
}
