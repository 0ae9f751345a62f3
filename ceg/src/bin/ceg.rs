//! Reference CLI binary for the CEG orchestrator (§6 "CLI surface").
//!
//! Wires the library crate's [`ceg::Pipeline`] against proof-of-concept
//! implementations of the genuinely external interfaces (§1 Non-goals: the
//! chat-channel client, individual HTML scrapers, the LLM provider
//! transport, and the MOEX market-data provider are all out of scope) so the
//! flag contract and exit-code mapping in spec.md §6 have somewhere to run.
//! A real deployment supplies its own [`ceg_core::source::SourceAdapter`]s,
//! [`ceg_core::store::GraphStore`] and [`ceg_core::impact::MarketDataProvider`].

use ceg::config::PipelineConfig;
use ceg::orchestrator::Pipeline;
use ceg_core::impact::NullMarketDataProvider;
use ceg_core::store::InMemoryGraphStore;
use ceg_data::adapters::mock::MockSourceAdapter;
use ceg_data::cursor::FileCursorStore;
use ceg_extraction::client::ExtractionClient;
use ceg_extraction::local::LocalExtractionClient;
use ceg_extraction::remote::RemoteExtractionClient;
use ceg_graph::market_impact::MarketImpactEngine;
use ceg_graph::writer::GraphWriter;
use ceg_linker::alias::AliasTable;
use ceg_linker::exchange::ExchangeSearchClient;
use ceg_linker::resolver::{InstrumentLinker, SecurityIndex};
use ceg_watch::notify::{LogNotificationHandler, NotificationDispatcher};
use clap::{Parser, ValueEnum};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ExtractionMode {
    Remote,
    Local,
}

/// Flags mirror spec.md §6 exactly: `--source`, `--days`, `--realtime`,
/// `--batch-size`, `--extraction`.
#[derive(Debug, Parser)]
#[command(name = "ceg", version, about = "Causal Event Graph pipeline orchestrator")]
struct Cli {
    /// Path to the JSON `PipelineConfig` (§6 "Persisted state" siblings:
    /// this is the one input the CLI itself requires to know which sources
    /// to drive).
    #[arg(long)]
    config: std::path::PathBuf,

    /// Restrict the run to these source codes; defaults to every enabled
    /// source in the config.
    #[arg(long = "source")]
    sources: Vec<String>,

    /// Historical lookback in days for the initial backfill. Informational
    /// at this layer: per-source `lookback_days` in the config governs the
    /// adapter's own backfill behaviour.
    #[arg(long, default_value_t = 7)]
    days: u32,

    /// Poll continuously instead of running one ingestion cycle.
    #[arg(long)]
    realtime: bool,

    /// Overrides `PipelineConfig::batch_size` for this run.
    #[arg(long = "batch-size")]
    batch_size: Option<usize>,

    #[arg(long = "extraction", value_enum, default_value_t = ExtractionMode::Local)]
    extraction: ExtractionMode,
}

/// A fixed in-memory security universe standing in for the real exchange
/// instrument index (§4.D tiers 1 and 4). Loading the actual MOEX security
/// list is out of scope (§1 Non-goals: the MOEX market-data provider).
#[derive(Debug)]
struct StaticSecurityIndex {
    securities: Vec<(SmolStr, String)>,
}

impl StaticSecurityIndex {
    fn demo() -> Self {
        Self {
            securities: vec![
                (SmolStr::new("GAZP"), "Gazprom PJSC".to_string()),
                (SmolStr::new("SBER"), "Sberbank of Russia PJSC".to_string()),
                (SmolStr::new("GMKN"), "Norilsk Nickel PJSC".to_string()),
                (SmolStr::new("LKOH"), "Lukoil PJSC".to_string()),
                (SmolStr::new("ROSN"), "Rosneft Oil Company".to_string()),
            ],
        }
    }
}

impl SecurityIndex for StaticSecurityIndex {
    fn lookup_ticker(&self, ticker: &str) -> Option<SmolStr> {
        self.securities
            .iter()
            .find(|(symbol, _)| symbol.as_str() == ticker)
            .map(|(symbol, _)| symbol.clone())
    }

    fn all_securities(&self) -> Vec<(SmolStr, String)> {
        self.securities.clone()
    }
}

fn known_aliases() -> HashMap<String, SmolStr> {
    let mut known = HashMap::new();
    known.insert("sberbank".to_string(), SmolStr::new("SBER"));
    known.insert("gazprom".to_string(), SmolStr::new("GAZP"));
    known.insert("lukoil".to_string(), SmolStr::new("LKOH"));
    known.insert("rosneft".to_string(), SmolStr::new("ROSN"));
    known
}

/// Naive keyword-tagging stand-in for the real extraction model (§1
/// Non-goals: training/hosting NER/LLM models is out of scope). Scans the
/// record text for the closed event-type vocabulary's wire strings so the
/// rest of the pipeline has something to process without a live LLM
/// endpoint configured.
fn heuristic_local_extraction(text: &str) -> ceg_core::extraction::Extraction {
    use ceg_core::event::EventType;
    use ceg_core::extraction::{CompanyMention, Extraction};

    let lower = text.to_lowercase();
    let event_types: Vec<SmolStr> = EventType::ALL
        .iter()
        .filter(|ty| {
            let spaced = ty.as_wire_str().replace('_', " ");
            lower.contains(spaced.as_str()) || lower.contains(ty.as_wire_str())
        })
        .map(|ty| SmolStr::new(ty.as_wire_str()))
        .collect();

    if event_types.is_empty() {
        return Extraction::empty();
    }

    let companies: Vec<CompanyMention> = known_aliases()
        .keys()
        .filter(|name| lower.contains(name.as_str()))
        .map(|name| CompanyMention {
            raw_text: name.clone(),
            ticker_hint: None,
            sector_hint: None,
        })
        .collect();

    Extraction {
        companies,
        event_types,
        confidence: 0.6,
        ..Extraction::empty()
    }
}

fn build_extraction_client(
    mode: ExtractionMode,
    config: &PipelineConfig,
) -> Result<Arc<dyn ExtractionClient>, String> {
    match mode {
        ExtractionMode::Local => Ok(Arc::new(LocalExtractionClient::new(|text: &str| {
            heuristic_local_extraction(text)
        }))),
        ExtractionMode::Remote => {
            let base_url = config
                .remote_extraction_base_url
                .as_deref()
                .ok_or_else(|| "remote extraction selected but remote_extraction_base_url is unset".to_string())?;
            let url = url::Url::parse(base_url).map_err(|error| error.to_string())?;
            Ok(Arc::new(RemoteExtractionClient::new(url, 10, Duration::from_secs(1))))
        }
    }
}

fn build_linker(config: &PipelineConfig) -> Arc<InstrumentLinker> {
    let alias_table = AliasTable::new(known_aliases()).with_persistence(&config.learned_alias_path);
    if let Err(error) = alias_table.load_learned(&config.learned_alias_path) {
        error!(%error, "failed to load learned-alias file, starting with the known set only");
    }

    let mut linker = InstrumentLinker::new(Arc::new(StaticSecurityIndex::demo()), alias_table);
    if let Some(base_url) = &config.exchange_search_base_url {
        match url::Url::parse(base_url) {
            Ok(url) => {
                linker = linker.with_exchange_client(ExchangeSearchClient::new(url, 10, Duration::from_secs(1)));
            }
            Err(error) => error!(%error, "invalid exchange_search_base_url, tier 3 disabled for this run"),
        }
    }
    Arc::new(linker)
}

async fn run(cli: Cli) -> Result<(), ceg::CegError> {
    let mut config = PipelineConfig::load(&cli.config)?;
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    let config = Arc::new(config);

    let extraction = build_extraction_client(cli.extraction, &config)
        .map_err(ceg::CegError::Config)?;
    let linker = build_linker(&config);

    let store = Arc::new(InMemoryGraphStore::new());
    let writer = Arc::new(GraphWriter::new(store));

    let market_provider = Arc::new(NullMarketDataProvider);
    let impact_engine = Arc::new(MarketImpactEngine::new(market_provider, config.benchmark_instrument.clone()));

    let mut notifications = NotificationDispatcher::new();
    notifications.register(Box::new(LogNotificationHandler));

    let cursor_store = Arc::new(FileCursorStore::new(config.cursor_path.clone()));

    let pipeline = Pipeline::new(
        config.clone(),
        cursor_store,
        extraction,
        linker,
        writer,
        impact_engine,
        Arc::new(notifications),
    );

    let requested = if cli.sources.is_empty() {
        config.enabled_sources().map(|source| source.code.to_string()).collect::<Vec<_>>()
    } else {
        cli.sources.clone()
    };

    for code in &requested {
        // The chat-channel client and individual HTML scrapers are out of
        // scope (§1); every configured source is backed by an empty mock
        // adapter here so the orchestrator's flag contract and exit codes
        // have a concrete path to exercise.
        pipeline
            .register_source(code.clone(), Box::new(MockSourceAdapter::new(code.clone(), Vec::new())))
            .await;
    }

    info!(days = cli.days, sources = ?requested, realtime = cli.realtime, "starting ingestion run");

    let pipeline = Arc::new(pipeline);
    let shutdown_pipeline = pipeline.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, requesting graceful shutdown");
            shutdown_pipeline.request_shutdown();
        }
    });

    let result = if cli.realtime {
        pipeline.run_realtime(&requested).await
    } else {
        pipeline.run_once(&requested).await
    };

    let accuracy = pipeline.accuracy();
    info!(
        fulfilled = accuracy.fulfilled,
        unfulfilled = accuracy.unfulfilled,
        retro_fulfilled = accuracy.retro_fulfilled,
        hit_rate = accuracy.hit_rate(),
        "prediction accuracy at exit"
    );

    result
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::from(0),
        Err(error) => {
            let code = error.exit_code();
            error!(%error, exit_code = code, "pipeline run failed");
            ExitCode::from(code as u8)
        }
    }
}
