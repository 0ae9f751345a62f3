use crate::error::CegError;
use ceg_core::event::{default_anchor_types, EventType};
use ceg_core::importance::ImportanceWeights;
use ceg_core::source::Source;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-call network timeouts (§5 "Cancellation & timeouts").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub extraction_secs: u64,
    pub exchange_search_secs: u64,
    pub market_data_secs: u64,
    pub graph_write_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            extraction_secs: 60,
            exchange_search_secs: 30,
            market_data_secs: 30,
            graph_write_secs: 10,
        }
    }
}

impl TimeoutConfig {
    pub fn extraction(&self) -> Duration {
        Duration::from_secs(self.extraction_secs)
    }

    pub fn exchange_search(&self) -> Duration {
        Duration::from_secs(self.exchange_search_secs)
    }

    pub fn market_data(&self) -> Duration {
        Duration::from_secs(self.market_data_secs)
    }

    pub fn graph_write(&self) -> Duration {
        Duration::from_secs(self.graph_write_secs)
    }
}

/// Retry policy shared by every retryable call (§5 "Retries & backpressure"):
/// up to `max_attempts` with exponential backoff starting at `backoff_base`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_base_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_secs: 2,
        }
    }
}

impl RetryConfig {
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.backoff_base_secs) * 2u32.pow(attempt.saturating_sub(1))
    }
}

/// Top-level pipeline configuration (§3, §4.L, §6), loaded from a JSON file
/// the way the teacher's `StrategyConfig::load` reads its own JSON config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub sources: Vec<Source>,

    /// Degree of within-batch concurrency and the unit the batch deadline
    /// scales with (§5: "batch deadline equal to batch_size × 2s").
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Overrides [`ceg_core::event::default_anchor_types`] when non-empty
    /// (REDESIGN FLAG 4: externalised rather than hard-coded).
    #[serde(default)]
    pub anchor_event_types: Vec<EventType>,

    #[serde(default)]
    pub importance_weights: ImportanceWeights,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    /// §4.K: retroactive-reconciler lookback, in days.
    #[serde(default = "default_retro_lookback_days")]
    pub retro_lookback_days: i64,

    #[serde(default = "default_retro_scan_cap")]
    pub retro_scan_cap: usize,

    pub cursor_path: PathBuf,
    pub learned_alias_path: PathBuf,

    /// Exchange code prepended to a resolved ticker to form the
    /// [`ceg_core::instrument::Instrument`] id (§3, `exchange:symbol`) when
    /// the linker itself only returns a bare ticker.
    #[serde(default = "default_exchange")]
    pub default_exchange: String,

    /// Benchmark instrument the market-impact event study measures abnormal
    /// return against (§4.H).
    #[serde(default = "default_benchmark_instrument")]
    pub benchmark_instrument: String,

    /// Base URL for the remote extraction endpoint, used when the CLI is run
    /// with `--extraction=remote`.
    pub remote_extraction_base_url: Option<String>,

    /// Base URL for the exchange's live security-search endpoint (tier 3 of
    /// the Instrument Linker, §4.D). Tier 3 is skipped when absent.
    pub exchange_search_base_url: Option<String>,
}

fn default_exchange() -> String {
    "MOEX".to_string()
}

fn default_benchmark_instrument() -> String {
    "IMOEX".to_string()
}

fn default_batch_size() -> usize {
    20
}

fn default_retro_lookback_days() -> i64 {
    ceg_watch::reconciler::DEFAULT_LOOKBACK_DAYS
}

fn default_retro_scan_cap() -> usize {
    ceg_watch::reconciler::DEFAULT_RETRO_SCAN_CAP
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            batch_size: default_batch_size(),
            anchor_event_types: Vec::new(),
            importance_weights: ImportanceWeights::default(),
            timeouts: TimeoutConfig::default(),
            retry: RetryConfig::default(),
            retro_lookback_days: default_retro_lookback_days(),
            retro_scan_cap: default_retro_scan_cap(),
            cursor_path: PathBuf::from("ceg-cursors.json"),
            learned_alias_path: PathBuf::from("ceg-learned-aliases.json"),
            default_exchange: default_exchange(),
            benchmark_instrument: default_benchmark_instrument(),
            remote_extraction_base_url: None,
            exchange_search_base_url: None,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CegError> {
        let file =
            File::open(path.as_ref()).map_err(|error| CegError::Config(error.to_string()))?;
        serde_json::from_reader(file).map_err(|error| CegError::Config(error.to_string()))
    }

    /// The anchor-event set this config resolves to: the configured override
    /// when non-empty, otherwise the built-in default (§4.E, §9 REDESIGN
    /// FLAG 4).
    pub fn anchor_types(&self) -> Vec<EventType> {
        if self.anchor_event_types.is_empty() {
            default_anchor_types().to_vec()
        } else {
            self.anchor_event_types.clone()
        }
    }

    /// A batch's overall deadline: `batch_size × 2s` (§5).
    pub fn batch_deadline(&self) -> Duration {
        Duration::from_secs(2) * self.batch_size as u32
    }

    pub fn source(&self, code: &str) -> Option<&Source> {
        self.sources.iter().find(|source| source.code == code)
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter().filter(|source| source.enabled)
    }
}
