use crate::record::Record;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::time::Duration;

/// Kind of ingestion endpoint a [`Source`] represents (§3).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display)]
pub enum SourceKind {
    /// A chat-channel stream (eg/ Telegram-style broadcast channel).
    Stream,
    /// An HTML site, scraped/polled on a date cursor.
    Web,
}

/// Per-source options governing fetch behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceOptions {
    /// Maximum records returned by a single `fetch_since` call.
    pub fetch_limit: usize,
    /// Poll interval used by the orchestrator in `--realtime` mode.
    pub poll_interval: Duration,
    /// Historical lookback (in days) used for an initial backfill.
    pub lookback_days: u32,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            fetch_limit: 200,
            poll_interval: Duration::from_secs(30),
            lookback_days: 7,
        }
    }
}

/// Configuration for one ingestion endpoint (§3). Created by config load;
/// never mutated by the core pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub code: SmolStr,
    pub kind: SourceKind,
    /// Trust level in `[0, 10]`, used by the Importance Scorer's credibility
    /// component (§4.F).
    pub trust_level: u8,
    pub enabled: bool,
    pub options: SourceOptions,
}

impl Source {
    pub fn new(code: impl Into<SmolStr>, kind: SourceKind, trust_level: u8) -> Self {
        Self {
            code: code.into(),
            kind,
            trust_level: trust_level.min(10),
            enabled: true,
            options: SourceOptions::default(),
        }
    }
}

/// Opaque resumption point for a [`Source`]. For `Stream` sources this is an
/// external-id high-water-mark; for `Web` sources a date cursor (§4.A).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Cursor {
    pub last_external_id: Option<SmolStr>,
    pub last_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub backfill_completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Failure modes for a [`SourceAdapter::fetch_since`] call (§4.A, §7).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network/transport failure. The caller retries with backoff.
    #[error("transient transport error fetching from {source}: {message}")]
    Transient { source: SmolStr, message: String },
    /// Authentication failure. Fatal: disables the source for the run.
    #[error("authentication failed for source {source}: {message}")]
    Authentication { source: SmolStr, message: String },
    /// A single record failed to parse; the caller skips it and continues.
    #[error("malformed record from {source}: {message}")]
    MalformedRecord { source: SmolStr, message: String },
}

impl SourceError {
    /// Authentication failures are fatal for the remainder of the run (§7);
    /// everything else is recoverable at the record or batch level.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Authentication { .. })
    }
}

/// Contract for implementers of one ingestion endpoint (§6). The chat-channel
/// client and individual HTML scrapers are out of scope for this crate;
/// implementations live downstream and are composed by the orchestrator
/// behind this trait.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Open a session against the underlying transport for this source.
    async fn open(&mut self) -> Result<(), SourceError>;

    /// Yield up to `limit` [`Record`]s since `cursor`, honouring the
    /// source's configured `fetch_limit`. Ordering (most-recent-first vs
    /// oldest-first) is documented per adapter but must be consistent within
    /// one implementation.
    async fn fetch_since(&mut self, cursor: &Cursor, limit: usize) -> Result<Vec<Record>, SourceError>;

    /// Release any held transport resources.
    async fn close(&mut self) -> Result<(), SourceError>;
}
