use crate::causal::Sign;
use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

/// Event-study window over which abnormal return and volume spike are
/// measured (§6, §7.Impact), in calendar minutes relative to event time.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display)]
pub enum ImpactWindow {
    #[display("m15")]
    FifteenMinutes,
    #[display("h1")]
    OneHour,
    #[display("h6")]
    SixHours,
    #[display("d1")]
    OneDay,
}

impl ImpactWindow {
    pub fn minutes(&self) -> i64 {
        match self {
            ImpactWindow::FifteenMinutes => 15,
            ImpactWindow::OneHour => 60,
            ImpactWindow::SixHours => 360,
            ImpactWindow::OneDay => 1440,
        }
    }
}

/// Z-score threshold above which an abnormal return is considered
/// statistically significant (SPEC_FULL.md §4).
pub const SIGNIFICANCE_Z_THRESHOLD: f64 = 1.96;

/// Market-impact measurement attached to an [`crate::event::Event`] (§3, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEdge {
    pub event: SmolStr,
    pub instrument: SmolStr,
    pub window: ImpactWindow,
    pub abnormal_return: f64,
    pub volume_spike_ratio: f64,
    pub z_score: f64,
    /// Direction of the abnormal return (§3, §4.H return shape
    /// `{ar, volume_spike, is_significant, sentiment_sign}`).
    pub sentiment: Sign,
}

impl ImpactEdge {
    pub fn is_significant(&self) -> bool {
        self.z_score.abs() >= SIGNIFICANCE_Z_THRESHOLD
    }

    /// Derive the sentiment sign from an abnormal return (§4.H).
    pub fn sentiment_from_abnormal_return(abnormal_return: f64) -> Sign {
        if abnormal_return > 0.0 {
            Sign::Positive
        } else if abnormal_return < 0.0 {
            Sign::Negative
        } else {
            Sign::Mixed
        }
    }
}

/// A single bar of market data used as input to the event study (§7.Impact).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: chrono::DateTime<chrono::Utc>,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("no market data for instrument {instrument}")]
    NoData { instrument: String },
    #[error("market data provider error for {instrument}: {message}")]
    Provider { instrument: String, message: String },
}

/// External-interface trait (§6) implemented by whatever feeds historical
/// bars into the market-impact event study. Kept separate from
/// [`crate::source::SourceAdapter`] because market data is pulled on demand
/// around a specific event timestamp rather than streamed continuously.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn bars(
        &self,
        instrument: &str,
        from: chrono::DateTime<chrono::Utc>,
        to: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Bar>, MarketDataError>;
}

/// A [`MarketDataProvider`] that always reports no data. Lets the event
/// study degrade gracefully (§4.H: "Missing data → return null") when no
/// real market-data feed is wired up, eg/ a proof-of-concept run.
/// **Do not use in production - every event study call returns `None`.**
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMarketDataProvider;

#[async_trait]
impl MarketDataProvider for NullMarketDataProvider {
    async fn bars(
        &self,
        _instrument: &str,
        _from: chrono::DateTime<chrono::Utc>,
        _to: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Bar>, MarketDataError> {
        Ok(Vec::new())
    }
}
