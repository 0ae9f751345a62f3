use ceg_core::impact::{Bar, ImpactEdge, ImpactWindow, MarketDataError, MarketDataProvider};
use smol_str::SmolStr;
use std::sync::Arc;

/// Lookback used to estimate the pre-event return volatility (§4.H: "5
/// trading days pre"). Treated as calendar days for simplicity; the bars
/// returned by a [`MarketDataProvider`] are expected to already be
/// trading-session-aligned.
const PRE_EVENT_LOOKBACK_DAYS: i64 = 5;

/// Event-study engine (§4.H): abnormal return, volume spike, and
/// significance relative to a benchmark index, over one or more
/// [`ImpactWindow`]s.
pub struct MarketImpactEngine<P> {
    provider: Arc<P>,
    benchmark_instrument: SmolStr,
}

impl<P> MarketImpactEngine<P>
where
    P: MarketDataProvider,
{
    pub fn new(provider: Arc<P>, benchmark_instrument: impl Into<SmolStr>) -> Self {
        Self {
            provider,
            benchmark_instrument: benchmark_instrument.into(),
        }
    }

    /// Measure impact of an event at `event_ts` on `instrument` over
    /// `window`. Returns `None` (never an error) when bars are missing for
    /// either the instrument or the benchmark (§4.H: "Missing data → return
    /// null; caller treats as non-significant, does not create an Impact
    /// edge").
    pub async fn measure(
        &self,
        event_id: &str,
        instrument: &str,
        event_ts: chrono::DateTime<chrono::Utc>,
        window: ImpactWindow,
    ) -> Result<Option<ImpactEdge>, MarketDataError> {
        let pre = chrono::Duration::days(PRE_EVENT_LOOKBACK_DAYS);
        let post = chrono::Duration::minutes(window.minutes());
        let from = event_ts - pre;
        let to = event_ts + post;

        let (instrument_bars, benchmark_bars) = (
            self.provider.bars(instrument, from, to).await?,
            self.provider.bars(&self.benchmark_instrument, from, to).await?,
        );

        let Some(edge) = compute_impact_edge(
            event_id,
            instrument,
            window,
            event_ts,
            &instrument_bars,
            &benchmark_bars,
        ) else {
            return Ok(None);
        };

        Ok(Some(edge))
    }
}

fn compute_impact_edge(
    event_id: &str,
    instrument: &str,
    window: ImpactWindow,
    event_ts: chrono::DateTime<chrono::Utc>,
    instrument_bars: &[Bar],
    benchmark_bars: &[Bar],
) -> Option<ImpactEdge> {
    let baseline = last_bar_at_or_before(instrument_bars, event_ts)?;
    let horizon = event_ts + chrono::Duration::minutes(window.minutes());
    let target = first_bar_at_or_after(instrument_bars, horizon)?;
    let r_instrument = pct_return(baseline.close, target.close)?;

    let bench_baseline = last_bar_at_or_before(benchmark_bars, event_ts)?;
    let bench_target = first_bar_at_or_after(benchmark_bars, horizon)?;
    let r_benchmark = pct_return(bench_baseline.close, bench_target.close)?;

    let abnormal_return = r_instrument - r_benchmark;

    let pre_window_start = event_ts - chrono::Duration::days(PRE_EVENT_LOOKBACK_DAYS);
    let pre_bars: Vec<&Bar> = instrument_bars
        .iter()
        .filter(|bar| bar.ts >= pre_window_start && bar.ts < event_ts)
        .collect();

    let sigma = stddev(&daily_returns(&pre_bars))?;
    if sigma <= 0.0 {
        return None;
    }
    let z_score = abnormal_return / sigma;

    let baseline_volume = mean(&pre_bars.iter().map(|bar| bar.volume).collect::<Vec<_>>())?;
    let volume_spike_ratio = if baseline_volume > 0.0 {
        target.volume / baseline_volume
    } else {
        0.0
    };

    Some(ImpactEdge {
        event: SmolStr::new(event_id),
        instrument: SmolStr::new(instrument),
        window,
        abnormal_return,
        volume_spike_ratio,
        z_score,
        sentiment: ImpactEdge::sentiment_from_abnormal_return(abnormal_return),
    })
}

fn last_bar_at_or_before(bars: &[Bar], ts: chrono::DateTime<chrono::Utc>) -> Option<&Bar> {
    bars.iter().filter(|bar| bar.ts <= ts).max_by_key(|bar| bar.ts)
}

fn first_bar_at_or_after(bars: &[Bar], ts: chrono::DateTime<chrono::Utc>) -> Option<&Bar> {
    bars.iter().filter(|bar| bar.ts >= ts).min_by_key(|bar| bar.ts)
}

fn pct_return(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        None
    } else {
        Some((to - from) / from)
    }
}

fn daily_returns(bars: &[&Bar]) -> Vec<f64> {
    let mut sorted = bars.to_vec();
    sorted.sort_by_key(|bar| bar.ts);
    sorted
        .windows(2)
        .filter_map(|pair| pct_return(pair[0].close, pair[1].close))
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct FixedProvider {
        instrument_bars: Vec<Bar>,
        benchmark_bars: Vec<Bar>,
    }

    #[async_trait]
    impl MarketDataProvider for FixedProvider {
        async fn bars(
            &self,
            instrument: &str,
            _from: chrono::DateTime<Utc>,
            _to: chrono::DateTime<Utc>,
        ) -> Result<Vec<Bar>, MarketDataError> {
            if instrument == "GMKN" {
                Ok(self.instrument_bars.clone())
            } else {
                Ok(self.benchmark_bars.clone())
            }
        }
    }

    fn bar(day: u32, close: f64, volume: f64) -> Bar {
        Bar {
            ts: Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap(),
            close,
            volume,
        }
    }

    #[tokio::test]
    async fn significant_drop_produces_impact_edge() {
        let provider = Arc::new(FixedProvider {
            instrument_bars: vec![
                bar(1, 100.0, 1_000.0),
                bar(2, 100.0, 1_000.0),
                bar(3, 100.0, 1_000.0),
                bar(4, 100.0, 1_000.0),
                bar(5, 100.0, 1_000.0),
                bar(6, 80.0, 5_000.0),
            ],
            benchmark_bars: vec![
                bar(1, 1000.0, 1.0),
                bar(2, 1000.0, 1.0),
                bar(3, 1000.0, 1.0),
                bar(4, 1000.0, 1.0),
                bar(5, 1000.0, 1.0),
                bar(6, 1000.0, 1.0),
            ],
        });
        let engine = MarketImpactEngine::new(provider, "IMOEX");
        let event_ts = Utc.with_ymd_and_hms(2026, 1, 5, 18, 0, 0).unwrap();

        let edge = engine
            .measure("ev1", "GMKN", event_ts, ImpactWindow::OneDay)
            .await
            .unwrap()
            .expect("pre-period is flat, so any move is significant");

        assert!(edge.abnormal_return < 0.0);
        assert!(edge.is_significant());
        assert!(edge.volume_spike_ratio > 1.0);
        assert_eq!(edge.sentiment, ceg_core::causal::Sign::Negative);
    }

    #[tokio::test]
    async fn missing_bars_yields_none_not_error() {
        let provider = Arc::new(FixedProvider {
            instrument_bars: vec![],
            benchmark_bars: vec![bar(1, 1000.0, 1.0)],
        });
        let engine = MarketImpactEngine::new(provider, "IMOEX");
        let event_ts = Utc.with_ymd_and_hms(2026, 1, 5, 18, 0, 0).unwrap();

        let edge = engine
            .measure("ev1", "GMKN", event_ts, ImpactWindow::OneDay)
            .await
            .unwrap();
        assert!(edge.is_none());
    }
}
