use async_trait::async_trait;
use ceg_core::record::Record;
use ceg_core::source::{Cursor, SourceAdapter, SourceError};
use std::sync::Arc;
use tracing::warn;

/// Per-site fetch logic for a `Web`-kind source: given a date cursor and a
/// limit, return raw records. Individual HTML scrapers are out of scope for
/// this crate (§1 Non-goals) — this trait is the seam implementers fill in.
#[async_trait]
pub trait WebPageFetcher: Send + Sync {
    async fn fetch_page(
        &self,
        since: Option<chrono::DateTime<chrono::Utc>>,
        limit: usize,
    ) -> Result<Vec<Record>, SourceError>;
}

/// A [`SourceAdapter`] over any [`WebPageFetcher`], applying the date-cursor
/// semantics common to every `Web`-kind source (§4.A): `since` is a date
/// cursor, not an external-id high-water-mark.
#[derive(Debug, Clone)]
pub struct WebPollAdapter<F> {
    source_code: String,
    fetcher: Arc<F>,
}

impl<F> WebPollAdapter<F>
where
    F: WebPageFetcher,
{
    pub fn new(source_code: impl Into<String>, fetcher: Arc<F>) -> Self {
        Self {
            source_code: source_code.into(),
            fetcher,
        }
    }
}

#[async_trait]
impl<F> SourceAdapter for WebPollAdapter<F>
where
    F: WebPageFetcher,
{
    async fn open(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    async fn fetch_since(
        &mut self,
        cursor: &Cursor,
        limit: usize,
    ) -> Result<Vec<Record>, SourceError> {
        let records = self.fetcher.fetch_page(cursor.last_timestamp, limit).await?;
        if records.len() > limit {
            warn!(
                source = %self.source_code,
                fetched = records.len(),
                limit,
                "fetcher returned more records than requested, truncating"
            );
            return Ok(records.into_iter().take(limit).collect());
        }
        Ok(records)
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WebPageFetcher for CountingFetcher {
        async fn fetch_page(
            &self,
            _since: Option<chrono::DateTime<chrono::Utc>>,
            limit: usize,
        ) -> Result<Vec<Record>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let records = (0..limit + 2)
                .map(|i| Record {
                    source: "web".into(),
                    external_id: i.to_string().into(),
                    url: None,
                    title: format!("article {i}"),
                    body: String::new(),
                    published_at: Utc::now(),
                    trust_level: 7,
                })
                .collect();
            Ok(records)
        }
    }

    #[tokio::test]
    async fn truncates_to_requested_limit() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let mut adapter = WebPollAdapter::new("example_site", fetcher.clone());
        adapter.open().await.unwrap();

        let fetched = adapter.fetch_since(&Cursor::default(), 3).await.unwrap();
        assert_eq!(fetched.len(), 3);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}
