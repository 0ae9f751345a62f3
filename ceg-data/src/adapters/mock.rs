use async_trait::async_trait;
use ceg_core::record::Record;
use ceg_core::source::{Cursor, SourceAdapter, SourceError};

/// A fixed, oldest-first set of [`Record`]s replayed deterministically;
/// used in orchestrator and reconciler tests where a real transport would
/// add flakiness without adding coverage.
#[derive(Debug, Clone)]
pub struct MockSourceAdapter {
    source_code: String,
    records: Vec<Record>,
    opened: bool,
}

impl MockSourceAdapter {
    pub fn new(source_code: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            source_code: source_code.into(),
            records,
            opened: false,
        }
    }
}

#[async_trait]
impl SourceAdapter for MockSourceAdapter {
    async fn open(&mut self) -> Result<(), SourceError> {
        self.opened = true;
        Ok(())
    }

    async fn fetch_since(
        &mut self,
        cursor: &Cursor,
        limit: usize,
    ) -> Result<Vec<Record>, SourceError> {
        if !self.opened {
            return Err(SourceError::Transient {
                source: self.source_code.as_str().into(),
                message: "adapter not opened".into(),
            });
        }

        let since = cursor.last_timestamp;
        let filtered: Vec<Record> = self
            .records
            .iter()
            .filter(|record| since.is_none_or(|since| record.published_at > since))
            .take(limit)
            .cloned()
            .collect();

        Ok(filtered)
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        self.opened = false;
        Ok(())
    }
}
