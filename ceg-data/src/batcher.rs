use ceg_core::record::Record;
use ceg_integration::channel::{UnboundedRx, UnboundedTx, mpsc_unbounded};

/// An ordered, non-overlapping group of [`Record`]s, each no larger than the
/// configured `batch_size` (§4.B). Chunk boundaries never reorder records;
/// within a chunk, source order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub records: Vec<Record>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Splits a lazy sequence of [`Record`]s into bounded, ordered [`Chunk`]s and
/// pushes them onto a channel; backpressure from a full channel propagates
/// back to whatever drives the iterator (§4.B, §5 "Backpressure").
#[derive(Debug)]
pub struct Batcher {
    batch_size: usize,
}

impl Batcher {
    pub fn new(batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch_size must be positive");
        Self { batch_size }
    }

    /// Group `records` into [`Chunk`]s of at most `batch_size`, preserving
    /// input order. A record slice that is already shorter than
    /// `batch_size` yields exactly one chunk; an empty slice yields no
    /// chunks (§8 boundary case: batch of size 0 is a no-op).
    pub fn chunk(&self, records: Vec<Record>) -> Vec<Chunk> {
        records
            .chunks(self.batch_size)
            .map(|slice| Chunk {
                records: slice.to_vec(),
            })
            .collect()
    }
}

/// The channel-sender half of a [`Batcher`] pipeline: chunks are pushed here
/// and consumed by the orchestrator's per-chunk workers. Unbounded at the
/// channel-primitive level (matching [`ceg_integration::channel`]'s
/// primitives); bounding is enforced by the orchestrator capping in-flight
/// chunks, per §5's "chunk channel is bounded" requirement.
pub fn chunk_channel() -> (UnboundedTx<Chunk>, UnboundedRx<Chunk>) {
    mpsc_unbounded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str) -> Record {
        Record {
            source: "test".into(),
            external_id: id.into(),
            url: None,
            title: format!("title {id}"),
            body: String::new(),
            published_at: Utc::now(),
            trust_level: 5,
        }
    }

    #[test]
    fn chunks_preserve_order_and_respect_batch_size() {
        let batcher = Batcher::new(2);
        let records = vec![record("1"), record("2"), record("3"), record("4"), record("5")];
        let chunks = batcher.chunk(records);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 2);
        assert_eq!(chunks[1].len(), 2);
        assert_eq!(chunks[2].len(), 1);
        assert_eq!(chunks[0].records[0].external_id, "1");
        assert_eq!(chunks[2].records[0].external_id, "5");
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let batcher = Batcher::new(10);
        assert!(batcher.chunk(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn chunk_channel_forwards_in_order() {
        let (tx, rx) = chunk_channel();
        let batcher = Batcher::new(2);
        for chunk in batcher.chunk(vec![record("a"), record("b"), record("c")]) {
            tx.tx.send(chunk).unwrap();
        }
        drop(tx);

        let collected: Vec<Chunk> = rx.collect();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].records[0].external_id, "a");
        assert_eq!(collected[1].records[0].external_id, "c");
    }
}
