use ceg_core::record::Record;
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::collections::HashSet;

/// Guards invariant 4 (§8): `(source, external_id)` stays unique across any
/// number of reruns. Secondary guard on content hash catches the same story
/// republished under a different external id.
#[derive(Debug, Default)]
pub struct DedupFilter {
    seen_keys: Mutex<HashSet<(SmolStr, SmolStr)>>,
    seen_hashes: Mutex<HashSet<u64>>,
}

impl DedupFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time this record's dedup key and content
    /// hash are seen; `false` on every subsequent occurrence, including
    /// reruns over the same batch.
    pub fn admit(&self, record: &Record) -> bool {
        let key = record.dedup_key();
        let hash = record.content_hash();

        let mut keys = self.seen_keys.lock();
        let mut hashes = self.seen_hashes.lock();

        if keys.contains(&key) || hashes.contains(&hash) {
            return false;
        }

        keys.insert(key);
        hashes.insert(hash);
        true
    }

    pub fn retain_new<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|record| self.admit(record)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(source: &str, id: &str, title: &str) -> Record {
        Record {
            source: source.into(),
            external_id: id.into(),
            url: None,
            title: title.into(),
            body: "body".into(),
            published_at: Utc::now(),
            trust_level: 5,
        }
    }

    #[test]
    fn rejects_repeated_dedup_key() {
        let filter = DedupFilter::new();
        let r1 = record("reuters", "1", "headline");
        assert!(filter.admit(&r1));
        assert!(!filter.admit(&r1));
    }

    #[test]
    fn rejects_same_content_under_different_external_id() {
        let filter = DedupFilter::new();
        let r1 = record("reuters", "1", "same headline");
        let r2 = record("reuters", "2", "same headline");
        assert!(filter.admit(&r1));
        assert!(!filter.admit(&r2));
    }

    #[test]
    fn admits_distinct_records() {
        let filter = DedupFilter::new();
        let r1 = record("reuters", "1", "headline a");
        let r2 = record("reuters", "2", "headline b");
        assert!(filter.admit(&r1));
        assert!(filter.admit(&r2));
    }
}
