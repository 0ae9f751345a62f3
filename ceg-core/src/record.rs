use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A raw ingested item, owned by its producing [`crate::source::Source`] (§3).
///
/// Deduplicated by `(source, external_id)` and, as a secondary guard against
/// the same story republished with a different id, by a content hash of
/// `title + body`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub source: SmolStr,
    pub external_id: SmolStr,
    pub url: Option<String>,
    pub title: String,
    pub body: String,
    pub published_at: chrono::DateTime<chrono::Utc>,
    /// Trust level of the producing source, snapshotted at ingestion time so
    /// that later source-config edits do not retroactively change scoring.
    pub trust_level: u8,
}

impl Record {
    /// Stable dedup key across reruns (invariant 4, §8).
    pub fn dedup_key(&self) -> (SmolStr, SmolStr) {
        (self.source.clone(), self.external_id.clone())
    }

    /// Content hash used as a secondary dedup guard when the same story is
    /// republished under a different external id.
    pub fn content_hash(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = fnv_hasher();
        self.title.hash(&mut hasher);
        self.body.hash(&mut hasher);
        hasher.finish()
    }
}

fn fnv_hasher() -> impl std::hash::Hasher {
    fnv::FnvHasher::default()
}
