use crate::error::LinkError;
use crate::normalize::normalize;
use parking_lot::RwLock;
use smol_str::SmolStr;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Known-or-learned alias table used by tier 2 of the Instrument Linker
/// (§4.D). The known set is compile-time/config-loaded and read-only; the
/// learned set sits behind a single-writer lock with periodic, non-blocking
/// atomic flush to disk (§5 "Shared resources").
#[derive(Debug)]
pub struct AliasTable {
    known: HashMap<String, SmolStr>,
    learned: RwLock<HashMap<String, SmolStr>>,
    persist_path: Option<PathBuf>,
}

impl AliasTable {
    pub fn new(known: HashMap<String, SmolStr>) -> Self {
        Self {
            known,
            learned: RwLock::new(HashMap::new()),
            persist_path: None,
        }
    }

    pub fn with_persistence(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_path = Some(path.into());
        self
    }

    /// Load a previously persisted learned-alias file, if present.
    pub fn load_learned(&self, path: &Path) -> Result<(), LinkError> {
        if !path.exists() {
            return Ok(());
        }
        let data =
            std::fs::read_to_string(path).map_err(|error| LinkError::AliasPersist(error.to_string()))?;
        if data.trim().is_empty() {
            return Ok(());
        }
        let map: HashMap<String, SmolStr> =
            serde_json::from_str(&data).map_err(|error| LinkError::AliasPersist(error.to_string()))?;
        *self.learned.write() = map;
        Ok(())
    }

    /// Resolve a raw mention via normalisation, checking known aliases
    /// before learned ones — invariant 7 (§8): learned aliases never shadow
    /// `KNOWN_ALIASES`.
    pub fn resolve(&self, mention: &str) -> Option<SmolStr> {
        let key = normalize(mention);
        if let Some(ticker) = self.known.get(&key) {
            return Some(ticker.clone());
        }
        self.learned.read().get(&key).cloned()
    }

    /// Learn a new alias. A no-op when the alias is already known (either
    /// set) — round-trip law (§8): `learn(alias, ticker)` is a no-op when
    /// alias is known.
    pub fn learn(&self, mention: &str, ticker: SmolStr) {
        let key = normalize(mention);
        if self.known.contains_key(&key) {
            return;
        }
        let mut learned = self.learned.write();
        learned.entry(key).or_insert(ticker);
    }

    /// Atomically flush the learned set to the configured persistence path
    /// (write-to-temp + rename, §6). Non-blocking for readers: the write
    /// lock is held only long enough to clone the snapshot.
    pub fn flush(&self) -> Result<(), LinkError> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let snapshot = self.learned.read().clone();
        let serialized = serde_json::to_string_pretty(&snapshot)
            .map_err(|error| LinkError::AliasPersist(error.to_string()))?;
        let tmp_path = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|error| LinkError::AliasPersist(error.to_string()))?;
        }
        std::fs::write(&tmp_path, serialized)
            .map_err(|error| LinkError::AliasPersist(error.to_string()))?;
        std::fs::rename(&tmp_path, path)
            .map_err(|error| LinkError::AliasPersist(error.to_string()))?;
        Ok(())
    }
}
