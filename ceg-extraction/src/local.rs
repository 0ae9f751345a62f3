use async_trait::async_trait;
use ceg_core::extraction::Extraction;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::client::{ExtractionClient, ExtractionRequest};
use crate::error::ExtractionError;

/// Local-LLM backed [`ExtractionClient`]. The model itself is out of scope
/// (§1 Non-goals: training/hosting NER/LLM models) — this wraps whatever
/// in-process inference function the deployment provides, serialising calls
/// since the model is a single instance (§5 "LLM local model").
pub struct LocalExtractionClient<Infer> {
    infer: Infer,
    cache: Mutex<HashMap<String, Extraction>>,
}

impl<Infer> LocalExtractionClient<Infer>
where
    Infer: Fn(&str) -> Extraction + Send + Sync,
{
    pub fn new(infer: Infer) -> Self {
        Self {
            infer,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn infer_cached(&self, request: &ExtractionRequest) -> Extraction {
        if let Some(cached) = self.cache.lock().get(request.text.as_str()) {
            return cached.clone();
        }
        let extraction = (self.infer)(&request.text);
        self.cache
            .lock()
            .insert(request.text.clone(), extraction.clone());
        extraction
    }
}

impl<Infer> std::fmt::Debug for LocalExtractionClient<Infer> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalExtractionClient").finish_non_exhaustive()
    }
}

#[async_trait]
impl<Infer> ExtractionClient for LocalExtractionClient<Infer>
where
    Infer: Fn(&str) -> Extraction + Send + Sync,
{
    fn supports_batch(&self) -> bool {
        // The local model serialises internally; callers issue one call per
        // record rather than batching in a single RPC (§4.C capability set).
        false
    }

    async fn extract_batch(
        &self,
        requests: &[ExtractionRequest],
    ) -> Result<Vec<Extraction>, ExtractionError> {
        Ok(requests.iter().map(|request| self.infer_cached(request)).collect())
    }
}
