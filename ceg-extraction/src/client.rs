use async_trait::async_trait;
use ceg_core::extraction::Extraction;
use smol_str::SmolStr;

use crate::error::ExtractionError;

/// One record's text plus the metadata the extraction model needs to
/// contextualise it (§4.C, §6).
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub id: SmolStr,
    pub text: String,
    pub source: SmolStr,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Polymorphic over the capability set `{extract_single, extract_batch}`
/// (§4.C). Implementations must be idempotent w.r.t. identical inputs and
/// must return exactly one [`Extraction`] per input, in input order, never
/// omitting an element even when confidence is zero (§8 boundary case).
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// `true` when this implementation can process a batch in one round
    /// trip; `false` when callers should issue `requests.len()` parallel
    /// single calls instead.
    fn supports_batch(&self) -> bool {
        true
    }

    async fn extract_batch(
        &self,
        requests: &[ExtractionRequest],
    ) -> Result<Vec<Extraction>, ExtractionError>;

    async fn extract_single(
        &self,
        request: &ExtractionRequest,
    ) -> Result<Extraction, ExtractionError> {
        let mut results = self.extract_batch(std::slice::from_ref(request)).await?;
        Ok(results.pop().unwrap_or_else(Extraction::empty))
    }
}

#[cfg(test)]
pub(crate) fn assert_length_and_order_preserved(
    requests: &[ExtractionRequest],
    results: &[Extraction],
) {
    assert_eq!(requests.len(), results.len());
}
