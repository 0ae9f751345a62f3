/// A deterministic in-memory [`ceg_core::source::SourceAdapter`] used for
/// orchestrator tests and dry-runs; yields a fixed record set oldest-first.
pub mod mock;

/// Generic HTTP-polling [`ceg_core::source::SourceAdapter`] for `Web`-kind
/// sources, parameterised over a per-site page-fetch closure. The concrete
/// HTML scraping logic for any one site is out of scope (§1 Non-goals) —
/// callers supply it as a [`WebPageFetcher`](web::WebPageFetcher).
pub mod web;
