#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! Source adapters, ingestion batching and cursor persistence (§4.A, §4.B).
//!
//! The concrete chat-channel client and individual HTML scrapers are out of
//! scope here; this crate provides the [`ceg_core::source::SourceAdapter`]
//! plumbing (mock and generic web-polling implementations), the [`Batcher`]
//! that turns a fetched page into ordered chunks, a [`dedup::DedupFilter`]
//! enforcing invariant 4, and [`cursor::CursorStore`] persistence.

pub mod adapters;
pub mod batcher;
pub mod cursor;
pub mod dedup;
pub mod error;

pub use batcher::{Batcher, Chunk};
pub use error::IngestError;
