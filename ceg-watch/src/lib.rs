#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! L0/L1/L2 watcher rule engine, event predictions, notification fan-out,
//! and the retroactive reconciler (§4.J, §4.K).
//!
//! This crate sits downstream of `ceg-graph`: it consumes [`ceg_core::event::Event`]s
//! and the CMNLN domain-prior table to decide when to open a
//! [`ceg_core::watch::TriggeredWatch`], when to generate an
//! [`ceg_core::watch::EventPrediction`], and how to re-scan historical
//! events against newly ingested ones.

/// [`error::WatchError`]: the failure surface for this crate.
pub mod error;

/// Notification fan-out to registered handlers (§4.J "Notification").
pub mod notify;

/// [`ceg_core::watch::EventPrediction`] generation and fulfilment
/// reconciliation (§4.J L2).
pub mod predictions;

/// The retroactive reconciler (§4.K).
pub mod reconciler;

/// L0/L1 rule definitions and evaluation (§4.J).
pub mod rules;

pub use error::WatchError;
pub use notify::{LogNotificationHandler, NotificationDispatcher, NotificationHandler};
pub use predictions::PredictionAccuracy;
pub use reconciler::{ReconcileCandidate, RetroactiveReconciler};
pub use rules::{default_l0_rules, default_l1_rules, L2_TRIGGER_IMPORTANCE};

pub use ceg_core::watch::{EventPrediction, EventPredictionOutcome, TriggeredWatch, WatchLevel, WatchRule};
