//! Herald delivery reliability engine.
//!
//! Push delivery is unreliable: tokens expire, gateways rate limit, networks
//! drop. This crate owns the machinery that copes with that:
//!
//! - a persistent retry queue with exponential backoff ([`queue`], [`backoff`]),
//! - the per-record retry state machine ([`processor`]) and the batch sweep
//!   over all due records ([`sweeper`]),
//! - append-only delivery metrics ([`metrics`]),
//! - metric aggregation into health snapshots ([`analytics`]) and their
//!   classification into warning/critical signals ([`thresholds`]).
//!
//! The engine has no timers of its own; a sweep is one bounded pass, and
//! periodicity belongs to the worker binary.

pub mod analytics;
pub mod backoff;
pub mod metrics;
pub mod processor;
pub mod queue;
pub mod sweeper;
pub mod thresholds;
