//! The mprdb aggregation engine.
//!
//! Rebuilds the aggregate reputation table from scratch: the local ledger
//! and one fetcher per trusted source feed a single bounded channel, a
//! single consumer folds every verified assertion into trust-weighted
//! per-subject totals, and the finished totals replace the stored table in
//! one write.
//!
//! Every collaborator is injected as a generic parameter, so the engine runs
//! the same against SQLite and the HTTP directory as against test doubles.

mod engine;
mod fetch;
mod report;

pub mod error;

pub use engine::{AggregationEngine, EngineConfig, RebuildState};
pub use error::{Error, FetchError, Result};
pub use fetch::fetch_verified;
pub use report::{RebuildReport, SourceOutcome, SourceReport};
