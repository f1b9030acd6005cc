//! HTTP client for the central mprdb directory.
//!
//! The directory stores the signed submissions every node publishes. This
//! crate reads a source's submissions for the aggregation engine and
//! performs the one-shot submit and retract calls for the CLI. It never
//! verifies signatures; that is the caller's job.

mod client;
mod wire;

pub mod error;

pub use client::{DirectoryClient, DirectoryConfig};
pub use error::{Error, Result};
