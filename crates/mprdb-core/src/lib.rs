//! Core types and trait definitions for the mprdb reputation node.
//!
//! This crate is deliberately free of HTTP, database and crypto dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod assertion;
pub mod directory;
pub mod error;
pub mod source;
pub mod store;

pub use error::{Error, Result};
