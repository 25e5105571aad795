//! Core types and trait definitions for the Serotrack case register.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.
//!
//! The two pieces with actual behaviour are the titer status engine
//! ([`status`]) and the case history aggregator ([`summary`]); both are pure
//! functions over values, with no I/O.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod case;
pub mod error;
pub mod patient;
pub mod status;
pub mod store;
pub mod summary;
pub mod titer;

pub use error::{Error, Result};
