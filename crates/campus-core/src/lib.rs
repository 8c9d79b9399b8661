//! Core types and trait definitions for the campus resource engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! holds the domain records, the pure rules (fines, overdue derivation, room
//! numbering, triage views, dashboards, capabilities), and the traits that
//! storage backends and notification gateways implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod book;
pub mod dashboard;
pub mod error;
pub mod feedback;
pub mod loan;
pub mod notify;
pub mod room;
pub mod store;
pub mod triage;

pub use error::{Classify, Error, ErrorKind, Result};
