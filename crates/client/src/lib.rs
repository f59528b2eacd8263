//! Network side of swproxy.
//!
//! This crate provides the reqwest-backed fetcher the proxy issues live
//! requests through.

pub mod fetch;

pub use fetch::{FetchConfig, HttpFetcher};
