//! Versioned response cache.
//!
//! A cache is split into named namespaces (`app-cache-v3`), each mapping a
//! request identity to a stored response. The SQLite backend uses
//! tokio-rusqlite and supports:
//!
//! - Request identity hashing (SHA-256 of method + canonical URL)
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Cascading namespace deletion

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use store::{CacheStore, Namespace, StoredResponse};
