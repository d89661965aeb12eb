//! Local-cache-first data access.
//!
//! This module provides:
//! - A `CatalogStore` trait with a SQLite implementation keyed by record id
//! - A `CacheFirstRepository` that serves from the store and falls back to
//!   the catalog API on a miss, writing results back
//! - Fetch-once, cache-forever semantics: only an explicit wipe removes rows

mod layer;
mod storage;
mod traits;

pub use layer::CacheFirstRepository;
pub use storage::{CatalogStore, SqliteStore};
