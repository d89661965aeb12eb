//! Remote catalog access: domain records, API payloads, signing and the HTTP client.

pub mod api_types;
pub mod client;
pub mod signing;
pub mod types;

pub use client::{CatalogApi, CatalogClient};
pub use types::{Character, Series};
