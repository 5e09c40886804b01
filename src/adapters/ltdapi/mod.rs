//! Game statistics API adapter.
//!
//! Supplies recorded games to the ingestion pipeline and unit records to
//! catalog sync.

pub mod client;
pub mod models;

pub use client::{ApiError, LtdApiClient};
pub use models::{leak_value, RawGame, RawPlayer, RawUnit};
