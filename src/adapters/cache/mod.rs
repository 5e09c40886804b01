//! In-memory caching layer for ranking results.
//!
//! Uses `moka` for TTL-based concurrent caching. Entries are value
//! snapshots replaced wholesale on expiry.

pub mod ranking_cache;

pub use ranking_cache::{RankingCache, RankingKey};
