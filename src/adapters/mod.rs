//! Adapters for storage, caching and the game statistics API.

pub mod cache;
pub mod ltdapi;
pub mod memory;
pub mod sqlite;
