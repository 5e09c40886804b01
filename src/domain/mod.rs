//! Domain layer for the meta-analysis engine
//!
//! This module contains the data model, the error taxonomy and the port
//! traits that storage and transport adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
