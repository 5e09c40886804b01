//! In-memory adapters, used by tests and dry runs.

pub mod hold_repository;

pub use hold_repository::InMemoryHoldRepository;
