//! Port traits implemented by storage and transport adapters.

pub mod catalog_repository;
pub mod game_source;
pub mod hold_repository;

pub use catalog_repository::CatalogRepository;
pub use game_source::{CatalogRecord, ObservationPage, ObservationSource, PageRequest, UnitSource};
pub use hold_repository::HoldRepository;
