//! ltd-meta - Legion TD 2 meta analysis
//!
//! Aggregates finished games into per-wave "holds" (a normalized board
//! layout plus the mercenary sends it faced), ranks them by value efficiency
//! and composes seven-wave build guides from the rankings.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Service Layer** (`services`): normalization, aggregation, scoring and
//!   guide composition
//! - **Adapters** (`adapters`): SQLite and in-memory storage, the ranking
//!   cache and the game API client
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ltd_meta::adapters::sqlite::{initialize_database, SqliteHoldRepository};
//! use ltd_meta::services::{HoldsRequest, MetaService};
//!
//! let pool = initialize_database(&config.database).await?;
//! let service = MetaService::new(Arc::new(SqliteHoldRepository::new(pool)), catalog, &config);
//! let ranked = service
//!     .top_holds(&HoldsRequest {
//!         anchor_unit: "Peewee".into(),
//!         wave: 1,
//!         version: None,
//!         secondary: None,
//!     })
//!     .await?;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    BoardSnapshot, Config, Guide, Hold, Observation, SendRecord, Stats, TableKey, UnitCatalog,
};
pub use domain::ports::{CatalogRepository, HoldRepository, ObservationSource, UnitSource};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Aggregator, GuideComposer, IngestPipeline, MetaService, Scorer};
