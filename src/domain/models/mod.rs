//! Domain models for boards, holds, rankings and guides.

pub mod board;
pub mod catalog;
pub mod config;
pub mod fingerprint;
pub mod guide;
pub mod hold;
pub mod observation;
pub mod stats;

pub use board::{BoardSnapshot, BuildEntry, Coord};
pub use catalog::{Mercenary, Unit, UnitCatalog, UpgradeGraph};
pub use config::{
    ApiConfig, CatalogConfig, Config, DatabaseConfig, GuideConfig, IncubatorRule, IngestConfig,
    LoggingConfig, RetryConfig, ScoringConfig,
};
pub use guide::{Archetype, Guide, WaveGuide, GUIDE_WAVES, WAVE_WEIGHTS};
pub use hold::{Hold, HoldTally, SendRecord, SendTally, TableKey};
pub use observation::Observation;
pub use stats::{SendStats, Stats};
