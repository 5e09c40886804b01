//! Core services: normalization, aggregation, ranking and guide composition,
//! plus the ingestion and catalog workflows built on top of them.

pub mod aggregator;
pub mod board_normalizer;
pub mod catalog_sync;
pub mod compatibility;
pub mod guide_composer;
pub mod ingest_pipeline;
pub mod meta_service;
pub mod scorer;

pub use aggregator::{AbsorbOutcome, AggregateReport, Aggregator, SkipReason};
pub use board_normalizer::{BoardNormalizer, NormalizedBoard};
pub use catalog_sync::{CatalogSync, SyncReport};
pub use compatibility::Compatibility;
pub use guide_composer::{AnchorStats, GuideComposer, WaveStats};
pub use ingest_pipeline::{IngestOptions, IngestPipeline, IngestReport};
pub use meta_service::{compare_versions, provisionable_waves, HoldsRequest, MetaService};
pub use scorer::{bounty, gold_lost, leak_rate, select, RankQuery, Scorer, WAVE_BOUNTIES};
