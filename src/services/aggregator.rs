//! Observation aggregation.
//!
//! Folds per-player-per-wave observations into persisted Hold and send
//! records. Every upsert is a read-modify-write, so an `Aggregator` must be
//! the only writer for a given table while it runs; the ingest pipeline
//! guarantees this by draining its queue from a single worker.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    BoardSnapshot, BuildEntry, Hold, HoldTally, IncubatorRule, IngestConfig, Observation, SendRecord,
    SendTally, TableKey, UnitCatalog,
};
use crate::domain::ports::HoldRepository;
use crate::services::board_normalizer::{BoardNormalizer, NormalizedBoard};

/// Why an observation was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyBoard,
    QueueType,
    UnprovisionedTable,
    /// Below the rating floor and no hold exists yet to count it against.
    BelowRatingFloor,
}

/// Result of absorbing one observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum AbsorbOutcome {
    Recorded {
        table: TableKey,
        hold_id: i64,
        new_hold: bool,
        new_send: bool,
        leaked: bool,
    },
    Skipped {
        reason: SkipReason,
    },
}

/// Counters for a batch of observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    pub recorded: usize,
    pub new_holds: usize,
    pub skipped: usize,
    /// Observations dropped on storage or catalog errors.
    pub failed: usize,
}

impl AggregateReport {
    pub fn record(&mut self, outcome: &AbsorbOutcome) {
        match outcome {
            AbsorbOutcome::Recorded { new_hold, .. } => {
                self.recorded += 1;
                if *new_hold {
                    self.new_holds += 1;
                }
            }
            AbsorbOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.recorded += other.recorded;
        self.new_holds += other.new_holds;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

pub struct Aggregator<R: HoldRepository> {
    repository: Arc<R>,
    catalog: Arc<UnitCatalog>,
    config: IngestConfig,
}

impl<R: HoldRepository> Aggregator<R> {
    pub fn new(repository: Arc<R>, catalog: Arc<UnitCatalog>, config: IngestConfig) -> Self {
        Self {
            repository,
            catalog,
            config,
        }
    }

    /// Fold one observation into the store.
    ///
    /// Catalog errors (`MissingUnit`, `UnknownMercenary`) and storage errors
    /// are returned to the caller; nothing has been written when a catalog
    /// error is raised.
    pub async fn absorb(&self, observation: &Observation) -> DomainResult<AbsorbOutcome> {
        if observation.board.is_empty() {
            return Ok(skipped(SkipReason::EmptyBoard));
        }
        if !self.accepts_queue(&observation.queue_type) {
            return Ok(skipped(SkipReason::QueueType));
        }

        let normalized =
            BoardNormalizer::new(&self.catalog).normalize(&observation.board, &observation.sends)?;
        let table = TableKey::new(normalized.anchor.unit_id.clone(), observation.wave);

        if !self.repository.is_provisioned(&table).await? {
            debug!(table = %table, "Skipping observation for unprovisioned table");
            return Ok(skipped(SkipReason::UnprovisionedTable));
        }

        let leaked = self.leaked(observation);
        let hold_tally = HoldTally::single(observation.won, observation.workers);
        let send_tally = SendTally::single(leaked, observation.leaked_amount);

        let existing = self
            .repository
            .find_hold(&table, &normalized.fingerprint, &observation.version)
            .await?;

        let (hold_id, new_hold) = match existing {
            Some(mut hold) => {
                hold.absorb(&hold_tally);
                self.repository.update_hold(&table, &hold).await?;
                (hold.id, false)
            }
            None => {
                if self.below_rating_floor(observation.rating) {
                    return Ok(skipped(SkipReason::BelowRatingFloor));
                }
                let hold = seed_hold(&normalized, &observation.version, &hold_tally);
                (self.repository.insert_hold(&table, &hold).await?, true)
            }
        };

        let new_send = match self
            .repository
            .find_send(&table, hold_id, &normalized.sends)
            .await?
        {
            Some(mut send) => {
                send.absorb(&send_tally);
                self.repository.update_send(&table, &send).await?;
                false
            }
            None => {
                let send = SendRecord::seed(
                    hold_id,
                    normalized.sends.clone(),
                    normalized.send_mythium,
                    &send_tally,
                );
                self.repository.insert_send(&table, &send).await?;
                true
            }
        };

        Ok(AbsorbOutcome::Recorded {
            table,
            hold_id,
            new_hold,
            new_send,
            leaked,
        })
    }

    /// Fold a batch, logging and dropping observations that fail.
    pub async fn absorb_all(&self, observations: &[Observation]) -> AggregateReport {
        let mut report = AggregateReport::default();
        for observation in observations {
            match self.absorb(observation).await {
                Ok(outcome) => report.record(&outcome),
                Err(e) => {
                    warn!(
                        player = %observation.player,
                        wave = observation.wave,
                        error = %e,
                        "Dropping observation"
                    );
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Whether the defender counts as having leaked this wave.
    ///
    /// Besides real leaks, an incubating unit that has not matured into its
    /// final form by the next wave counts as a leak. A missing next board
    /// means maturity cannot be confirmed.
    pub fn leaked(&self, observation: &Observation) -> bool {
        if observation.any_leak() {
            return true;
        }
        observation.board.entries().iter().any(|entry| {
            self.incubator(&entry.unit_id)
                .is_some_and(|rule| !matured(rule, entry, observation.next_board.as_ref()))
        })
    }

    fn incubator(&self, unit_id: &str) -> Option<&IncubatorRule> {
        self.config.incubators.iter().find(|r| r.unit_id == unit_id)
    }

    fn accepts_queue(&self, queue_type: &str) -> bool {
        self.config.queue_types.is_empty() || self.config.queue_types.iter().any(|q| q == queue_type)
    }

    fn below_rating_floor(&self, rating: u32) -> bool {
        self.config.rating_floor > 0 && rating < self.config.rating_floor
    }
}

fn matured(rule: &IncubatorRule, entry: &BuildEntry, next: Option<&BoardSnapshot>) -> bool {
    next.and_then(|board| board.entry_at(entry))
        .is_some_and(|e| e.unit_id == rule.matured_unit_id && e.stacks == 0)
}

fn seed_hold(normalized: &NormalizedBoard, version: &str, tally: &HoldTally) -> Hold {
    Hold::seed(
        normalized.fingerprint.clone(),
        normalized.position.clone(),
        normalized.total_value,
        version,
        tally,
    )
}

fn skipped(reason: SkipReason) -> AbsorbOutcome {
    AbsorbOutcome::Skipped { reason }
}
