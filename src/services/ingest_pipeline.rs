//! Concurrent ingestion of recorded games.
//!
//! Fetching fans out over `workers` tasks that pull pages of one date
//! window by offset. Pages flow through a bounded `mpsc` queue into a single
//! aggregation worker, which keeps every hold/send upsert serialized. When
//! a window runs past `max_offset` without exhausting the source, the next
//! window starts at the newest game date seen so far.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use indicatif::ProgressBar;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ApiConfig, IngestConfig};
use crate::domain::ports::{HoldRepository, ObservationPage, ObservationSource, PageRequest};
use crate::services::aggregator::{AggregateReport, Aggregator};

/// Where to start and how much to fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOptions {
    /// Only games after this timestamp are fetched
    pub date_after: String,
    /// Stop after this many pages, across all windows
    pub max_pages: Option<u32>,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub windows: usize,
    pub pages: usize,
    pub games: usize,
    pub observations: usize,
    pub aggregate: AggregateReport,
    /// Newest game date seen; resume from here next time
    pub last_date: Option<String>,
}

/// Result of draining one date window.
#[derive(Debug, Default)]
struct WindowOutcome {
    pages: usize,
    games: usize,
    newest: Option<String>,
    exhausted: bool,
}

/// Shared state of the fetch workers of one window.
struct WindowState {
    date_after: String,
    next_offset: AtomicU32,
    exhausted: AtomicBool,
    pages: AtomicUsize,
    games: AtomicUsize,
    newest: Mutex<Option<String>>,
}

pub struct IngestPipeline<S, R>
where
    S: ObservationSource + 'static,
    R: HoldRepository + 'static,
{
    source: Arc<S>,
    aggregator: Arc<Aggregator<R>>,
    page_size: u32,
    max_offset: u32,
    workers: usize,
    queue_capacity: usize,
    progress: ProgressBar,
}

impl<S, R> IngestPipeline<S, R>
where
    S: ObservationSource + 'static,
    R: HoldRepository + 'static,
{
    pub fn new(source: Arc<S>, aggregator: Arc<Aggregator<R>>, api: &ApiConfig, ingest: &IngestConfig) -> Self {
        Self {
            source,
            aggregator,
            page_size: api.page_size.max(1),
            max_offset: api.max_offset,
            workers: ingest.workers.max(1),
            queue_capacity: ingest.queue_capacity.max(1),
            progress: ProgressBar::hidden(),
        }
    }

    /// Report fetched games on a progress bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Fetch and aggregate until the source is exhausted or the page budget
    /// is spent.
    ///
    /// A fetch error stops further fetching; pages already queued are still
    /// aggregated before the error is returned.
    pub async fn run(&self, options: &IngestOptions) -> DomainResult<IngestReport> {
        let (tx, rx) = mpsc::channel::<ObservationPage>(self.queue_capacity);
        let writer = tokio::spawn(drain(self.aggregator.clone(), rx, self.progress.clone()));

        let fetched = self.fetch_all(options, tx).await;

        let (aggregate, observations) = writer
            .await
            .map_err(|e| DomainError::IngestionFailed(format!("Aggregation worker failed: {e}")))?;
        self.progress.finish_and_clear();
        let mut report = fetched?;
        report.aggregate = aggregate;
        report.observations = observations;
        info!(
            windows = report.windows,
            pages = report.pages,
            games = report.games,
            recorded = report.aggregate.recorded,
            new_holds = report.aggregate.new_holds,
            failed = report.aggregate.failed,
            "Ingestion finished"
        );
        Ok(report)
    }

    async fn fetch_all(
        &self,
        options: &IngestOptions,
        tx: mpsc::Sender<ObservationPage>,
    ) -> DomainResult<IngestReport> {
        let mut report = IngestReport::default();
        let mut date_after = options.date_after.clone();

        loop {
            let budget = match options.max_pages {
                Some(max) => {
                    let left = max.saturating_sub(u32::try_from(report.pages).unwrap_or(u32::MAX));
                    if left == 0 {
                        break;
                    }
                    Some(left)
                }
                None => None,
            };

            let window = self.fetch_window(&date_after, budget, &tx).await?;
            report.windows += 1;
            report.pages += window.pages;
            report.games += window.games;
            if window.newest.is_some() {
                report.last_date.clone_from(&window.newest);
            }

            if window.exhausted {
                break;
            }
            match window.newest {
                Some(newest) if newest > date_after => {
                    info!(from = %date_after, to = %newest, "Advancing date window");
                    date_after = newest;
                }
                _ => {
                    warn!(date_after = %date_after, "Date window did not advance; stopping");
                    break;
                }
            }
        }
        Ok(report)
    }

    async fn fetch_window(
        &self,
        date_after: &str,
        budget: Option<u32>,
        tx: &mpsc::Sender<ObservationPage>,
    ) -> DomainResult<WindowOutcome> {
        let state = Arc::new(WindowState {
            date_after: date_after.to_string(),
            next_offset: AtomicU32::new(0),
            exhausted: AtomicBool::new(false),
            pages: AtomicUsize::new(0),
            games: AtomicUsize::new(0),
            newest: Mutex::new(None),
        });

        let mut workers = JoinSet::new();
        for worker in 0..self.workers {
            workers.spawn(fetch_worker(
                worker,
                self.source.clone(),
                state.clone(),
                tx.clone(),
                self.page_size,
                self.max_offset,
                budget,
            ));
        }

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            let result = joined
                .map_err(|e| DomainError::IngestionFailed(format!("Fetch worker failed: {e}")))
                .and_then(|r| r);
            if let Err(e) = result {
                state.exhausted.store(true, Ordering::SeqCst);
                first_error.get_or_insert(e);
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let pages = state.pages.load(Ordering::SeqCst);
        let budget_spent = budget.is_some_and(|b| pages >= b as usize);
        let newest = state.newest.lock().await.clone();
        Ok(WindowOutcome {
            pages,
            games: state.games.load(Ordering::SeqCst),
            newest,
            exhausted: state.exhausted.load(Ordering::SeqCst) && !budget_spent,
        })
    }
}

async fn fetch_worker<S: ObservationSource>(
    worker: usize,
    source: Arc<S>,
    state: Arc<WindowState>,
    tx: mpsc::Sender<ObservationPage>,
    page_size: u32,
    max_offset: u32,
    budget: Option<u32>,
) -> DomainResult<()> {
    loop {
        if state.exhausted.load(Ordering::SeqCst) {
            return Ok(());
        }
        let offset = state.next_offset.fetch_add(page_size, Ordering::SeqCst);
        if offset > max_offset {
            return Ok(());
        }
        if let Some(budget) = budget {
            if offset / page_size >= budget {
                return Ok(());
            }
        }

        let request = PageRequest {
            date_after: state.date_after.clone(),
            offset,
            limit: page_size,
        };
        let Some(page) = source.fetch_page(&request).await? else {
            debug!(worker, offset, "Source exhausted");
            state.exhausted.store(true, Ordering::SeqCst);
            return Ok(());
        };

        state.pages.fetch_add(1, Ordering::SeqCst);
        state.games.fetch_add(page.games, Ordering::SeqCst);
        if let Some(date) = &page.last_date {
            let mut newest = state.newest.lock().await;
            if newest.as_ref().is_none_or(|n| date > n) {
                *newest = Some(date.clone());
            }
        }
        debug!(worker, offset, games = page.games, "Fetched page");

        if tx.send(page).await.is_err() {
            return Err(DomainError::IngestionFailed(
                "Aggregation queue closed".to_string(),
            ));
        }
    }
}

async fn drain<R: HoldRepository>(
    aggregator: Arc<Aggregator<R>>,
    mut rx: mpsc::Receiver<ObservationPage>,
    progress: ProgressBar,
) -> (AggregateReport, usize) {
    let mut report = AggregateReport::default();
    let mut observations = 0;
    while let Some(page) = rx.recv().await {
        observations += page.observations.len();
        report.merge(&aggregator.absorb_all(&page.observations).await);
        progress.inc(page.games as u64);
        progress.set_message(format!("{} holds recorded", report.recorded));
    }
    (report, observations)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::adapters::memory::InMemoryHoldRepository;
    use crate::domain::models::observation::fixtures::observation;
    use crate::domain::models::{Mercenary, TableKey, Unit, UnitCatalog, UpgradeGraph};

    /// Serves fixed pages keyed by (date_after, offset).
    struct ScriptedSource {
        pages: HashMap<(String, u32), ObservationPage>,
        fail_at: Option<u32>,
    }

    #[async_trait]
    impl ObservationSource for ScriptedSource {
        async fn fetch_page(&self, request: &PageRequest) -> DomainResult<Option<ObservationPage>> {
            if self.fail_at == Some(request.offset) {
                return Err(DomainError::IngestionFailed("boom".to_string()));
            }
            Ok(self.pages.get(&(request.date_after.clone(), request.offset)).cloned())
        }
    }

    fn page(date: &str, boards: usize) -> ObservationPage {
        ObservationPage {
            observations: (0..boards)
                .map(|_| observation(1, &["proton_unit_id:1|5:0"]))
                .collect(),
            games: boards,
            last_date: Some(date.to_string()),
        }
    }

    async fn pipeline(
        source: ScriptedSource,
        max_offset: u32,
    ) -> (Arc<InMemoryHoldRepository>, IngestPipeline<ScriptedSource, InMemoryHoldRepository>) {
        let repo = Arc::new(InMemoryHoldRepository::new());
        repo.provision(&TableKey::new("proton_unit_id", 1)).await.unwrap();
        let catalog = Arc::new(UnitCatalog::new(
            vec![Unit::new("proton_unit_id", "Proton", 90)],
            vec![Mercenary::new("snail_unit_id", "Snail", 20, 6)],
            UpgradeGraph::new(),
        ));
        let aggregator = Arc::new(Aggregator::new(repo.clone(), catalog, IngestConfig::default()));
        let api = ApiConfig {
            page_size: 10,
            max_offset,
            ..Default::default()
        };
        let ingest = IngestConfig {
            workers: 3,
            queue_capacity: 2,
            ..Default::default()
        };
        (repo, IngestPipeline::new(Arc::new(source), aggregator, &api, &ingest))
    }

    #[tokio::test]
    async fn test_single_window_until_exhausted() {
        let mut pages = HashMap::new();
        pages.insert((String::new(), 0), page("2024-01-01", 2));
        pages.insert((String::new(), 10), page("2024-01-02", 3));
        let (repo, pipeline) = pipeline(ScriptedSource { pages, fail_at: None }, 1000).await;

        let report = pipeline.run(&IngestOptions::default()).await.unwrap();
        assert_eq!(report.windows, 1);
        assert_eq!(report.pages, 2);
        assert_eq!(report.games, 5);
        assert_eq!(report.observations, 5);
        assert_eq!(report.aggregate.recorded, 5);
        assert_eq!(report.aggregate.new_holds, 1);
        assert_eq!(report.last_date.as_deref(), Some("2024-01-02"));
        assert_eq!(repo.hold_count().await, 1);
    }

    #[tokio::test]
    async fn test_window_advances_past_max_offset() {
        let mut pages = HashMap::new();
        pages.insert((String::new(), 0), page("2024-01-01", 1));
        pages.insert((String::new(), 10), page("2024-01-03", 1));
        pages.insert(("2024-01-03".to_string(), 0), page("2024-01-05", 1));
        let (_, pipeline) = pipeline(ScriptedSource { pages, fail_at: None }, 10).await;

        let report = pipeline.run(&IngestOptions::default()).await.unwrap();
        assert_eq!(report.windows, 2);
        assert_eq!(report.pages, 3);
        assert_eq!(report.last_date.as_deref(), Some("2024-01-05"));
    }

    #[tokio::test]
    async fn test_page_budget() {
        let mut pages = HashMap::new();
        for i in 0..5 {
            pages.insert((String::new(), i * 10), page("2024-01-01", 1));
        }
        let (_, pipeline) = pipeline(ScriptedSource { pages, fail_at: None }, 1000).await;

        let options = IngestOptions {
            max_pages: Some(2),
            ..Default::default()
        };
        let report = pipeline.run(&options).await.unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(report.windows, 1);
    }

    #[tokio::test]
    async fn test_fetch_error_is_returned() {
        let mut pages = HashMap::new();
        pages.insert((String::new(), 0), page("2024-01-01", 1));
        let (_, pipeline) = pipeline(ScriptedSource { pages, fail_at: Some(10) }, 1000).await;

        let err = pipeline.run(&IngestOptions::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::IngestionFailed(_)));
    }
}
