//! HTTP client for the game statistics API.
//!
//! Every request passes through a shared `governor` rate limiter and is
//! retried with exponential backoff on transient failures (rate limiting,
//! server errors, network errors). A 404 is the API's way of saying a
//! listing is exhausted and is surfaced as `None`, never retried.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ApiConfig, RetryConfig};
use crate::domain::ports::{CatalogRecord, ObservationPage, ObservationSource, PageRequest, UnitSource};

use super::models::{RawGame, RawUnit, VersionProbe};

/// Unit whose record carries the newest published version.
const VERSION_PROBE_UNIT: &str = "elite_archer_unit_id";

/// Errors raised while talking to the API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Server error ({0}): {1}")]
    Server(StatusCode, String),

    #[error("Unexpected status ({0}): {1}")]
    Status(StatusCode, String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Returns true if the request should be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Server(..) | Self::Network(_))
    }
}

impl From<ApiError> for DomainError {
    fn from(err: ApiError) -> Self {
        DomainError::IngestionFailed(err.to_string())
    }
}

/// Rate-limited, retrying client.
#[derive(Clone)]
pub struct LtdApiClient {
    http: Client,
    base_url: String,
    api_key: String,
    page_size: u32,
    creatures_per_wave: u32,
    limiter: Arc<DefaultDirectRateLimiter>,
    retry: RetryConfig,
}

impl LtdApiClient {
    pub fn new(api: &ApiConfig, retry: &RetryConfig, creatures_per_wave: u32) -> Result<Self, ApiError> {
        let per_second = NonZeroU32::new(api.requests_per_second)
            .ok_or_else(|| ApiError::Config("requests_per_second must be positive".to_string()))?;
        let burst = NonZeroU32::new(api.burst_size.max(1)).unwrap_or(per_second);
        let http = Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .user_agent("ltd-meta")
            .build()?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            api_key: api.api_key.clone(),
            page_size: api.page_size.max(1),
            creatures_per_wave,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst))),
            retry: retry.clone(),
        })
    }

    /// GET a JSON document; `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ApiError> {
        let full_url = format!("{}{path}", self.base_url);
        let counter = AtomicU32::new(0);
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.retry.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(self.retry.max_backoff_ms))
            .with_max_elapsed_time(None)
            .build();

        let attempts = &counter;
        let url = full_url.as_str();
        let max_retries = self.retry.max_retries;
        backoff::future::retry_notify(
            policy,
            move || async move {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                self.request_once(url, query).await.map_err(|err| {
                    if err.is_transient() && attempt < max_retries {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            },
            |err: ApiError, wait: Duration| {
                warn!(url, error = %err, wait_ms = wait.as_millis() as u64, "Retrying API request");
            },
        )
        .await
    }

    async fn request_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ApiError> {
        self.limiter.until_ready().await;
        debug!(url, "GET");

        let response = self
            .http
            .get(url)
            .header("x-api-key", &self.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited);
        }
        let body = response.text().await?;
        if status.is_server_error() {
            return Err(ApiError::Server(status, body));
        }
        if !status.is_success() {
            return Err(ApiError::Status(status, body));
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// One page of games played after `request.date_after`.
    pub async fn games(&self, request: &PageRequest) -> Result<Option<Vec<RawGame>>, ApiError> {
        let query = [
            ("limit", request.limit.to_string()),
            ("sortBy", "date".to_string()),
            ("sortDirection", "1".to_string()),
            ("includeDetails", "true".to_string()),
            ("dateAfter", request.date_after.clone()),
            ("offset", request.offset.to_string()),
        ];
        self.get_json("/games", &query).await
    }

    /// Every unit of a version, paging until the listing runs dry.
    pub async fn units(&self, version: &str) -> Result<Vec<RawUnit>, ApiError> {
        let path = format!("/units/byVersion/{version}");
        let mut units = Vec::new();
        let mut offset = 0u32;
        loop {
            let query = [
                ("limit", self.page_size.to_string()),
                ("offset", offset.to_string()),
            ];
            let page: Vec<RawUnit> = match self.get_json(&path, &query).await? {
                Some(page) => page,
                None => break,
            };
            if page.is_empty() {
                break;
            }
            let fetched = page.len();
            units.extend(page);
            if fetched < self.page_size as usize {
                break;
            }
            offset += self.page_size;
        }
        Ok(units)
    }
}

#[async_trait]
impl ObservationSource for LtdApiClient {
    async fn fetch_page(&self, request: &PageRequest) -> DomainResult<Option<ObservationPage>> {
        let games = match self.games(request).await? {
            Some(games) if !games.is_empty() => games,
            _ => return Ok(None),
        };

        let observations = games
            .iter()
            .flat_map(|game| game.observations(self.creatures_per_wave))
            .collect();
        let last_date = games.last().map(|g| g.date.clone()).filter(|d| !d.is_empty());

        Ok(Some(ObservationPage {
            observations,
            games: games.len(),
            last_date,
        }))
    }
}

#[async_trait]
impl UnitSource for LtdApiClient {
    async fn latest_version(&self) -> DomainResult<String> {
        let probe: VersionProbe = self
            .get_json(&format!("/units/byId/{VERSION_PROBE_UNIT}"), &[])
            .await?
            .ok_or_else(|| DomainError::IngestionFailed(format!("{VERSION_PROBE_UNIT} not found")))?;
        if probe.version.is_empty() {
            return Err(DomainError::IngestionFailed(
                "Version probe returned an empty version".to_string(),
            ));
        }
        Ok(probe.version)
    }

    async fn fetch_units(&self, version: &str) -> DomainResult<Vec<CatalogRecord>> {
        let mut records = Vec::new();
        for unit in self.units(version).await? {
            if let Some(record) = unit.into_record()? {
                records.push(record);
            }
        }
        Ok(records)
    }
}
