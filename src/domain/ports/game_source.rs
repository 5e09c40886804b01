use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Mercenary, Observation, Unit};

/// One page request inside a date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Only games played after this timestamp are returned
    pub date_after: String,
    pub offset: u32,
    pub limit: u32,
}

/// One fetched page of games, flattened into observations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationPage {
    pub observations: Vec<Observation>,
    /// Games on the page, including ones that produced no observations
    pub games: usize,
    /// Timestamp of the newest game on the page
    pub last_date: Option<String>,
}

/// Port for anything that yields recorded games page by page.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Fetch one page; `None` once the window holds no more games
    async fn fetch_page(&self, request: &PageRequest) -> DomainResult<Option<ObservationPage>>;
}

/// A catalog record published by the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CatalogRecord {
    Fighter { unit: Unit, upgrades_to: Vec<String> },
    Mercenary(Mercenary),
}

/// Port for the authoritative unit list.
#[async_trait]
pub trait UnitSource: Send + Sync {
    /// Newest published game version
    async fn latest_version(&self) -> DomainResult<String>;

    /// Every fighter and mercenary of a version
    async fn fetch_units(&self, version: &str) -> DomainResult<Vec<CatalogRecord>>;
}
