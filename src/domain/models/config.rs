use serde::{Deserialize, Serialize};

/// Main configuration structure for ltd-meta
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Game API client configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Ingestion and aggregation configuration
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Unit catalog configuration
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Hold ranking configuration
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Guide composition configuration
    #[serde(default)]
    pub guides: GuideConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".ltd-meta/meta.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// `sqlx` connection URL for the configured path.
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Game API client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiConfig {
    /// Base URL of the game statistics API
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// API key sent as `x-api-key`
    #[serde(default)]
    pub api_key: String,

    /// Games per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Offset at which the date window advances
    #[serde(default = "default_max_offset")]
    pub max_offset: u32,

    /// Requests per second allowed
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Burst size for the rate limiter
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://apiv2.legiontd2.com".to_string()
}

const fn default_page_size() -> u32 {
    50
}

const fn default_max_offset() -> u32 {
    50_000
}

const fn default_requests_per_second() -> u32 {
    10
}

const fn default_burst_size() -> u32 {
    20
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            api_key: String::new(),
            page_size: default_page_size(),
            max_offset: default_max_offset(),
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// A unit that must mature into another form by the next wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncubatorRule {
    /// Unit placed while incubating
    pub unit_id: String,
    /// Form it must have reached, with zero stacks left, one wave later
    pub matured_unit_id: String,
}

impl IncubatorRule {
    pub fn new(unit_id: impl Into<String>, matured_unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            matured_unit_id: matured_unit_id.into(),
        }
    }
}

fn default_incubators() -> Vec<IncubatorRule> {
    vec![IncubatorRule::new("eggsack_unit_id", "hydra_unit_id")]
}

/// Ingestion and aggregation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IngestConfig {
    /// Concurrent fetch workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the game queue between fetchers and the aggregator
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Minimum rating allowed to seed a never-seen hold (0 disables)
    #[serde(default = "default_rating_floor")]
    pub rating_floor: u32,

    /// Queue types whose games are aggregated
    #[serde(default = "default_queue_types")]
    pub queue_types: Vec<String>,

    /// Creatures per wave, used to value individual leaks
    #[serde(default = "default_creatures_per_wave")]
    pub creatures_per_wave: u32,

    /// Units that must mature by the next wave to count as held
    #[serde(default = "default_incubators")]
    pub incubators: Vec<IncubatorRule>,
}

const fn default_workers() -> usize {
    4
}

const fn default_queue_capacity() -> usize {
    1_024
}

const fn default_rating_floor() -> u32 {
    1_800
}

fn default_queue_types() -> Vec<String> {
    vec!["Normal".to_string()]
}

const fn default_creatures_per_wave() -> u32 {
    12
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            rating_floor: default_rating_floor(),
            queue_types: default_queue_types(),
            creatures_per_wave: default_creatures_per_wave(),
            incubators: default_incubators(),
        }
    }
}

/// Hold ranking configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScoringConfig {
    /// Multiplier applied to gold lost to leaks
    #[serde(default = "default_leak_scaler")]
    pub leak_scaler: f64,

    /// Default number of holds returned by a ranking
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Ranking cache time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

const fn default_leak_scaler() -> f64 {
    1.0
}

const fn default_max_results() -> usize {
    20
}

const fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            leak_scaler: default_leak_scaler(),
            max_results: default_max_results(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Unit catalog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CatalogConfig {
    /// Fighters worth less than this get no hold tables
    #[serde(default = "default_min_anchor_value")]
    pub min_anchor_value: u32,
}

const fn default_min_anchor_value() -> u32 {
    10
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            min_anchor_value: default_min_anchor_value(),
        }
    }
}

/// Guide composition configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GuideConfig {
    /// Maximum guides kept after deduplication
    #[serde(default = "default_max_guides")]
    pub max_guides: usize,

    /// Ranked holds considered per anchor per wave
    #[serde(default = "default_candidates_per_wave")]
    pub candidates_per_wave: usize,

    /// Units worth at most this much are cheap filler
    #[serde(default = "default_filler_value_max")]
    pub filler_value_max: u32,

    /// Wave-1 value above which a guide is an economic stall
    #[serde(default = "default_stall_value")]
    pub stall_value: u32,

    /// Wave-3 value from which a filler-free guide is hybrid economic
    #[serde(default = "default_hybrid_value")]
    pub hybrid_value: u32,

    /// Units matched on stack count rather than identity alone
    #[serde(default = "default_special_units")]
    pub special_units: Vec<String>,
}

const fn default_max_guides() -> usize {
    100
}

const fn default_candidates_per_wave() -> usize {
    500
}

const fn default_filler_value_max() -> u32 {
    30
}

const fn default_stall_value() -> u32 {
    250
}

const fn default_hybrid_value() -> u32 {
    285
}

fn default_special_units() -> Vec<String> {
    vec![
        "hell_raiser_buffed_unit_id".to_string(),
        "pack_rat_nest_unit_id".to_string(),
    ]
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            max_guides: default_max_guides(),
            candidates_per_wave: default_candidates_per_wave(),
            filler_value_max: default_filler_value_max(),
            stall_value: default_stall_value(),
            hybrid_value: default_hybrid_value(),
            special_units: default_special_units(),
        }
    }
}
