//! Ingestion from a mocked game API into SQLite.

mod common;

use std::sync::Arc;

use common::{catalog, config, VERSION};
use ltd_meta::adapters::ltdapi::LtdApiClient;
use ltd_meta::adapters::sqlite::{create_migrated_test_pool, SqliteHoldRepository};
use ltd_meta::domain::models::{Config, TableKey};
use ltd_meta::domain::ports::HoldRepository;
use ltd_meta::services::{Aggregator, IngestOptions, IngestPipeline, MetaService};
use mockito::Matcher;
use serde_json::json;

fn api_config(base_url: String) -> Config {
    let mut config = config();
    config.api.base_url = base_url;
    config.api.page_size = 1;
    config.api.requests_per_second = 100;
    config.api.burst_size = 100;
    config.retry.max_retries = 1;
    config.retry.initial_backoff_ms = 1;
    config.retry.max_backoff_ms = 5;
    config
}

fn game(date: &str, player: &str, result: &str) -> serde_json::Value {
    json!({
        "date": date,
        "queueType": "Normal",
        "endingWave": 3,
        "playersData": [{
            "playerName": player,
            "gameResult": result,
            "overallElo": 2500,
            "version": VERSION,
            "workersPerWave": [5, 6],
            "mercenariesReceivedPerWave": [["Snail"], []],
            "leaksPerWave": [[], ["Crab", "Crab", "Crab"]],
            "buildPerWave": [
                ["proton_unit_id:1|3:0"],
                ["proton_unit_id:1|3:0", "peewee_unit_id:2|3:0"]
            ]
        }]
    })
}

#[tokio::test]
async fn test_ingest_pages_into_sqlite() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/games")
        .match_query(Matcher::UrlEncoded("offset".into(), "0".into()))
        .match_header("x-api-key", Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([game("2024-05-01 10:00:00", "alice", "won")]).to_string())
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/games")
        .match_query(Matcher::UrlEncoded("offset".into(), "1".into()))
        .with_status(200)
        .with_body(json!([game("2024-05-01 11:00:00", "bob", "lost")]).to_string())
        .create_async()
        .await;
    let exhausted = server
        .mock("GET", "/games")
        .match_query(Matcher::UrlEncoded("offset".into(), "2".into()))
        .with_status(404)
        .create_async()
        .await;

    let config = api_config(server.url());
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = Arc::new(SqliteHoldRepository::new(pool));
    let service = MetaService::new(repo.clone(), catalog(), &config);
    service.provision(1..=2).await.unwrap();

    let client = LtdApiClient::new(&config.api, &config.retry, config.ingest.creatures_per_wave).unwrap();
    let aggregator = Arc::new(Aggregator::new(repo.clone(), catalog(), config.ingest.clone()));
    let pipeline = IngestPipeline::new(Arc::new(client), aggregator, &config.api, &config.ingest);

    let report = pipeline
        .run(&IngestOptions {
            date_after: "2024-05-01 00:00:00".to_string(),
            max_pages: None,
        })
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    exhausted.assert_async().await;
    assert_eq!(report.windows, 1);
    assert_eq!(report.pages, 2);
    assert_eq!(report.games, 2);
    assert_eq!(report.observations, 4);
    assert_eq!(report.aggregate.recorded, 4);
    assert_eq!(report.aggregate.new_holds, 2);
    assert_eq!(report.last_date.as_deref(), Some("2024-05-01 11:00:00"));

    let wave_one = repo.list_sends(&TableKey::new("proton_unit_id", 1)).await.unwrap();
    assert_eq!(wave_one.len(), 1);
    assert_eq!(wave_one[0].sends, "snail_unit_id");
    assert_eq!(wave_one[0].held, 2);

    // Three of twelve creatures leaked at wave 2: a quarter of the 84 bounty.
    let wave_two = repo.list_sends(&TableKey::new("proton_unit_id", 2)).await.unwrap();
    assert_eq!(wave_two.len(), 1);
    assert_eq!(wave_two[0].leaked, 2);
    assert_eq!(wave_two[0].leaked_amount, 42);

    assert_eq!(service.versions().await.unwrap(), vec![VERSION.to_string()]);
}

#[tokio::test]
async fn test_ingest_respects_page_budget() {
    let mut server = mockito::Server::new_async().await;
    let page = server
        .mock("GET", "/games")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!([game("2024-05-01 10:00:00", "alice", "won")]).to_string())
        .expect(1)
        .create_async()
        .await;

    let config = api_config(server.url());
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = Arc::new(SqliteHoldRepository::new(pool));

    let client = LtdApiClient::new(&config.api, &config.retry, config.ingest.creatures_per_wave).unwrap();
    let aggregator = Arc::new(Aggregator::new(repo, catalog(), config.ingest.clone()));
    let pipeline = IngestPipeline::new(Arc::new(client), aggregator, &config.api, &config.ingest);

    let report = pipeline
        .run(&IngestOptions {
            date_after: "2024-05-01 00:00:00".to_string(),
            max_pages: Some(1),
        })
        .await
        .unwrap();

    page.assert_async().await;
    assert_eq!(report.pages, 1);
    // Nothing is provisioned, so every observation is skipped.
    assert_eq!(report.aggregate.recorded, 0);
    assert_eq!(report.aggregate.skipped, 2);
}

#[tokio::test]
async fn test_ingest_surfaces_client_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/games")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body("bad key")
        .create_async()
        .await;

    let config = api_config(server.url());
    let pool = create_migrated_test_pool().await.unwrap();
    let repo = Arc::new(SqliteHoldRepository::new(pool));
    let client = LtdApiClient::new(&config.api, &config.retry, config.ingest.creatures_per_wave).unwrap();
    let aggregator = Arc::new(Aggregator::new(repo, catalog(), config.ingest.clone()));
    let pipeline = IngestPipeline::new(Arc::new(client), aggregator, &config.api, &config.ingest);

    let result = pipeline
        .run(&IngestOptions {
            date_after: "2024-05-01 00:00:00".to_string(),
            max_pages: None,
        })
        .await;
    assert!(result.is_err());
}
