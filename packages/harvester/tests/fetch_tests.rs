//! Card download against a mock archive API.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zettel_harvester::fetch::{download_cards, FetchReport};
use zettel_harvester::FetchConfig;

fn test_config(server: &MockServer) -> FetchConfig {
    FetchConfig::default()
        .with_api_base_url(format!("{}/ZK/zettel/", server.uri()))
        .with_workers(2)
        .with_retries(3)
        .with_retry_delay(Duration::from_millis(10))
}

fn card_json(html: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "ZK_1_NB_1-1_V",
        "transcription": { "html": html, "readyForPublication": true },
        "facsimile": { "front": "scan.jpg" }
    })
}

/// The blocking client must not run on the async runtime.
async fn download(ids: &[&str], json_dir: PathBuf, config: FetchConfig) -> FetchReport {
    let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    tokio::task::spawn_blocking(move || download_cards(&ids, &json_dir, &config))
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_saves_pretty_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ZK/zettel/ZK_1_NB_1-1_V"))
        .respond_with(ResponseTemplate::new(200).set_body_json(card_json("<p>Sinn</p>")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let json_dir = dir.path().join("jsons");
    let report = download(&["ZK_1_NB_1-1_V"], json_dir.clone(), test_config(&server)).await;

    assert_eq!(report.succeeded, vec!["ZK_1_NB_1-1_V"]);
    assert!(report.failed.is_empty());

    let saved = fs::read_to_string(json_dir.join("ZK_1_NB_1-1_V.json")).unwrap();
    assert!(saved.contains("\n  \"transcription\""));
    let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(value, card_json("<p>Sinn</p>"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ZK/zettel/ZK_1_NB_2_V"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ZK/zettel/ZK_1_NB_2_V"))
        .respond_with(ResponseTemplate::new(200).set_body_json(card_json("<p>x</p>")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = download(&["ZK_1_NB_2_V"], dir.path().to_path_buf(), test_config(&server)).await;

    assert_eq!(report.succeeded, vec!["ZK_1_NB_2_V"]);
    assert!(dir.path().join("ZK_1_NB_2_V.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failures_do_not_abort_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ZK/zettel/ZK_1_NB_3_V"))
        .respond_with(ResponseTemplate::new(200).set_body_json(card_json("<p>x</p>")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ZK/zettel/ZK_1_NB_4_V"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ZK/zettel/ZK_1_NB_5_V"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ZK/zettel/ZK_1_NB_6_V"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = download(
        &["ZK_1_NB_3_V", "ZK_1_NB_4_V", "ZK_1_NB_5_V", "ZK_1_NB_6_V"],
        dir.path().to_path_buf(),
        test_config(&server),
    )
    .await;

    assert_eq!(report.succeeded, vec!["ZK_1_NB_3_V"]);
    assert_eq!(
        report.failed_ids(),
        vec!["ZK_1_NB_4_V", "ZK_1_NB_5_V", "ZK_1_NB_6_V"]
    );
    assert_eq!(report.retryable_ids(), vec!["ZK_1_NB_5_V"]);
    assert_eq!(report.fatal_ids(), vec!["ZK_1_NB_4_V", "ZK_1_NB_6_V"]);
    assert!(!dir.path().join("ZK_1_NB_4_V.json").exists());
    assert!(!dir.path().join("ZK_1_NB_6_V.json").exists());
}
