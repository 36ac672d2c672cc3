//! Command-line behavior of the harvester binary.

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CARD_BASE: &str = "https://niklas-luhmann-archiv.de/bestand/zettelkasten/zettel/";

#[test]
fn help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("zettel-harvester");
    cmd.arg("--help");
    cmd.assert().success().stdout(
        predicate::str::contains("master-index")
            .and(predicate::str::contains("download"))
            .and(predicate::str::contains("check-bold")),
    );
}

#[test]
fn reorder_and_master_index() {
    let dir = TempDir::new().unwrap();
    let links_dir = dir.path().join("index_full_links");
    fs::create_dir_all(&links_dir).unwrap();
    fs::write(
        links_dir.join("links_ZK_1_NB_1.txt"),
        format!("{CARD_BASE}ZK_1_NB_1-10_V\n{CARD_BASE}ZK_1_NB_1-2_V\n"),
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("zettel-harvester");
    cmd.arg("--root").arg(dir.path()).arg("reorder");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Reordered"));

    let mut cmd = cargo_bin_cmd!("zettel-harvester");
    cmd.arg("--root").arg(dir.path()).arg("master-index");
    cmd.assert().success();

    let master = fs::read_to_string(dir.path().join("master_index.txt")).unwrap();
    assert_eq!(
        master,
        format!("{CARD_BASE}ZK_1_NB_1-2_V\n{CARD_BASE}ZK_1_NB_1-10_V\n")
    );
}

#[test]
fn missing_input_fails_with_message() {
    let dir = TempDir::new().unwrap();
    let mut cmd = cargo_bin_cmd!("zettel-harvester");
    cmd.arg("--root").arg(dir.path()).arg("progress");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing input"));
}

#[test]
fn missing_writes_id_list_with_header() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("master_index.txt"),
        format!("{CARD_BASE}ZK_1_NB_1_V\n{CARD_BASE}ZK_1_NB_2_V\n"),
    )
    .unwrap();
    let md_dir = dir.path().join("index_full_mds");
    fs::create_dir_all(&md_dir).unwrap();
    fs::write(md_dir.join("ZK_1_NB_1_V.txt"), "**Sinn**").unwrap();

    let mut cmd = cargo_bin_cmd!("zettel-harvester");
    cmd.arg("--root").arg(dir.path()).arg("missing");
    cmd.assert().success();

    let written = fs::read_to_string(dir.path().join("missing_specific_ids.txt")).unwrap();
    assert_eq!(
        written,
        "# IDs present in master_index.txt but missing in index_full_mds\n\nZK_1_NB_2_V\n"
    );
}

#[test]
fn check_bold_on_empty_markdown_dir_reports_zero_files() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("index_full_mds")).unwrap();

    let mut cmd = cargo_bin_cmd!("zettel-harvester");
    cmd.arg("--root").arg(dir.path()).arg("check-bold");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Files analyzed: 0"));

    let mut cmd = cargo_bin_cmd!("zettel-harvester");
    cmd.arg("--root").arg(dir.path().join("absent")).arg("check-bold");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing input"));
}

async fn mount_card(server: &MockServer, id: &str, status: u16) {
    let response = if status == 200 {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "transcription": { "html": "<p>Sinn</p>", "readyForPublication": true }
        }))
    } else {
        ResponseTemplate::new(status)
    };
    Mock::given(method("GET"))
        .and(path(format!("/ZK/zettel/{id}")))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Run `download` off the async runtime; the mock server keeps serving.
async fn run_download(root: PathBuf, api_url: String, source: String) {
    tokio::task::spawn_blocking(move || {
        let mut cmd = cargo_bin_cmd!("zettel-harvester");
        cmd.arg("--root")
            .arg(&root)
            .args(["download", "--workers", "2", "--retries", "2"])
            .args(["--retry-delay-ms", "10", "--source", &source])
            .arg("--api-url")
            .arg(api_url);
        cmd.assert().success();
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn download_lists_only_retryable_failures_for_retry() {
    let server = MockServer::start().await;
    mount_card(&server, "ZK_1_NB_1_V", 200).await;
    mount_card(&server, "ZK_1_NB_2_V", 404).await;
    mount_card(&server, "ZK_1_NB_3_V", 503).await;

    let dir = TempDir::new().unwrap();
    let ids = dir.path().join("ids.txt");
    fs::write(&ids, "ZK_1_NB_1_V\nZK_1_NB_2_V\nZK_1_NB_3_V\n").unwrap();
    let api_url = format!("{}/ZK/zettel/", server.uri());

    run_download(
        dir.path().to_path_buf(),
        api_url,
        ids.display().to_string(),
    )
    .await;

    assert!(dir.path().join("index_full_jsons/ZK_1_NB_1_V.json").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("failed_downloads.txt")).unwrap(),
        "ZK_1_NB_3_V\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("fatal_downloads.txt")).unwrap(),
        "ZK_1_NB_2_V\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn successful_retry_clears_failed_list() {
    let server = MockServer::start().await;
    mount_card(&server, "ZK_1_NB_3_V", 200).await;

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("failed_downloads.txt"), "ZK_1_NB_3_V\n").unwrap();
    fs::write(dir.path().join("fatal_downloads.txt"), "ZK_1_NB_2_V\n").unwrap();
    let api_url = format!("{}/ZK/zettel/", server.uri());

    run_download(dir.path().to_path_buf(), api_url, "failed".to_string()).await;

    assert!(dir.path().join("index_full_jsons/ZK_1_NB_3_V.json").exists());
    assert!(!dir.path().join("failed_downloads.txt").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("fatal_downloads.txt")).unwrap(),
        "ZK_1_NB_2_V\n"
    );
}
