//! Concurrent download of card records.
//!
//! Cards are fetched on a bounded rayon pool. Each card retries on its own;
//! a failed card never aborts the batch, it is reported in [`FetchReport`].

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use rayon::prelude::*;
use reqwest::blocking::Client;

use crate::config::{validate_card_id, FetchConfig, WorkspaceLayout};
use crate::error::{HarvesterError, Result};
use crate::http::{create_client, download_bytes};
use crate::lines::{read_id_list, read_lines};

/// Extract the card ID from a card URL: the last path segment.
///
/// Query strings and fragments are ignored.
///
/// # Examples
/// ```
/// use zettel_harvester::fetch::card_id_from_url;
///
/// assert_eq!(
///     card_id_from_url("https://niklas-luhmann-archiv.de/bestand/zettelkasten/zettel/ZK_1_NB_1-2_V"),
///     "ZK_1_NB_1-2_V"
/// );
/// ```
#[must_use]
pub fn card_id_from_url(url: &str) -> String {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..end];
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// Join the record endpoint and a card ID, tolerating a missing trailing
/// slash on `base`.
#[must_use]
pub fn api_url(base: &str, id: &str) -> String {
    format!("{}/{id}", base.trim_end_matches('/'))
}

/// Where the list of cards to download comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingSource {
    /// Every master index card without a saved record.
    MasterIndex,

    /// IDs listed in a file (`missing_jsons.txt`, `failed_downloads.txt`, ...).
    List(PathBuf),
}

/// Determine which card IDs still need downloading.
pub fn missing_ids(layout: &WorkspaceLayout, source: &MissingSource) -> Result<Vec<String>> {
    match source {
        MissingSource::List(path) => {
            let ids = read_id_list(path)?;
            tracing::info!(path = %path.display(), count = ids.len(), "Using ID list");
            Ok(ids)
        }
        MissingSource::MasterIndex => {
            let links = read_lines(&layout.master_index())?;
            let missing: Vec<String> = links
                .iter()
                .map(|link| card_id_from_url(link))
                .filter(|id| !layout.json_path(id).exists())
                .collect();
            tracing::info!(
                missing = missing.len(),
                total = links.len(),
                "Checked master index against saved records"
            );
            Ok(missing)
        }
    }
}

/// Outcome of a batch download.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// IDs saved successfully, in input order.
    pub succeeded: Vec<String>,

    /// IDs that failed, with the final error, in input order.
    pub failed: Vec<(String, HarvesterError)>,
}

impl FetchReport {
    #[must_use]
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// Failed IDs a later run may still fetch (server errors, timeouts).
    #[must_use]
    pub fn retryable_ids(&self) -> Vec<&str> {
        self.failed
            .iter()
            .filter(|(_, e)| e.is_retryable())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Failed IDs that will fail again (4xx, unreadable record, bad ID).
    #[must_use]
    pub fn fatal_ids(&self) -> Vec<&str> {
        self.failed
            .iter()
            .filter(|(_, e)| !e.is_retryable())
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Download one card record and save it as pretty-printed `<id>.json`.
pub fn download_card(
    client: &Client,
    config: &FetchConfig,
    id: &str,
    json_dir: &Path,
) -> Result<PathBuf> {
    validate_card_id(id)?;
    let url = config.card_url(id);

    let bytes = download_bytes(client, &url, config.retries, config.retry_delay).map_err(|e| {
        if let HarvesterError::Http(source) = e {
            HarvesterError::Download {
                id: id.to_string(),
                source,
            }
        } else {
            e
        }
    })?;

    let record: serde_json::Value = serde_json::from_slice(&bytes)?;
    let path = json_dir.join(format!("{id}.json"));
    fs::write(&path, serde_json::to_string_pretty(&record)?)?;
    tracing::debug!(id, path = %path.display(), "Saved card record");
    Ok(path)
}

/// Download every card in `ids` into `json_dir`.
pub fn download_cards(ids: &[String], json_dir: &Path, config: &FetchConfig) -> Result<FetchReport> {
    download_cards_with_progress(ids, json_dir, config, &ProgressBar::hidden())
}

/// [`download_cards`], ticking `progress` once per finished card.
pub fn download_cards_with_progress(
    ids: &[String],
    json_dir: &Path,
    config: &FetchConfig,
    progress: &ProgressBar,
) -> Result<FetchReport> {
    config.validate()?;
    fs::create_dir_all(json_dir)?;

    let client = create_client()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("fetch-{i}"))
        .build()?;

    tracing::info!(count = ids.len(), workers = config.workers, "Starting downloads");

    let outcomes: Vec<(String, Result<PathBuf>)> = pool.install(|| {
        ids.par_iter()
            .map(|id| {
                let outcome = download_card(&client, config, id, json_dir);
                progress.inc(1);
                (id.clone(), outcome)
            })
            .collect()
    });

    let mut report = FetchReport::default();
    for (id, outcome) in outcomes {
        match outcome {
            Ok(_) => report.succeeded.push(id),
            Err(e) => {
                tracing::warn!(id = %id, error = %e, retryable = e.is_retryable(), "Download failed");
                report.failed.push((id, e));
            }
        }
    }

    tracing::info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "Downloads finished"
    );
    Ok(report)
}
