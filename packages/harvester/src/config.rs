//! Configuration constants, workspace layout and validation functions.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::{HarvesterError, Result};

/// Base URL that branch index hrefs are relative to.
pub const BRANCHVIEW_BASE_URL: &str = "https://assets.niklas-luhmann-archiv.de/branchview";

/// Base URL of the card record API; the card ID is appended.
pub const API_BASE_URL: &str = "https://v0.api.niklas-luhmann-archiv.de/ZK/zettel/";

/// Public site, used to absolutize `/bestand/...` links in transcriptions.
pub const SITE_BASE_URL: &str = "https://niklas-luhmann-archiv.de";

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default number of concurrent download workers.
pub const DEFAULT_WORKERS: usize = 8;

/// Default number of attempts per card download.
pub const DEFAULT_RETRIES: u32 = 3;

/// Base delay between download attempts (milliseconds).
pub const RETRY_DELAY_MS: u64 = 1000;

/// First words longer than this are left unbolded.
pub const MAX_FIRST_WORD_LEN: usize = 20;

/// Card IDs end up in file names, so only a safe alphabet is accepted.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CARD_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]*$").expect("valid regex"));

/// Validate a card ID before it is used in a URL or file name.
///
/// # Examples
/// ```
/// use zettel_harvester::config::validate_card_id;
///
/// assert!(validate_card_id("ZK_1_NB_1-5A1c_V").is_ok());
/// assert!(validate_card_id("../etc/passwd").is_err());
/// ```
pub fn validate_card_id(id: &str) -> Result<()> {
    if CARD_ID_PATTERN.is_match(id) {
        Ok(())
    } else {
        Err(HarvesterError::InvalidConfig(format!(
            "invalid card ID '{id}'"
        )))
    }
}

/// Locations of every input and output of the pipeline.
///
/// All paths hang off an explicit root; nothing is resolved against the
/// process working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    pub root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Saved HTML of the archive's branch index page.
    pub fn index_html(&self) -> PathBuf {
        self.join("index.txt")
    }

    /// Absolute branch view links extracted from the index.
    pub fn parent_links(&self) -> PathBuf {
        self.join("parent_links.txt")
    }

    /// Saved branch view pages, one `.txt` per branch.
    pub fn snapshots_dir(&self) -> PathBuf {
        self.join("snapshots")
    }

    /// One `links_<branch>.txt` per branch, in page order.
    pub fn links_dir(&self) -> PathBuf {
        self.join("index_full_links")
    }

    /// Branch link files after label ordering.
    pub fn reordered_links_dir(&self) -> PathBuf {
        self.join("index_full_links_reord")
    }

    pub fn master_index(&self) -> PathBuf {
        self.join("master_index.txt")
    }

    pub fn json_dir(&self) -> PathBuf {
        self.join("index_full_jsons")
    }

    pub fn md_dir(&self) -> PathBuf {
        self.join("index_full_mds")
    }

    pub fn missing_jsons(&self) -> PathBuf {
        self.join("missing_jsons.txt")
    }

    pub fn missing_mds(&self) -> PathBuf {
        self.join("missing_mds.txt")
    }

    /// Downloads worth retrying; read back by `download --source failed`.
    pub fn failed_downloads(&self) -> PathBuf {
        self.join("failed_downloads.txt")
    }

    /// Downloads that failed permanently (4xx, unreadable records).
    pub fn fatal_downloads(&self) -> PathBuf {
        self.join("fatal_downloads.txt")
    }

    pub fn missing_specific_ids(&self) -> PathBuf {
        self.join("missing_specific_ids.txt")
    }

    pub fn duplicates(&self) -> PathBuf {
        self.join("duplicates.txt")
    }

    pub fn bolding_issues(&self) -> PathBuf {
        self.join("bolding_issues.txt")
    }

    /// JSON path for a card ID.
    pub fn json_path(&self, id: &str) -> PathBuf {
        self.json_dir().join(format!("{id}.json"))
    }

    /// Markdown path for a card ID.
    pub fn md_path(&self, id: &str) -> PathBuf {
        self.md_dir().join(format!("{id}.txt"))
    }
}

impl Default for WorkspaceLayout {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Settings for downloading card records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub api_base_url: String,
    pub workers: usize,
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_base_url: API_BASE_URL.to_string(),
            workers: DEFAULT_WORKERS,
            retries: DEFAULT_RETRIES,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

impl FetchConfig {
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Reject settings that would make the download loop meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(HarvesterError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.retries == 0 {
            return Err(HarvesterError::InvalidConfig(
                "retries must be at least 1".to_string(),
            ));
        }
        if self.api_base_url.is_empty() {
            return Err(HarvesterError::InvalidConfig(
                "API base URL is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the record URL for a card ID.
    ///
    /// # Examples
    /// ```
    /// use zettel_harvester::config::FetchConfig;
    ///
    /// assert_eq!(
    ///     FetchConfig::default().card_url("ZK_1_NB_1-1_V"),
    ///     "https://v0.api.niklas-luhmann-archiv.de/ZK/zettel/ZK_1_NB_1-1_V"
    /// );
    /// ```
    pub fn card_url(&self, id: &str) -> String {
        crate::fetch::api_url(&self.api_base_url, id)
    }
}
