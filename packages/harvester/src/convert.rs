//! Conversion of saved card records into Markdown files.

use std::fs;
use std::path::Path;

use indicatif::ProgressBar;

use crate::card::Card;
use crate::config::WorkspaceLayout;
use crate::error::Result;
use crate::markdown::html_to_markdown;

/// Convert one saved record. `Ok(None)` when the card has no publishable
/// transcription.
pub fn convert_card(json_path: &Path) -> Result<Option<String>> {
    let card = Card::load(json_path)?;
    Ok(card.publishable_html().map(html_to_markdown))
}

/// Tally of a conversion run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConvertReport {
    pub converted: usize,
    /// Markdown already present and left untouched.
    pub skipped: usize,
    /// Record present but transcription missing or unpublished.
    pub not_ready: Vec<String>,
    /// No saved record for the ID.
    pub missing_json: Vec<String>,
    /// Record unreadable, or the Markdown could not be written.
    pub failed: Vec<(String, String)>,
}

/// Convert the records of `ids`, writing `<id>.txt` into the Markdown dir.
///
/// With `skip_existing`, IDs that already have a Markdown file are counted
/// as skipped instead of being converted again.
pub fn convert_all(
    layout: &WorkspaceLayout,
    ids: &[String],
    skip_existing: bool,
    progress: &ProgressBar,
) -> Result<ConvertReport> {
    fs::create_dir_all(layout.md_dir())?;
    let mut report = ConvertReport::default();

    for id in ids {
        progress.inc(1);
        let md_path = layout.md_path(id);
        if skip_existing && md_path.exists() {
            report.skipped += 1;
            continue;
        }

        let json_path = layout.json_path(id);
        if !json_path.exists() {
            tracing::warn!(id = %id, "No saved record");
            report.missing_json.push(id.clone());
            continue;
        }

        match convert_card(&json_path) {
            Ok(Some(markdown)) => match fs::write(&md_path, markdown) {
                Ok(()) => report.converted += 1,
                Err(e) => report.failed.push((id.clone(), e.to_string())),
            },
            Ok(None) => {
                tracing::debug!(id = %id, "Transcription missing or not ready");
                report.not_ready.push(id.clone());
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Conversion failed");
                report.failed.push((id.clone(), e.to_string()));
            }
        }
    }

    tracing::info!(
        converted = report.converted,
        skipped = report.skipped,
        not_ready = report.not_ready.len(),
        missing_json = report.missing_json.len(),
        failed = report.failed.len(),
        "Conversion finished"
    );
    Ok(report)
}
