//! Reconciliation of fetched and converted cards against the master index.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::config::WorkspaceLayout;
use crate::error::Result;
use crate::fetch::card_id_from_url;
use crate::lines::read_lines;
use crate::reorder::list_files;

/// Card IDs of the master index, in index order.
pub fn master_ids(layout: &WorkspaceLayout) -> Result<Vec<String>> {
    Ok(read_lines(&layout.master_index())?
        .iter()
        .map(|link| card_id_from_url(link))
        .collect())
}

/// File stems of the files in `dir` with extension `ext`, sorted by name.
///
/// A missing directory yields no IDs.
pub fn ids_in_dir(dir: &Path, ext: &str) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    Ok(list_files(dir)?
        .iter()
        .filter(|p| p.extension().is_some_and(|e| e == ext))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
        .collect())
}

/// IDs of `expected` absent from `present`, in `expected` order.
///
/// # Examples
/// ```
/// use zettel_harvester::progress::missing_ids;
///
/// let master = vec!["a".to_string(), "b".to_string(), "c".to_string()];
/// let present = vec!["c".to_string(), "a".to_string()];
/// assert_eq!(missing_ids(&master, &present), vec!["b"]);
/// ```
pub fn missing_ids(expected: &[String], present: &[String]) -> Vec<String> {
    let present: HashSet<&str> = present.iter().map(String::as_str).collect();
    expected
        .iter()
        .filter(|id| !present.contains(id.as_str()))
        .cloned()
        .collect()
}

/// Card IDs occurring more than once among `links`, with their counts.
///
/// Links can differ and still name the same card, so IDs are compared,
/// not whole links. Result is in first-seen order.
pub fn find_duplicates(links: &[String]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order = Vec::new();
    for link in links {
        let id = card_id_from_url(link);
        let count = counts.entry(id.clone()).or_insert(0);
        if *count == 0 {
            order.push(id);
        }
        *count += 1;
    }
    order
        .into_iter()
        .filter_map(|id| {
            let count = counts.get(&id).copied().unwrap_or(0);
            (count > 1).then_some((id, count))
        })
        .collect()
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Download progress of the master index.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonProgress {
    pub total: usize,
    pub existing: usize,
    pub missing: Vec<String>,
}

impl JsonProgress {
    #[must_use]
    pub fn completion(&self) -> f64 {
        percentage(self.existing, self.total)
    }
}

/// Compare the master index with the saved records.
pub fn json_progress(layout: &WorkspaceLayout) -> Result<JsonProgress> {
    let ids = master_ids(layout)?;
    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !layout.json_path(id).exists())
        .cloned()
        .collect();
    Ok(JsonProgress {
        total: ids.len(),
        existing: ids.len() - missing.len(),
        missing,
    })
}

/// Conversion progress of the master index.
#[derive(Debug, Clone, PartialEq)]
pub struct MdProgress {
    pub total: usize,
    pub existing: usize,
    /// Record saved, Markdown missing: convertible now.
    pub missing_md: Vec<String>,
    /// Neither record nor Markdown: needs downloading first.
    pub missing_json: Vec<String>,
}

impl MdProgress {
    #[must_use]
    pub fn completion(&self) -> f64 {
        percentage(self.existing, self.total)
    }
}

/// Compare the master index with the saved records and Markdown files.
pub fn md_progress(layout: &WorkspaceLayout) -> Result<MdProgress> {
    let ids = master_ids(layout)?;
    let mut progress = MdProgress {
        total: ids.len(),
        existing: 0,
        missing_md: Vec::new(),
        missing_json: Vec::new(),
    };
    for id in ids {
        if layout.md_path(&id).exists() {
            progress.existing += 1;
        } else if layout.json_path(&id).exists() {
            progress.missing_md.push(id);
        } else {
            progress.missing_json.push(id);
        }
    }
    Ok(progress)
}
