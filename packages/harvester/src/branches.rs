//! Card links from saved branch view pages.
//!
//! Each branch view renders its cards as one SVG graph whose nodes link to
//! the card pages. Snapshots with several SVGs are ambiguous and are
//! reported instead of guessed at.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::error::{HarvesterError, Result};
use crate::lines::write_lines;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SVG_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<svg.*?</svg>").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HREF_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)(?:xlink:)?href=(?:"(.*?)"|'(.*?)')"#).expect("valid regex")
});

/// All `<svg>...</svg>` spans in a page.
pub fn find_svg_elements(content: &str) -> Vec<&str> {
    SVG_ELEMENT.find_iter(content).map(|m| m.as_str()).collect()
}

/// `href` and `xlink:href` values, deduplicated in first-seen order.
///
/// # Examples
/// ```
/// use zettel_harvester::branches::extract_href_links;
///
/// let svg = r#"<svg><a xlink:href="/z/1"/><a href='/z/2'/><a href="/z/1"/></svg>"#;
/// assert_eq!(extract_href_links(svg), vec!["/z/1", "/z/2"]);
/// ```
pub fn extract_href_links(svg: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    HREF_ATTRIBUTE
        .captures_iter(svg)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Result of scanning a snapshot directory.
#[derive(Debug, Default)]
pub struct BranchScan {
    /// Snapshot file name and its card links, for single-SVG snapshots.
    pub branches: Vec<(String, Vec<String>)>,

    /// Snapshot file name and SVG count, for snapshots with more than one.
    pub anomalies: Vec<(String, usize)>,
}

/// Scan every `.txt` snapshot directly inside `dir`, in file name order.
pub fn scan_snapshots(dir: &Path) -> Result<BranchScan> {
    if !dir.is_dir() {
        return Err(HarvesterError::MissingInput(dir.to_path_buf()));
    }

    let mut scan = BranchScan::default();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| HarvesterError::Io(e.into()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "txt") {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Unreadable snapshot");
                continue;
            }
        };

        let svgs = find_svg_elements(&content);
        match svgs.len() {
            0 => tracing::debug!(file = %name, "No SVG in snapshot"),
            1 => {
                let links = extract_href_links(svgs[0]);
                if !links.is_empty() {
                    scan.branches.push((name, links));
                }
            }
            n => {
                tracing::warn!(file = %name, svg_count = n, "Ambiguous snapshot");
                scan.anomalies.push((name, n));
            }
        }
    }
    Ok(scan)
}

/// Write `links_<snapshot name>` for each branch; returns the paths written.
pub fn write_branch_links(scan: &BranchScan, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::with_capacity(scan.branches.len());
    for (name, links) in &scan.branches {
        let path = out_dir.join(format!("links_{name}"));
        write_lines(&path, links)?;
        written.push(path);
    }
    Ok(written)
}
