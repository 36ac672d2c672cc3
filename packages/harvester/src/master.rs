//! Master index: every card link once, in archive order.
//!
//! Branch link files are concatenated in the order of the branch label in
//! their file name (`links_ZK_1_NB_<label>.txt`), then deduplicated keeping
//! the first occurrence.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::WorkspaceLayout;
use crate::error::Result;
use crate::label::{order_items_by, LabelPattern, CARD_PREFIX};
use crate::lines::{read_lines, write_lines};
use crate::reorder::list_files;

/// Pattern locating the branch label inside a link file name.
#[must_use]
pub fn link_file_pattern() -> LabelPattern {
    LabelPattern::new(format!("links_{CARD_PREFIX}"), ".txt")
}

/// Link files of `dir` in branch order.
pub fn ordered_link_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let files: Vec<PathBuf> = list_files(dir)?
        .into_iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    Ok(order_items_by(files, &link_file_pattern(), |p| {
        p.file_name().and_then(|n| n.to_str()).unwrap_or_default()
    }))
}

/// Concatenate the link files of `dir` in branch order, without duplicates.
pub fn build_master_index(dir: &Path) -> Result<Vec<String>> {
    let files = ordered_link_files(dir)?;
    tracing::info!(files = files.len(), "Building master index");

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for file in &files {
        for link in read_lines(file)? {
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }
    Ok(links)
}

/// What [`write_master_index`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterIndexOutcome {
    /// A new index with this many links was written.
    Written(usize),
    /// An index already existed and regeneration was not requested.
    Kept,
}

/// Write the master index from the reordered link files.
pub fn write_master_index(layout: &WorkspaceLayout, regenerate: bool) -> Result<MasterIndexOutcome> {
    let path = layout.master_index();
    if path.exists() && !regenerate {
        tracing::info!(path = %path.display(), "Master index exists, keeping it");
        return Ok(MasterIndexOutcome::Kept);
    }
    let links = build_master_index(&layout.reordered_links_dir())?;
    let count = write_lines(&path, &links)?;
    Ok(MasterIndexOutcome::Written(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_link_files_in_branch_order() {
        let dir = TempDir::new().unwrap();
        for name in [
            "links_ZK_1_NB_1-12.txt",
            "links_ZK_1_NB_1-2.txt",
            "links_ZK_1_NB_1_1.txt",
            "links_ZK_1_NB_1-5.txt",
            "notes.md",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        assert_eq!(
            names(&ordered_link_files(dir.path()).unwrap()),
            vec![
                "links_ZK_1_NB_1_1.txt",
                "links_ZK_1_NB_1-2.txt",
                "links_ZK_1_NB_1-5.txt",
                "links_ZK_1_NB_1-12.txt",
            ]
        );
    }

    #[test]
    fn test_master_index_dedupes_keeping_first() {
        let dir = TempDir::new().unwrap();
        let layout = WorkspaceLayout::new(dir.path());
        let links_dir = layout.reordered_links_dir();
        fs::create_dir_all(&links_dir).unwrap();
        fs::write(links_dir.join("links_ZK_1_NB_1-2.txt"), "c\nb\n").unwrap();
        fs::write(links_dir.join("links_ZK_1_NB_1_1.txt"), "a\nb\n").unwrap();

        assert_eq!(
            write_master_index(&layout, false).unwrap(),
            MasterIndexOutcome::Written(3)
        );
        assert_eq!(
            fs::read_to_string(layout.master_index()).unwrap(),
            "a\nb\nc\n"
        );

        assert_eq!(
            write_master_index(&layout, false).unwrap(),
            MasterIndexOutcome::Kept
        );
        fs::write(links_dir.join("links_ZK_1_NB_1-3.txt"), "d\n").unwrap();
        assert_eq!(
            write_master_index(&layout, true).unwrap(),
            MasterIndexOutcome::Written(4)
        );
    }
}
