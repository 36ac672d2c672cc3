//! Label ordering of branch link files.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{HarvesterError, Result};
use crate::label::order;
use crate::lines::{read_lines, write_lines};

/// Regular files directly inside `dir`, sorted by file name.
pub(crate) fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(HarvesterError::MissingInput(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| HarvesterError::Io(e.into()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Order the links of one file into archive order.
///
/// Returns the number of links written.
pub fn reorder_file(input: &Path, output: &Path) -> Result<usize> {
    let links = order(read_lines(input)?);
    write_lines(output, &links)
}

/// Reorder every file of `input_dir` into a same-named file in `output_dir`.
///
/// Returns `(file name, link count)` per file, in file name order.
pub fn reorder_dir(input_dir: &Path, output_dir: &Path) -> Result<Vec<(String, usize)>> {
    fs::create_dir_all(output_dir)?;
    let mut processed = Vec::new();

    for input in list_files(input_dir)? {
        let Some(name) = input.file_name() else {
            continue;
        };
        let count = reorder_file(&input, &output_dir.join(name))?;
        let name = name.to_string_lossy().to_string();
        tracing::info!(file = %name, links = count, "Reordered");
        processed.push((name, count));
    }

    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const BASE: &str = "https://niklas-luhmann-archiv.de/bestand/zettelkasten/zettel/";

    #[test]
    fn test_reorder_dir() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        fs::create_dir_all(&input).unwrap();
        fs::write(
            input.join("links_ZK_1_NB_1-5.txt"),
            format!("{BASE}ZK_1_NB_1-5A1c_V\n\n{BASE}ZK_1_NB_1-5_V\n{BASE}ZK_1_NB_1-5A_V\n"),
        )
        .unwrap();

        let processed = reorder_dir(&input, &output).unwrap();
        assert_eq!(processed, vec![("links_ZK_1_NB_1-5.txt".to_string(), 3)]);
        assert_eq!(
            fs::read_to_string(output.join("links_ZK_1_NB_1-5.txt")).unwrap(),
            format!("{BASE}ZK_1_NB_1-5_V\n{BASE}ZK_1_NB_1-5A_V\n{BASE}ZK_1_NB_1-5A1c_V\n")
        );
    }

    #[test]
    fn test_reorder_missing_dir() {
        let dir = TempDir::new().unwrap();
        let err = reorder_dir(&dir.path().join("absent"), &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, HarvesterError::MissingInput(_)));
    }
}
