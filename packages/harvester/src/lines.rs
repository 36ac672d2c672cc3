//! Line-delimited identifier lists.
//!
//! Every list the pipeline persists (links, IDs, failures) is UTF-8 text with
//! one entry per line and a trailing newline.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{HarvesterError, Result};

/// Read a list file: lines trimmed, blank lines dropped.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(HarvesterError::MissingInput(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    Ok(parse_lines(&content))
}

/// Read an ID list, additionally skipping `#` comment lines.
pub fn read_id_list(path: &Path) -> Result<Vec<String>> {
    Ok(read_lines(path)?
        .into_iter()
        .filter(|line| !line.starts_with('#'))
        .collect())
}

fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Write one item per line, newline terminated.
///
/// Creates the parent directory when it does not exist yet.
pub fn write_lines<I, S>(path: &Path, items: I) -> Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    write_with_header(path, None, items)
}

/// Like [`write_lines`], with a `#` comment line and a blank line first.
pub fn write_lines_with_header<I, S>(path: &Path, header: &str, items: I) -> Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    write_with_header(path, Some(header), items)
}

fn write_with_header<I, S>(path: &Path, header: Option<&str>, items: I) -> Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(fs::File::create(path)?);
    if let Some(header) = header {
        writeln!(writer, "# {header}")?;
        writeln!(writer)?;
    }
    let mut count = 0;
    for item in items {
        writeln!(writer, "{}", item.as_ref())?;
        count += 1;
    }
    writer.flush()?;
    tracing::debug!(path = %path.display(), count, "Wrote list");
    Ok(count)
}
