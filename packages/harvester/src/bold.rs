//! Bolding of the first word of converted cards, and its quality check.
//!
//! Card text opens with a keyword. After conversion that keyword should be
//! wrapped as `**keyword**` on the first non-empty line.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::MAX_FIRST_WORD_LEN;
use crate::error::Result;
use crate::reorder::list_files;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DOUBLE_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*\*\*([^*]+)\*\*\*\*").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BOLD_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*[^*]+\*\*").expect("valid regex"));

/// Index of the first line with non-whitespace content.
fn first_content_line(lines: &[&str]) -> Option<usize> {
    lines.iter().position(|line| !line.trim().is_empty())
}

/// Replace the first non-empty line of `content` with `f(line)`.
fn rewrite_first_line(content: &str, f: impl FnOnce(&str) -> String) -> Option<String> {
    let lines: Vec<&str> = content.split('\n').collect();
    let idx = first_content_line(&lines)?;
    let replaced = f(lines[idx]);
    let rewritten: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| if i == idx { replaced.as_str() } else { *line })
        .collect();
    Some(rewritten.join("\n"))
}

/// Collapse `****text****` at the start of the first non-empty line to
/// `**text**`. `None` when there is nothing to fix.
///
/// # Examples
/// ```
/// use zettel_harvester::bold::fix_double_bold;
///
/// assert_eq!(
///     fix_double_bold("****Begriff**** der Form").as_deref(),
///     Some("**Begriff** der Form")
/// );
/// assert_eq!(fix_double_bold("**Begriff** der Form"), None);
/// ```
pub fn fix_double_bold(content: &str) -> Option<String> {
    let lines: Vec<&str> = content.split('\n').collect();
    let first = lines[first_content_line(&lines)?];
    let caps = DOUBLE_BOLD.captures(first)?;
    let whole = caps.get(0)?;
    let inner = caps.get(1)?.as_str().to_string();
    let rest_start = whole.end();
    rewrite_first_line(content, |line| format!("**{inner}**{}", &line[rest_start..]))
}

/// Check whether the first non-empty line opens with `**text**`.
///
/// Content without any text counts as bolded, so it is left alone.
pub fn is_bolded(content: &str) -> bool {
    let lines: Vec<&str> = content.split('\n').collect();
    match first_content_line(&lines) {
        Some(idx) => BOLD_START.is_match(lines[idx]),
        None => true,
    }
}

/// Result of trying to bold the first word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoldOutcome {
    /// No text at all.
    Empty,

    AlreadyBolded,

    /// First word longer than [`MAX_FIRST_WORD_LEN`] characters; most likely
    /// not a keyword.
    TooLong,

    /// The rewritten content.
    Bolded(String),
}

/// Wrap the first word of the first non-empty line in `**`.
///
/// The word ends at the first space or `[` (the start of a link).
///
/// # Examples
/// ```
/// use zettel_harvester::bold::{bold_first_word, BoldOutcome};
///
/// assert_eq!(
///     bold_first_word("\nSinn[1](x) ist"),
///     BoldOutcome::Bolded("\n**Sinn**[1](x) ist".to_string())
/// );
/// ```
pub fn bold_first_word(content: &str) -> BoldOutcome {
    if content.trim().is_empty() {
        return BoldOutcome::Empty;
    }
    if is_bolded(content) {
        return BoldOutcome::AlreadyBolded;
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let Some(idx) = first_content_line(&lines) else {
        return BoldOutcome::Empty;
    };
    let line = lines[idx];
    let end = line.find([' ', '[']).unwrap_or(line.len());
    if line[..end].chars().count() > MAX_FIRST_WORD_LEN {
        return BoldOutcome::TooLong;
    }

    match rewrite_first_line(content, |line| format!("**{}**{}", &line[..end], &line[end..])) {
        Some(bolded) => BoldOutcome::Bolded(bolded),
        None => BoldOutcome::Empty,
    }
}

/// Tally of a bolding run over a directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BoldReport {
    pub fixed_double: usize,
    pub already_bolded: usize,
    pub bolded: usize,
    pub empty: usize,
    pub too_long: Vec<PathBuf>,
}

fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(list_files(dir)?
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == "txt"))
        .collect())
}

/// Fix double bolding, then bold the first word, of every `.txt` in `dir`.
pub fn bold_dir(dir: &Path) -> Result<BoldReport> {
    let files = markdown_files(dir)?;
    let mut report = BoldReport::default();

    for path in &files {
        let content = fs::read_to_string(path)?;
        if let Some(fixed) = fix_double_bold(&content) {
            tracing::debug!(path = %path.display(), "Fixed double bolding");
            fs::write(path, fixed)?;
            report.fixed_double += 1;
        }
    }

    for path in &files {
        let content = fs::read_to_string(path)?;
        match bold_first_word(&content) {
            BoldOutcome::Empty => report.empty += 1,
            BoldOutcome::AlreadyBolded => report.already_bolded += 1,
            BoldOutcome::TooLong => {
                tracing::debug!(path = %path.display(), "First word too long");
                report.too_long.push(path.clone());
            }
            BoldOutcome::Bolded(bolded) => {
                fs::write(path, bolded)?;
                report.bolded += 1;
            }
        }
    }

    tracing::info!(
        files = files.len(),
        fixed_double = report.fixed_double,
        bolded = report.bolded,
        already_bolded = report.already_bolded,
        too_long = report.too_long.len(),
        "Bolding finished"
    );
    Ok(report)
}

/// Number of `*` at the start of the first non-empty line.
fn leading_asterisks(content: &str) -> usize {
    content
        .split('\n')
        .find(|line| !line.trim().is_empty())
        .map_or(0, |line| line.chars().take_while(|&c| c == '*').count())
}

/// Bolding state of a directory of Markdown files.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QualityReport {
    pub total: usize,
    /// Leading asterisk count -> number of files.
    pub distribution: BTreeMap<usize, usize>,
    /// Files not opening with exactly `**text**`, empty ones included.
    pub issues: Vec<PathBuf>,
}

/// Check that every `.txt` in `dir` opens with a properly bolded word.
pub fn check_quality(dir: &Path) -> Result<QualityReport> {
    let files = markdown_files(dir)?;
    let mut report = QualityReport {
        total: files.len(),
        ..QualityReport::default()
    };

    for path in files {
        let content = fs::read_to_string(&path)?;
        let stars = leading_asterisks(&content);
        *report.distribution.entry(stars).or_insert(0) += 1;

        let proper = !content.trim().is_empty() && stars == 2 && is_bolded(&content);
        if !proper {
            report.issues.push(path);
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_fix_double_bold_on_first_content_line() {
        assert_eq!(
            fix_double_bold("\n\n****Sinn**** ist\nmehr").as_deref(),
            Some("\n\n**Sinn** ist\nmehr")
        );
        assert_eq!(fix_double_bold(""), None);
        assert_eq!(fix_double_bold("Text ****x****"), None);
    }

    #[test]
    fn test_is_bolded() {
        assert!(is_bolded("**Sinn** ist"));
        assert!(is_bolded("  \n\n"));
        assert!(!is_bolded("Sinn ist"));
        assert!(!is_bolded("****Sinn****"));
    }

    #[test]
    fn test_bold_first_word() {
        assert_eq!(
            bold_first_word("Sinn ist\nmehr"),
            BoldOutcome::Bolded("**Sinn** ist\nmehr".to_string())
        );
        assert_eq!(
            bold_first_word("Einzelwort"),
            BoldOutcome::Bolded("**Einzelwort**".to_string())
        );
        assert_eq!(bold_first_word("**Sinn** ist"), BoldOutcome::AlreadyBolded);
        assert_eq!(bold_first_word("   "), BoldOutcome::Empty);
    }

    #[test]
    fn test_bold_first_word_length_limit() {
        let exactly = "a".repeat(MAX_FIRST_WORD_LEN);
        assert!(matches!(bold_first_word(&exactly), BoldOutcome::Bolded(_)));
        let over = "a".repeat(MAX_FIRST_WORD_LEN + 1);
        assert_eq!(bold_first_word(&format!("{over} rest")), BoldOutcome::TooLong);
    }

    #[test]
    fn test_word_length_counts_characters() {
        // 20 umlauts are 40 bytes but still a short word.
        let word = "ü".repeat(MAX_FIRST_WORD_LEN);
        assert!(matches!(bold_first_word(&word), BoldOutcome::Bolded(_)));
    }

    #[test]
    fn test_bold_dir_and_quality() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "****Sinn**** ist").unwrap();
        fs::write(dir.path().join("b.txt"), "Form und Medium").unwrap();
        fs::write(dir.path().join("c.txt"), "Gesellschaftsdifferenzierung ist").unwrap();
        fs::write(dir.path().join("d.txt"), "").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let before = check_quality(dir.path()).unwrap();
        assert_eq!(before.total, 4);
        assert_eq!(before.distribution.get(&4), Some(&1));
        assert_eq!(before.issues.len(), 4);

        let report = bold_dir(dir.path()).unwrap();
        assert_eq!(report.fixed_double, 1);
        assert_eq!(report.already_bolded, 1);
        assert_eq!(report.bolded, 1);
        assert_eq!(report.empty, 1);
        assert_eq!(report.too_long, vec![dir.path().join("c.txt")]);

        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "**Sinn** ist");
        assert_eq!(
            fs::read_to_string(dir.path().join("b.txt")).unwrap(),
            "**Form** und Medium"
        );

        let after = check_quality(dir.path()).unwrap();
        assert_eq!(after.distribution.get(&2), Some(&2));
        assert_eq!(
            after.issues,
            vec![dir.path().join("c.txt"), dir.path().join("d.txt")]
        );
    }
}
