//! Link extraction from the archive's branch index page.
//!
//! The index is a nested list; every `<a>` inside an `<li>` points at one
//! branch view, relative to [`BRANCHVIEW_BASE_URL`].

use std::fs;
use std::path::Path;

use markup5ever_rcdom::Handle;

use crate::config::BRANCHVIEW_BASE_URL;
use crate::error::{HarvesterError, Result};
use crate::html::{attribute, is_tag, parse_html};
use crate::lines::write_lines;

/// Collect the `href` of every link inside a list item, in document order.
///
/// Hrefs are returned as written, fragment included.
///
/// # Examples
/// ```
/// use zettel_harvester::links::extract_index_links;
///
/// let html = r##"<a href="#skip">x</a><ul><li><a href="#ZK_1_NB_1_1">1/1</a></li></ul>"##;
/// assert_eq!(extract_index_links(html), vec!["#ZK_1_NB_1_1"]);
/// ```
pub fn extract_index_links(html: &str) -> Vec<String> {
    let dom = parse_html(html);
    let mut links = Vec::new();
    walk(&dom.document, false, &mut links);
    links
}

fn walk(node: &Handle, in_li: bool, links: &mut Vec<String>) {
    for child in node.children.borrow().iter() {
        let child_in_li = in_li || is_tag(child, "li");
        if child_in_li && is_tag(child, "a") {
            if let Some(href) = attribute(child, "href") {
                links.push(href);
            }
        }
        walk(child, child_in_li, links);
    }
}

/// Prefix every href with the branch view base URL.
pub fn absolutize(base: &str, hrefs: &[String]) -> Vec<String> {
    hrefs.iter().map(|href| format!("{base}{href}")).collect()
}

/// Read the saved index page and write absolute branch links.
///
/// Returns the number of links written.
pub fn extract_links_file(index_html: &Path, output: &Path) -> Result<usize> {
    if !index_html.exists() {
        return Err(HarvesterError::MissingInput(index_html.to_path_buf()));
    }
    let html = fs::read_to_string(index_html)?;
    let hrefs = extract_index_links(&html);
    if hrefs.is_empty() {
        tracing::warn!(path = %index_html.display(), "No links found in index");
    }
    write_lines(output, absolutize(BRANCHVIEW_BASE_URL, &hrefs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const INDEX: &str = r##"
<nav><a href="/home">Home</a></nav>
<ul>
  <li><a href="#ZK_1_NB_1_1">1/1 Allgemeines</a>
    <ul>
      <li><a href="#ZK_1_NB_1-2">1/2</a></li>
    </ul>
  </li>
  <li>Kein Link</li>
  <li><a href="#ZK_1_NB_2_1">2/1</a></li>
</ul>
<p><a href="/impressum">Impressum</a></p>
"##;

    #[test]
    fn test_only_list_links_in_order() {
        assert_eq!(
            extract_index_links(INDEX),
            vec!["#ZK_1_NB_1_1", "#ZK_1_NB_1-2", "#ZK_1_NB_2_1"]
        );
    }

    #[test]
    fn test_absolutize_keeps_fragment() {
        assert_eq!(
            absolutize(BRANCHVIEW_BASE_URL, &["#ZK_1_NB_1_1".to_string()]),
            vec!["https://assets.niklas-luhmann-archiv.de/branchview#ZK_1_NB_1_1"]
        );
    }

    #[test]
    fn test_extract_links_file() {
        let dir = TempDir::new().unwrap();
        let index = dir.path().join("index.txt");
        let output = dir.path().join("parent_links.txt");
        fs::write(&index, INDEX).unwrap();

        assert_eq!(extract_links_file(&index, &output).unwrap(), 3);
        let written = fs::read_to_string(&output).unwrap();
        assert!(written.starts_with(
            "https://assets.niklas-luhmann-archiv.de/branchview#ZK_1_NB_1_1\n"
        ));
    }
}
