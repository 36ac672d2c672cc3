//! Transcription HTML to Markdown conversion.
//!
//! Covers the markup that occurs in card transcriptions (paragraphs, line
//! breaks, emphasis, underlines, links, lists, simple tables). Anything else
//! contributes its text only. Lines are never wrapped.

use std::sync::LazyLock;

use markup5ever_rcdom::{Handle, NodeData};
use regex::Regex;

use crate::config::SITE_BASE_URL;
use crate::html::{attribute, class_contains, parse_html, tag_name};

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Convert an HTML transcription to Markdown.
///
/// # Examples
/// ```
/// use zettel_harvester::markdown::html_to_markdown;
///
/// assert_eq!(
///     html_to_markdown("<p>Hello <strong>world</strong></p><p>Again</p>"),
///     "Hello **world**\n\nAgain"
/// );
/// ```
pub fn html_to_markdown(html: &str) -> String {
    let dom = parse_html(html);
    let mut writer = MarkdownWriter::default();
    writer.walk_children(&dom.document);
    finish(&writer.out)
}

/// Make archive-relative links absolute.
///
/// # Examples
/// ```
/// use zettel_harvester::markdown::absolutize_href;
///
/// assert_eq!(
///     absolutize_href("/bestand/zettelkasten/zettel/ZK_1_NB_1_1_V"),
///     "https://niklas-luhmann-archiv.de/bestand/zettelkasten/zettel/ZK_1_NB_1_1_V"
/// );
/// assert_eq!(absolutize_href("https://example.org"), "https://example.org");
/// ```
pub fn absolutize_href(href: &str) -> String {
    if href.starts_with("/bestand") {
        format!("{SITE_BASE_URL}{href}")
    } else {
        href.to_string()
    }
}

#[derive(Default)]
struct MarkdownWriter {
    out: String,
    /// `None` for bullet lists, `Some(next number)` for ordered lists.
    lists: Vec<Option<usize>>,
}

impl MarkdownWriter {
    fn walk_children(&mut self, node: &Handle) {
        for child in node.children.borrow().iter() {
            self.walk(child);
        }
    }

    fn walk(&mut self, node: &Handle) {
        match &node.data {
            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                self.push_text(&text);
            }
            NodeData::Element { .. } => self.element(node),
            NodeData::Document => self.walk_children(node),
            _ => {}
        }
    }

    fn element(&mut self, node: &Handle) {
        let tag = tag_name(node).unwrap_or_default();
        match tag.as_str() {
            "head" | "script" | "style" | "title" | "img" => {}
            "br" => self.out.push('\n'),
            "p" | "div" | "section" | "article" => {
                self.blank_line();
                self.walk_children(node);
                self.blank_line();
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse::<usize>().unwrap_or(1);
                self.blank_line();
                self.out.push_str(&"#".repeat(level));
                self.out.push(' ');
                self.walk_children(node);
                self.blank_line();
            }
            "strong" | "b" => self.wrapped(node, "**"),
            "em" | "i" => self.wrapped(node, "_"),
            "u" => self.wrapped(node, "__"),
            "span" if class_contains(node, "underline") => self.wrapped(node, "__"),
            "a" => self.link(node),
            "ul" | "ol" => {
                self.blank_line();
                self.lists.push((tag == "ol").then_some(1));
                self.walk_children(node);
                self.lists.pop();
                self.blank_line();
            }
            "li" => self.list_item(node),
            "table" => {
                self.blank_line();
                self.walk_children(node);
                self.blank_line();
            }
            "tr" => {
                self.line_break();
                self.walk_children(node);
                self.line_break();
            }
            "td" | "th" => {
                if !(self.out.is_empty() || self.out.ends_with('\n')) {
                    self.out.push_str(" | ");
                }
                self.walk_children(node);
            }
            "blockquote" => {
                self.blank_line();
                let start = self.out.len();
                self.walk_children(node);
                let inner = self.out.split_off(start);
                let quoted: Vec<String> = inner
                    .trim()
                    .lines()
                    .map(|line| format!("> {line}").trim_end().to_string())
                    .collect();
                self.out.push_str(&quoted.join("\n"));
                self.blank_line();
            }
            _ => self.walk_children(node),
        }
    }

    /// Collapse whitespace runs the way a browser renders inline text.
    fn push_text(&mut self, text: &str) {
        let at_line_start = self.out.is_empty() || self.out.ends_with(char::is_whitespace);
        let words: Vec<&str> = text.split_whitespace().collect();

        if words.is_empty() {
            if !text.is_empty() && !at_line_start {
                self.out.push(' ');
            }
            return;
        }

        if text.starts_with(char::is_whitespace) && !at_line_start {
            self.out.push(' ');
        }
        self.out.push_str(&words.join(" "));
        if text.ends_with(char::is_whitespace) {
            self.out.push(' ');
        }
    }

    /// Render children and surround them with `marker`, keeping surrounding
    /// whitespace outside the markers. Empty content gets no markers.
    fn wrapped(&mut self, node: &Handle, marker: &str) {
        let start = self.out.len();
        self.walk_children(node);
        let inner = self.out.split_off(start);
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            self.out.push_str(&inner);
            return;
        }
        if inner.starts_with(char::is_whitespace) {
            self.out.push(' ');
        }
        self.out.push_str(marker);
        self.out.push_str(trimmed);
        self.out.push_str(marker);
        if inner.ends_with(char::is_whitespace) {
            self.out.push(' ');
        }
    }

    fn link(&mut self, node: &Handle) {
        let start = self.out.len();
        self.walk_children(node);
        let inner = self.out.split_off(start);
        let text = inner.trim();

        match attribute(node, "href").filter(|h| !h.is_empty()) {
            Some(href) if !text.is_empty() => {
                if inner.starts_with(char::is_whitespace) {
                    self.out.push(' ');
                }
                self.out.push('[');
                self.out.push_str(text);
                self.out.push_str("](");
                self.out.push_str(&absolutize_href(&href));
                self.out.push(')');
                if inner.ends_with(char::is_whitespace) {
                    self.out.push(' ');
                }
            }
            _ => self.out.push_str(&inner),
        }
    }

    fn list_item(&mut self, node: &Handle) {
        self.line_break();
        let depth = self.lists.len().saturating_sub(1);
        self.out.push_str(&"  ".repeat(depth));
        match self.lists.last_mut() {
            Some(Some(n)) => {
                self.out.push_str(&format!("{n}. "));
                *n += 1;
            }
            _ => self.out.push_str("* "),
        }
        self.walk_children(node);
    }

    fn line_break(&mut self) {
        if !(self.out.is_empty() || self.out.ends_with('\n')) {
            self.out.push('\n');
        }
    }

    fn blank_line(&mut self) {
        if self.out.is_empty() || self.out.ends_with("\n\n") {
            return;
        }
        if self.out.ends_with('\n') {
            self.out.push('\n');
        } else {
            self.out.push_str("\n\n");
        }
    }
}

/// Strip trailing spaces per line, collapse blank runs, trim the result.
fn finish(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().map(str::trim_end).collect();
    let joined = lines.join("\n");
    EXCESS_NEWLINES
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}
