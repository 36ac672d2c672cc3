//! Zettel Harvester - Collect the Luhmann card archive into ordered Markdown.
//!
//! Card links are gathered from the branch index and branch view snapshots,
//! put into archive order, merged into a master index, downloaded as JSON
//! records and converted to Markdown whose first word is bolded.
//!
//! # Example
//!
//! ```
//! use zettel_harvester::label::{extract_label, order};
//!
//! assert_eq!(extract_label("https://x/zettel/ZK_1_NB_1-5a_V"), "1-5a");
//! assert_eq!(order(vec!["1-10", "1-2", "1-2a", "1-1"]), vec!["1-1", "1-2", "1-2a", "1-10"]);
//! ```
//!
//! # Architecture
//!
//! - [`label`]: Card label tokenizing and archive ordering
//! - [`config`]: Constants, workspace layout and fetch settings
//! - [`error`]: Error types and Result alias
//! - [`lines`]: Line-delimited list files
//! - [`html`]: html5ever DOM helpers
//! - [`links`]: Branch links from the index page
//! - [`branches`]: Card links from branch view snapshots
//! - [`reorder`]: Ordering of branch link files
//! - [`master`]: Master index assembly
//! - [`http`]: HTTP client with retries
//! - [`fetch`]: Concurrent card record download
//! - [`card`]: Card record model
//! - [`markdown`]: Transcription HTML to Markdown
//! - [`convert`]: Record to Markdown conversion
//! - [`progress`]: Progress and duplicate reports
//! - [`bold`]: First-word bolding and its quality check
//! - [`cli`]: Command-line interface

pub mod bold;
pub mod branches;
pub mod card;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod html;
pub mod http;
pub mod label;
pub mod lines;
pub mod links;
pub mod markdown;
pub mod master;
pub mod progress;
pub mod reorder;

// Re-export the ordering core
pub use label::{compare, extract_label, order, order_by, tokenize, LabelPattern, Token, TokenSequence};

// Re-export commonly used items
pub use config::{FetchConfig, WorkspaceLayout};
pub use error::{HarvesterError, Result};
