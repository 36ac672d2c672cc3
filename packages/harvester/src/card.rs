//! Card records as served by the archive API.
//!
//! Only the transcription is modelled; every other field of the record is
//! ignored on parse and preserved verbatim in the saved JSON file.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// A single Zettelkasten card record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub transcription: Option<Transcription>,
}

/// Transcription of the card's handwriting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    #[serde(default)]
    pub html: Option<String>,

    /// Editorial flag; unpublished transcriptions are not converted.
    #[serde(default)]
    pub ready_for_publication: bool,
}

impl Card {
    /// Parse a card from its JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a card from a saved record file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// The transcription HTML, if the card has one that is ready.
    #[must_use]
    pub fn publishable_html(&self) -> Option<&str> {
        self.transcription
            .as_ref()
            .filter(|t| t.ready_for_publication)
            .and_then(|t| t.html.as_deref())
    }
}
