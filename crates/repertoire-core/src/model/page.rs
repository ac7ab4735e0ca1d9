use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::PageId;

/// Provenance record for a fetched web page.
///
/// The URL is unique; its presence is what stops a page from being fetched
/// twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub id: Option<PageId>,
    pub url: String,

    /// Site category the page belongs to (e.g., "portretten").
    pub rubric: String,

    /// Alphabetic shard the page was picked from.
    pub letter: Option<String>,

    pub page_number: Option<u32>,
    pub scraped_at: DateTime<Utc>,

    /// Raw captured content (HTML).
    pub raw_content: Option<String>,
    pub notes: Option<String>,
}

impl ScrapedPage {
    #[must_use]
    pub fn new(url: impl Into<String>, rubric: impl Into<String>) -> Self {
        Self {
            id: None,
            url: url.into(),
            rubric: rubric.into(),
            letter: None,
            page_number: None,
            scraped_at: Utc::now(),
            raw_content: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn with_letter(mut self, letter: impl Into<String>) -> Self {
        self.letter = Some(letter.into());
        self
    }

    #[must_use]
    pub fn with_page_number(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    #[must_use]
    pub fn with_raw_content(mut self, content: impl Into<String>) -> Self {
        self.raw_content = Some(content.into());
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
