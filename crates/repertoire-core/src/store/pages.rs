use rusqlite::params;

use crate::error::Result;
use crate::model::{PageId, ScrapedPage};

use super::db::Database;

impl Database {
    // ========== Scraped Page Operations ==========

    /// Record a fetched page, returning it with its identifier.
    ///
    /// URLs are unique: saving a URL twice fails with a database error, so
    /// callers check [`Database::page_already_scraped`] first.
    pub fn save_scraped_page(&self, mut page: ScrapedPage) -> Result<ScrapedPage> {
        self.conn.execute(
            "INSERT INTO scraped_pages (url, rubric, letter, page_number, scraped_at,
                                        raw_content, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                page.url,
                page.rubric,
                page.letter,
                page.page_number,
                page.scraped_at.to_rfc3339(),
                page.raw_content,
                page.notes,
            ],
        )?;
        page.id = Some(PageId::new(self.conn.last_insert_rowid()));
        log::debug!("Saved scraped page {}", page.url);
        Ok(page)
    }

    /// Whether a page with exactly this URL has been recorded.
    pub fn page_already_scraped(&self, url: &str) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM scraped_pages WHERE url = ?1)",
            [url],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}
