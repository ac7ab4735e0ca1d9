//! Scrape runs: pick pages, fetch the ones not seen before, record them.

use repertoire_core::{Database, ScrapedPage};

use crate::error::EtlResult;
use crate::scrape::{Rubric, ScrapeTarget, Scraper};

/// Number of paragraphs previewed per fetched page.
pub const PREVIEW_PARAGRAPHS: usize = 3;

/// Previews longer than this many characters are cut and suffixed with "...".
pub const PREVIEW_CHARS: usize = 100;

/// What happened to one page of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Fetched {
        paragraphs: usize,
        preview: Vec<String>,
    },
    /// The URL was already recorded; nothing was fetched.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub page_number: u32,
    pub url: String,
    pub status: PageStatus,
}

/// Result of a scrape run, one outcome per requested page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeReport {
    pub pages: Vec<PageOutcome>,
}

impl ScrapeReport {
    pub fn fetched(&self) -> usize {
        self.count(|s| matches!(s, PageStatus::Fetched { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, PageStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, PageStatus::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&PageStatus) -> bool) -> usize {
        self.pages.iter().filter(|p| pred(&p.status)).count()
    }
}

/// Scrape `pages` random-letter pages of `rubric`.
///
/// A page whose URL is already recorded is skipped without fetching. A fetch
/// failure is logged and recorded in the report; the run continues. Only
/// store failures abort the run.
pub async fn scrape_pages(
    scraper: &Scraper,
    db: &Database,
    rubric: Rubric,
    pages: u32,
) -> EtlResult<ScrapeReport> {
    let mut report = ScrapeReport::default();
    for page_number in 1..=pages {
        let target = ScrapeTarget::random(rubric);
        log::info!("Page {}/{}: {}", page_number, pages, scraper.target_url(&target));
        report
            .pages
            .push(scrape_target(scraper, db, &target, page_number).await?);
    }
    log::info!(
        "Scrape finished: {} fetched, {} skipped, {} failed",
        report.fetched(),
        report.skipped(),
        report.failed()
    );
    Ok(report)
}

/// Scrape a single target, recording it unless it was seen before.
pub async fn scrape_target(
    scraper: &Scraper,
    db: &Database,
    target: &ScrapeTarget,
    page_number: u32,
) -> EtlResult<PageOutcome> {
    let url = scraper.target_url(target);

    if db.page_already_scraped(&url)? {
        log::info!("Already scraped {}, skipping", url);
        return Ok(PageOutcome {
            page_number,
            url,
            status: PageStatus::Skipped,
        });
    }

    let html = match scraper.fetch_target(target).await {
        Ok(html) => html,
        Err(e) => {
            log::warn!("Failed to scrape {}: {}", url, e);
            return Ok(PageOutcome {
                page_number,
                url,
                status: PageStatus::Failed(e.to_string()),
            });
        }
    };

    let paragraphs = scraper.extract_content(&html);
    log::info!("Extracted {} paragraphs from {}", paragraphs.len(), url);

    db.save_scraped_page(
        ScrapedPage::new(url.clone(), target.rubric.name())
            .with_letter(target.letter.to_string())
            .with_page_number(page_number)
            .with_raw_content(html)
            .with_notes(format!("{} paragraphs extracted", paragraphs.len())),
    )?;

    Ok(PageOutcome {
        page_number,
        url,
        status: PageStatus::Fetched {
            paragraphs: paragraphs.len(),
            preview: paragraphs
                .iter()
                .take(PREVIEW_PARAGRAPHS)
                .map(|p| preview(p))
                .collect(),
        },
    })
}

fn preview(paragraph: &str) -> String {
    if paragraph.chars().count() > PREVIEW_CHARS {
        let cut: String = paragraph.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        paragraph.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_chars() {
        assert_eq!(preview("short"), "short");
        let long = "é".repeat(150);
        let cut = preview(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_report_counts() {
        let outcome = |status| PageOutcome {
            page_number: 1,
            url: String::new(),
            status,
        };
        let report = ScrapeReport {
            pages: vec![
                outcome(PageStatus::Skipped),
                outcome(PageStatus::Failed("boom".to_string())),
                outcome(PageStatus::Fetched {
                    paragraphs: 2,
                    preview: Vec::new(),
                }),
                outcome(PageStatus::Skipped),
            ],
        };
        assert_eq!(report.fetched(), 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn test_seen_page_is_skipped_without_fetching() {
        let db = Database::open_in_memory().unwrap();
        // Port 9 (discard) is never listened on; a fetch attempt would fail.
        let scraper = Scraper::new(std::time::Duration::ZERO, std::time::Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let target = ScrapeTarget::new(Rubric::Portretten, 'A');
        db.save_scraped_page(ScrapedPage::new(scraper.target_url(&target), "portretten"))
            .unwrap();

        let outcome = scrape_target(&scraper, &db, &target, 1).await.unwrap();
        assert_eq!(outcome.status, PageStatus::Skipped);
    }
}
