use anyhow::{Context, Result};
use std::time::Duration;

use repertoire_etl::{scrape_pages, Config, PageStatus, Rubric, Scraper};

use super::open_database;

pub async fn run_scrape(
    config: &Config,
    rubric: Rubric,
    pages: u32,
    throttle: Option<f64>,
) -> Result<()> {
    let db = open_database(config)?;
    let throttle = match throttle {
        Some(secs) => Duration::try_from_secs_f64(secs)
            .context("--throttle must be a non-negative number of seconds")?,
        None => config.throttle(),
    };
    let scraper = Scraper::new(throttle, config.request_timeout())?;

    println!("Scraping {} page(s) from rubric: {}", pages, rubric);

    let report = scrape_pages(&scraper, &db, rubric, pages).await?;

    for page in &report.pages {
        println!("\nPage {}/{}: {}", page.page_number, pages, page.url);
        match &page.status {
            PageStatus::Fetched {
                paragraphs,
                preview,
            } => {
                println!("Extracted {} paragraphs from page", paragraphs);
                for (i, para) in preview.iter().enumerate() {
                    println!("  [{}] {}", i + 1, para);
                }
            }
            PageStatus::Skipped => println!("Already scraped, skipped"),
            PageStatus::Failed(reason) => println!("Failed to scrape page: {}", reason),
        }
    }

    println!(
        "\n{} fetched, {} skipped, {} failed",
        report.fetched(),
        report.skipped(),
        report.failed()
    );

    Ok(())
}
