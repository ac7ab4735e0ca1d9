//! Fetching pages from musicalifeiten.nl.
//!
//! The site is organized in rubrics, each sharded alphabetically. A
//! [`ScrapeTarget`] names one rubric/letter page; the [`Scraper`] fetches it
//! with retry and a fixed delay between requests.

pub mod parser;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use backon::Retryable;
use rand::Rng;
use reqwest::Client;

use crate::enrich::resilience::{check_status, retry_policy, RateLimiter};
use crate::error::{EtlError, EtlResult};

pub use parser::{clean_text, extract_paragraphs};

pub const BASE_URL: &str = "https://www.musicalifeiten.nl";
pub const USER_AGENT: &str = "Repertoire/0.1.0 (Classical Music Manager)";
const SOURCE_NAME: &str = "musicalifeiten.nl";

/// A content category of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rubric {
    Portretten,
    Discografieen,
    MiniDiscografieen,
    Vergelijkingen,
    MiniVergelijkingen,
}

impl Rubric {
    pub const ALL: [Self; 5] = [
        Self::Portretten,
        Self::Discografieen,
        Self::MiniDiscografieen,
        Self::Vergelijkingen,
        Self::MiniVergelijkingen,
    ];

    /// The name used on the command line and in stored pages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Portretten => "portretten",
            Self::Discografieen => "discografieen",
            Self::MiniDiscografieen => "mini_discografieen",
            Self::Vergelijkingen => "vergelijkingen",
            Self::MiniVergelijkingen => "mini_vergelijkingen",
        }
    }

    /// Site path of the rubric, relative to the base URL.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Portretten => "/composers/portraits",
            Self::Discografieen => "/discographies",
            Self::MiniDiscografieen => "/mini-discographies",
            Self::Vergelijkingen => "/comparisons",
            Self::MiniVergelijkingen => "/mini-comparisons",
        }
    }
}

impl fmt::Display for Rubric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rubric {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rubric| rubric.name() == s)
            .ok_or_else(|| {
                let available: Vec<_> = Self::ALL.iter().map(|r| r.name()).collect();
                EtlError::UnknownRubric(s.to_string(), available.join(", "))
            })
    }
}

/// One rubric/letter page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub rubric: Rubric,
    /// Upper-case letter A-Z.
    pub letter: char,
}

impl ScrapeTarget {
    pub fn new(rubric: Rubric, letter: char) -> Self {
        Self {
            rubric,
            letter: letter.to_ascii_uppercase(),
        }
    }

    /// A target on a uniformly random letter.
    pub fn random(rubric: Rubric) -> Self {
        let letter = char::from(rand::thread_rng().gen_range(b'A'..=b'Z'));
        Self::new(rubric, letter)
    }

    /// `{base}{rubric path}/{letter lowercase}/`
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}{}/{}/",
            base_url.trim_end_matches('/'),
            self.rubric.path(),
            self.letter.to_ascii_lowercase()
        )
    }
}

/// HTTP fetcher for the site.
#[derive(Debug, Clone)]
pub struct Scraper {
    http: Client,
    base_url: String,
    limiter: RateLimiter,
}

impl Scraper {
    /// Create a scraper with the given delay between requests and
    /// per-request timeout.
    pub fn new(throttle: Duration, timeout: Duration) -> EtlResult<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            limiter: RateLimiter::with_interval(throttle),
        })
    }

    /// Point the scraper at another host (mirrors, tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn target_url(&self, target: &ScrapeTarget) -> String {
        target.url(&self.base_url)
    }

    /// Fetch the HTML of one page.
    ///
    /// Transport errors and 429/5xx responses are retried with exponential
    /// backoff; other failures are returned at once.
    pub async fn fetch(&self, url: &str) -> EtlResult<String> {
        let attempt = || async move {
            self.limiter.acquire().await;
            log::debug!("GET {}", url);
            let response = self.http.get(url).send().await?;
            let response = check_status(SOURCE_NAME, response)?;
            Ok::<_, EtlError>(response.text().await?)
        };

        attempt
            .retry(retry_policy())
            .when(EtlError::is_transient)
            .notify(|err, delay| {
                log::warn!("Fetching {} failed ({}), retrying in {:?}", url, err, delay);
            })
            .await
    }

    /// Fetch the page for `target`.
    pub async fn fetch_target(&self, target: &ScrapeTarget) -> EtlResult<String> {
        self.fetch(&self.target_url(target)).await
    }

    /// Extract article paragraphs from fetched HTML.
    pub fn extract_content(&self, html: &str) -> Vec<String> {
        extract_paragraphs(html)
    }
}
