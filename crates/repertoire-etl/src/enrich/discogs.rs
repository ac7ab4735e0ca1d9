//! Discogs lookups for cover art, catalog numbers and barcodes.
//!
//! Releases are found by catalog number first (with and without punctuation,
//! optionally narrowed by label and artist), then by free-text query. When a
//! search returns several candidates the best one is picked by
//! [`choose_best_result`] and its full release fetched.
//!
//! Rate limits are enforced internally: authenticated requests are capped at
//! 4 req/sec and unauthenticated requests at 1 req/sec, matching the Discogs
//! API terms.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use repertoire_core::{Credit, Label, Performer, Recording};

use crate::enrich::resilience::{get_json, RateLimiter};
use crate::error::EtlResult;

pub const DISCOGS_API_BASE: &str = "https://api.discogs.com";
const SOURCE_NAME: &str = "Discogs";
const USER_AGENT: &str = "Repertoire/0.1.0";
const SEARCH_PAGE_SIZE: &str = "20";

static RELEASE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:www\.)?discogs\.com/(?:[^/]+/)*release/(\d+)")
        .unwrap_or_else(|e| unreachable!("release URL pattern is valid: {e}"))
});

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<DiscogsSearchResult>,
}

/// A single search result from the Discogs database search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscogsSearchResult {
    pub id: u64,
    /// Combined "Artist - Title" string.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub country: Option<String>,
    /// Label names.
    #[serde(default)]
    pub label: Vec<String>,
    #[serde(default)]
    pub catno: Option<String>,
}

/// Raw release document; only the fields we read.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReleaseResponse {
    id: u64,
    title: String,
    country: Option<String>,
    released: Option<String>,
    year: Option<i32>,
    uri: Option<String>,
    labels: Vec<RawLabel>,
    images: Vec<RawImage>,
    identifiers: Vec<RawIdentifier>,
    barcodes: Vec<String>,
    artists: Vec<RawArtist>,
    extraartists: Vec<RawArtist>,
    tracklist: Vec<RawTrack>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLabel {
    name: Option<String>,
    catno: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawImage {
    #[serde(rename = "type")]
    image_type: Option<String>,
    uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIdentifier {
    #[serde(rename = "type")]
    identifier_type: Option<String>,
    value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawArtist {
    name: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTrack {
    title: Option<String>,
    position: Option<String>,
    duration: Option<String>,
}

/// One entry of a release's track list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub position: Option<String>,
    pub duration: Option<String>,
}

/// Release information extracted from a Discogs release document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscogsRelease {
    pub release_id: u64,
    pub title: String,
    pub country: Option<String>,
    pub year: Option<i32>,
    /// Barcode, digits only (at least 12).
    pub ean: Option<String>,
    pub cover_url: Option<String>,
    /// Name and catalog number of the first listed label.
    pub label_name: Option<String>,
    pub catalog_number: Option<String>,
    /// Primary artist names joined with "; ".
    pub artists: Option<String>,
    /// Credits as "Name (Role)", or just "Name" without a role.
    pub extra_artists: Vec<String>,
    pub tracklist: Vec<Track>,
    pub url: String,
}

impl From<ReleaseResponse> for DiscogsRelease {
    fn from(raw: ReleaseResponse) -> Self {
        let year = extract_year(&raw);
        let ean = extract_ean(&raw);
        let cover_url = extract_cover(&raw);
        let (label_name, catalog_number) = raw
            .labels
            .first()
            .map(|l| (l.name.clone(), l.catno.clone()))
            .unwrap_or_default();

        let names: Vec<&str> = raw.artists.iter().filter_map(|a| a.name.as_deref()).collect();
        let artists = (!names.is_empty()).then(|| names.join("; "));

        let extra_artists = raw
            .extraartists
            .iter()
            .filter_map(|a| {
                let name = a.name.as_deref().filter(|n| !n.is_empty())?;
                Some(match a.role.as_deref().filter(|r| !r.is_empty()) {
                    Some(role) => format!("{name} ({role})"),
                    None => name.to_string(),
                })
            })
            .collect();

        let tracklist = raw
            .tracklist
            .into_iter()
            .filter_map(|t| {
                let title = t.title.filter(|t| !t.is_empty())?;
                Some(Track {
                    title,
                    position: t.position.filter(|p| !p.is_empty()),
                    duration: t.duration.filter(|d| !d.is_empty()),
                })
            })
            .collect();

        let url = raw
            .uri
            .unwrap_or_else(|| format!("https://www.discogs.com/release/{}", raw.id));

        Self {
            release_id: raw.id,
            title: raw.title,
            country: raw.country,
            year,
            ean,
            cover_url,
            label_name,
            catalog_number,
            artists,
            extra_artists,
            tracklist,
            url,
        }
    }
}

impl DiscogsRelease {
    /// Convert into a catalog recording ready for
    /// [`Database::add_recording`](repertoire_core::Database::add_recording).
    ///
    /// Primary artists become performer credits.
    pub fn to_recording(&self) -> Recording {
        let mut recording = Recording::new(self.title.clone());
        if let Some(ref name) = self.label_name {
            recording = recording.with_label(Label::new(name.clone()));
        }
        recording.catalog_number = self.catalog_number.clone();
        recording.ean = self.ean.clone();
        recording.release_year = self.year;
        recording.cover_url = self.cover_url.clone();
        recording.discogs_id = i64::try_from(self.release_id).ok();
        recording.discogs_url = Some(self.url.clone());
        recording.performers = self
            .artists
            .iter()
            .flat_map(|a| a.split("; "))
            .map(|name| Credit::new(Performer::new(name)))
            .collect();
        recording
    }
}

fn extract_year(raw: &ReleaseResponse) -> Option<i32> {
    match raw.released.as_deref().filter(|r| !r.is_empty()) {
        Some(released) => released.get(..4).and_then(|y| y.parse().ok()),
        None => raw.year.filter(|y| *y > 0),
    }
}

fn extract_cover(raw: &ReleaseResponse) -> Option<String> {
    let uri = |img: &RawImage| img.uri.clone().filter(|u| !u.is_empty());
    raw.images
        .iter()
        .filter(|img| img.image_type.as_deref() == Some("primary"))
        .find_map(uri)
        .or_else(|| raw.images.iter().find_map(uri))
}

fn extract_ean(raw: &ReleaseResponse) -> Option<String> {
    raw.identifiers
        .iter()
        .filter(|id| {
            matches!(
                id.identifier_type.as_deref().map(str::to_lowercase).as_deref(),
                Some("barcode" | "ean" | "upc")
            )
        })
        .filter_map(|id| id.value.as_deref())
        .find_map(sanitize_ean)
        .or_else(|| raw.barcodes.iter().find_map(|b| sanitize_ean(b)))
}

/// Keep the digits of a barcode; fewer than 12 is not a barcode.
fn sanitize_ean(value: &str) -> Option<String> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    (digits.len() >= 12).then_some(digits)
}

/// Upper-case alphanumerics only: "DG 439-947-2" and "dg4399472" compare equal.
pub fn normalize_catalog(value: &str) -> String {
    value
        .chars()
        .flat_map(char::to_uppercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

pub fn normalize_label(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Extract the release ID from a Discogs release URL.
pub fn extract_release_id(url: &str) -> Option<u64> {
    RELEASE_URL
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Pick the best search result; lower scores win and ties keep input order.
///
/// The score is, in order: exact catalog-number match after normalization,
/// country preference (Netherlands, then Europe, then anything else), and
/// label match.
pub fn choose_best_result<'a>(
    results: &'a [DiscogsSearchResult],
    label: Option<&str>,
    catalog_number: Option<&str>,
) -> Option<&'a DiscogsSearchResult> {
    let label_norm = label.map(normalize_label).filter(|l| !l.is_empty());
    let cat_norm = catalog_number.map(normalize_catalog).filter(|c| !c.is_empty());

    let score = |item: &DiscogsSearchResult| {
        let item_cat = normalize_catalog(item.catno.as_deref().unwrap_or_default());
        let cat_match = u8::from(cat_norm.as_deref() != Some(item_cat.as_str()));

        let country = item.country.as_deref().unwrap_or_default().to_lowercase();
        let country_score: u8 = if country.contains("netherlands") {
            0
        } else if country.contains("europe") {
            1
        } else {
            2
        };

        let label_match = u8::from(
            !label_norm
                .as_ref()
                .is_some_and(|l| item.label.iter().any(|il| normalize_label(il) == *l)),
        );

        (cat_match, country_score, label_match)
    };

    results
        .iter()
        .enumerate()
        .min_by_key(|(index, item)| (score(*item), *index))
        .map(|(_, item)| item)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Discogs API client.
///
/// Wraps a [`reqwest::Client`] pre-configured with the required user-agent
/// header and a 30-second timeout. Authentication is optional; when a
/// personal access token is provided the higher authenticated rate limit
/// applies.
#[derive(Debug, Clone)]
pub struct DiscogsClient {
    http: Client,
    token: Option<String>,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl DiscogsClient {
    pub fn new(token: Option<String>) -> EtlResult<Self> {
        let rps = if token.is_some() { 4 } else { 1 };
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            token,
            base_url: DISCOGS_API_BASE.to_string(),
            rate_limiter: RateLimiter::per_second(rps),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Build the `Authorization` header value, if a token is configured.
    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Discogs token={t}"))
    }

    /// GET a JSON document; `None` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> EtlResult<Option<T>> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let auth = self.auth_header();
        get_json(
            &self.http,
            &self.rate_limiter,
            SOURCE_NAME,
            &url,
            query,
            auth.as_deref(),
        )
        .await
    }

    /// Run a database search of type `release`.
    pub async fn search(&self, params: &[(&str, &str)]) -> EtlResult<Vec<DiscogsSearchResult>> {
        let mut query = vec![("type", "release"), ("per_page", SEARCH_PAGE_SIZE)];
        query.extend_from_slice(params);
        let response: Option<SearchResponse> = self.get_json("/database/search", &query).await?;
        Ok(response.map(|r| r.results).unwrap_or_default())
    }

    /// Get release details by Discogs release ID; `None` if Discogs has no
    /// such release.
    pub async fn get_release(&self, id: u64) -> EtlResult<Option<DiscogsRelease>> {
        let raw: Option<ReleaseResponse> = self.get_json(&format!("/releases/{id}"), &[]).await?;
        if raw.is_none() {
            log::debug!("Discogs release {} not found", id);
        }
        Ok(raw.map(DiscogsRelease::from))
    }

    /// Find the best-matching release.
    ///
    /// The catalog number is tried first, normalized and then with spaces,
    /// dashes and dots removed. The free-text `query` is used only when the
    /// catalog search finds nothing.
    pub async fn find_release(
        &self,
        catalog_number: Option<&str>,
        label: Option<&str>,
        artist: Option<&str>,
        query: Option<&str>,
    ) -> EtlResult<Option<DiscogsRelease>> {
        let mut results = Vec::new();

        if let Some(catalog) = catalog_number {
            results = self.search_by_catalog(catalog, label, artist).await?;
        }

        if results.is_empty() {
            if let Some(q) = query {
                results = self.search(&[("q", q)]).await?;
            }
        }

        let Some(best) = choose_best_result(&results, label, catalog_number) else {
            log::debug!(
                "No Discogs results for catalog={:?} label={:?} query={:?}",
                catalog_number,
                label,
                query
            );
            return Ok(None);
        };

        self.get_release(best.id).await
    }

    async fn search_by_catalog(
        &self,
        catalog_number: &str,
        label: Option<&str>,
        artist: Option<&str>,
    ) -> EtlResult<Vec<DiscogsSearchResult>> {
        let mut variants = vec![normalize_catalog(catalog_number)];
        let no_punctuation: String = catalog_number
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.'))
            .collect();
        if !no_punctuation.is_empty() && !variants.contains(&no_punctuation) {
            variants.push(no_punctuation);
        }

        for variant in variants.iter().filter(|v| !v.is_empty()) {
            let mut params = vec![("catno", variant.as_str())];
            if let Some(label) = label {
                params.push(("label", label));
            }
            if let Some(artist) = artist {
                params.push(("artist", artist));
            }
            let results = self.search(&params).await?;
            if !results.is_empty() {
                return Ok(results);
            }
        }

        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: u64, catno: &str, country: &str, labels: &[&str]) -> DiscogsSearchResult {
        DiscogsSearchResult {
            id,
            title: format!("Release {id}"),
            country: Some(country.to_string()),
            label: labels.iter().map(|l| (*l).to_string()).collect(),
            catno: Some(catno.to_string()),
        }
    }

    #[test]
    fn test_discogs_client_creation_unauthenticated() {
        let client = DiscogsClient::new(None).unwrap();
        assert!(!client.is_authenticated());
        assert!(client.auth_header().is_none());
    }

    #[test]
    fn test_discogs_client_creation_authenticated() {
        let client = DiscogsClient::new(Some("test-token".to_string())).unwrap();
        assert!(client.is_authenticated());
        assert_eq!(client.auth_header().as_deref(), Some("Discogs token=test-token"));
    }

    #[test]
    fn test_normalize_catalog() {
        assert_eq!(normalize_catalog("DG 439-947-2"), "DG4399472");
        assert_eq!(normalize_catalog("dg.439 947.2"), "DG4399472");
        assert_eq!(normalize_label("  Deutsche Grammophon "), "deutsche grammophon");
    }

    #[test]
    fn test_extract_release_id() {
        assert_eq!(extract_release_id("https://www.discogs.com/release/1234567"), Some(1_234_567));
        assert_eq!(
            extract_release_id("https://www.discogs.com/Glenn-Gould-Goldberg/release/249504"),
            Some(249_504)
        );
        assert_eq!(extract_release_id("discogs.com/release/42-Some-Title"), Some(42));
        assert_eq!(extract_release_id("HTTPS://WWW.DISCOGS.COM/RELEASE/7"), Some(7));
        assert_eq!(extract_release_id("https://www.discogs.com/master/1234"), None);
        assert_eq!(extract_release_id("https://example.com/release/1"), None);
    }

    #[test]
    fn test_best_result_prefers_catalog_match() {
        let results = vec![
            result(1, "DG 123", "Netherlands", &["Deutsche Grammophon"]),
            result(2, "439 947-2", "US", &[]),
        ];
        let best = choose_best_result(&results, None, Some("439-947-2")).unwrap();
        assert_eq!(best.id, 2);
    }

    #[test]
    fn test_best_result_country_then_label() {
        let results = vec![
            result(1, "X1", "US", &["Decca"]),
            result(2, "X1", "Europe", &["Philips"]),
            result(3, "X1", "Europe", &["Decca"]),
            result(4, "X1", "Netherlands", &["Philips"]),
        ];
        assert_eq!(choose_best_result(&results, Some("decca"), Some("X1")).unwrap().id, 4);

        let results = &results[..3];
        assert_eq!(choose_best_result(results, Some(" Decca "), Some("X1")).unwrap().id, 3);
    }

    #[test]
    fn test_best_result_ties_keep_input_order() {
        let results = vec![result(7, "A", "Japan", &[]), result(8, "A", "Japan", &[])];
        assert_eq!(choose_best_result(&results, None, None).unwrap().id, 7);
        assert!(choose_best_result(&[], None, None).is_none());
    }

    fn release_json() -> serde_json::Value {
        serde_json::json!({
            "id": 249504,
            "title": "Bach: The Goldberg Variations",
            "country": "Canada",
            "released": "1982-09-01",
            "year": 1981,
            "uri": "https://www.discogs.com/release/249504-Glenn-Gould-Goldberg",
            "labels": [{"name": "CBS Masterworks", "catno": "IM 37779"}, {"name": "CBS", "catno": "X"}],
            "images": [
                {"type": "secondary", "uri": "https://img/secondary.jpg"},
                {"type": "primary", "uri": "https://img/primary.jpg"}
            ],
            "identifiers": [
                {"type": "Matrix / Runout", "value": "IM-37779-1A"},
                {"type": "Barcode", "value": "0 7464-37779-2 5"}
            ],
            "artists": [{"name": "Johann Sebastian Bach"}, {"name": "Glenn Gould"}],
            "extraartists": [{"name": "Samuel H. Carter", "role": "Producer"}, {"name": "Anonymous", "role": ""}],
            "tracklist": [
                {"title": "Aria", "position": "A1", "duration": "3:05"},
                {"title": "", "position": "", "duration": ""},
                {"title": "Variatio 1", "position": "A2", "duration": ""}
            ]
        })
    }

    #[test]
    fn test_release_extraction() {
        let raw: ReleaseResponse = serde_json::from_value(release_json()).unwrap();
        let release = DiscogsRelease::from(raw);

        assert_eq!(release.release_id, 249_504);
        assert_eq!(release.year, Some(1982));
        assert_eq!(release.ean.as_deref(), Some("074643777925"));
        assert_eq!(release.cover_url.as_deref(), Some("https://img/primary.jpg"));
        assert_eq!(release.label_name.as_deref(), Some("CBS Masterworks"));
        assert_eq!(release.catalog_number.as_deref(), Some("IM 37779"));
        assert_eq!(release.artists.as_deref(), Some("Johann Sebastian Bach; Glenn Gould"));
        assert_eq!(release.extra_artists, ["Samuel H. Carter (Producer)", "Anonymous"]);
        assert_eq!(release.tracklist.len(), 2);
        assert_eq!(release.tracklist[1].duration, None);
    }

    #[test]
    fn test_release_extraction_fallbacks() {
        let raw: ReleaseResponse = serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "Sparse",
            "year": 1999,
            "images": [{"type": "secondary", "uri": "https://img/only.jpg"}],
            "identifiers": [{"type": "Barcode", "value": "123"}],
            "barcodes": ["5 028421 924212"]
        }))
        .unwrap();
        let release = DiscogsRelease::from(raw);

        assert_eq!(release.year, Some(1999));
        assert_eq!(release.cover_url.as_deref(), Some("https://img/only.jpg"));
        assert_eq!(release.ean.as_deref(), Some("5028421924212"));
        assert!(release.artists.is_none());
        assert_eq!(release.url, "https://www.discogs.com/release/1");
    }

    #[test]
    fn test_release_without_year() {
        let raw: ReleaseResponse =
            serde_json::from_value(serde_json::json!({"id": 2, "title": "Undated", "year": 0})).unwrap();
        assert_eq!(DiscogsRelease::from(raw).year, None);
    }

    #[test]
    fn test_to_recording() {
        let raw: ReleaseResponse = serde_json::from_value(release_json()).unwrap();
        let recording = DiscogsRelease::from(raw).to_recording();

        assert_eq!(recording.title, "Bach: The Goldberg Variations");
        assert_eq!(recording.label.as_ref().map(|l| l.name.as_str()), Some("CBS Masterworks"));
        assert_eq!(recording.catalog_number.as_deref(), Some("IM 37779"));
        assert_eq!(recording.release_year, Some(1982));
        assert_eq!(recording.discogs_id, Some(249_504));
        assert_eq!(recording.performers.len(), 2);
        assert_eq!(recording.performers[1].performer.name, "Glenn Gould");
    }
}
