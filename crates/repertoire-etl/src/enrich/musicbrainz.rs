//! MusicBrainz lookups for standardizing composer names and work titles.
//!
//! Searches return the first (highest-scored) match. MusicBrainz asks
//! clients for at most one request per second and a descriptive user agent;
//! both are enforced here.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use repertoire_core::Composer;

use crate::enrich::resilience::{get_json, RateLimiter};
use crate::error::EtlResult;

pub const MUSICBRAINZ_API_BASE: &str = "https://musicbrainz.org/ws/2";
const SOURCE_NAME: &str = "MusicBrainz";
const DEFAULT_CONTACT: &str = "https://github.com/oxur/repertoire";
const SEARCH_LIMIT: &str = "5";

/// Relation type ID of "composer" on work relations.
const COMPOSER_RELATION_TYPE_ID: &str = "d59d99ea-23d4-4a80-b066-edca32ee158f";

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    #[serde(default)]
    artists: Vec<MbArtist>,
}

#[derive(Debug, Deserialize)]
struct WorkSearchResponse {
    #[serde(default)]
    works: Vec<MbWork>,
}

#[derive(Debug, Deserialize)]
struct MbArtist {
    id: String,
    name: String,
    #[serde(rename = "sort-name")]
    sort_name: Option<String>,
    #[serde(rename = "type")]
    artist_type: Option<String>,
    country: Option<String>,
    #[serde(rename = "life-span", default)]
    life_span: MbLifeSpan,
}

#[derive(Debug, Default, Deserialize)]
struct MbLifeSpan {
    begin: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MbWork {
    id: String,
    title: String,
    #[serde(rename = "type")]
    work_type: Option<String>,
    language: Option<String>,
    #[serde(default)]
    relations: Vec<MbRelation>,
}

#[derive(Debug, Deserialize)]
struct MbRelation {
    #[serde(rename = "type")]
    relation_type: Option<String>,
    #[serde(rename = "type-id")]
    type_id: Option<String>,
    artist: Option<MbArtistRef>,
}

#[derive(Debug, Clone, Deserialize)]
struct MbArtistRef {
    id: String,
    name: String,
}

/// An artist as found on MusicBrainz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistMatch {
    pub mbid: String,
    pub name: String,
    pub sort_name: Option<String>,
    /// "Person", "Orchestra", "Choir", ...
    pub artist_type: Option<String>,
    /// ISO country code.
    pub country: Option<String>,
    /// Life-span dates as given ("1685", "1685-03-21").
    pub begin: Option<String>,
    pub end: Option<String>,
}

impl From<MbArtist> for ArtistMatch {
    fn from(artist: MbArtist) -> Self {
        Self {
            mbid: artist.id,
            name: artist.name,
            sort_name: artist.sort_name,
            artist_type: artist.artist_type,
            country: artist.country,
            begin: artist.life_span.begin,
            end: artist.life_span.end,
        }
    }
}

fn year_of(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

impl ArtistMatch {
    pub fn birth_year(&self) -> Option<i32> {
        year_of(self.begin.as_deref())
    }

    pub fn death_year(&self) -> Option<i32> {
        year_of(self.end.as_deref())
    }

    /// Fill a composer's MusicBrainz ID, nationality and life years from
    /// this match. Fields already set on the composer are kept.
    pub fn apply_to(&self, composer: &mut Composer) {
        composer.musicbrainz_id.get_or_insert_with(|| self.mbid.clone());
        if composer.nationality.is_none() {
            composer.nationality = self.country.clone();
        }
        if composer.birth_year.is_none() {
            composer.birth_year = self.birth_year();
        }
        if composer.death_year.is_none() {
            composer.death_year = self.death_year();
        }
    }

    /// A new composer record built from this match.
    pub fn to_composer(&self) -> Composer {
        let mut composer = Composer::new(self.name.clone());
        self.apply_to(&mut composer);
        composer
    }
}

/// The composer credited on a work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerRef {
    pub mbid: String,
    pub name: String,
}

/// A work as found on MusicBrainz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkMatch {
    pub mbid: String,
    pub title: String,
    pub work_type: Option<String>,
    pub language: Option<String>,
    pub composer: Option<ComposerRef>,
}

impl From<MbWork> for WorkMatch {
    fn from(work: MbWork) -> Self {
        let composer = work
            .relations
            .iter()
            .find(|r| {
                r.relation_type.as_deref() == Some("composer")
                    || r.type_id.as_deref() == Some(COMPOSER_RELATION_TYPE_ID)
            })
            .and_then(|r| r.artist.clone())
            .map(|a| ComposerRef {
                mbid: a.id,
                name: a.name,
            });
        Self {
            mbid: work.id,
            title: work.title,
            work_type: work.work_type,
            language: work.language,
            composer,
        }
    }
}

/// Quote a value for a Lucene search query.
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// MusicBrainz web service client.
#[derive(Debug, Clone)]
pub struct MusicBrainzClient {
    http: Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl MusicBrainzClient {
    /// Create a client; `contact` (an email or URL) is appended to the user
    /// agent as MusicBrainz requests.
    pub fn new(contact: Option<&str>) -> EtlResult<Self> {
        let user_agent = format!(
            "Repertoire/0.1.0 (Classical Music Manager) {}",
            contact.unwrap_or(DEFAULT_CONTACT)
        );
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url: MUSICBRAINZ_API_BASE.to_string(),
            rate_limiter: RateLimiter::per_second(1),
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

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> EtlResult<Option<T>> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let mut params = query.to_vec();
        params.push(("fmt", "json"));
        get_json(&self.http, &self.rate_limiter, SOURCE_NAME, &url, &params, None).await
    }

    /// Search for an artist of the given type ("Person", "Orchestra", ...).
    pub async fn search_artist(
        &self,
        name: &str,
        artist_type: &str,
    ) -> EtlResult<Option<ArtistMatch>> {
        let query = format!("artist:{} AND type:{}", quoted(name), quoted(artist_type));
        let response: Option<ArtistSearchResponse> = self
            .get("/artist", &[("query", query.as_str()), ("limit", SEARCH_LIMIT)])
            .await?;
        let found = response
            .and_then(|r| r.artists.into_iter().next())
            .map(ArtistMatch::from);
        log::debug!("MusicBrainz artist search {:?}: {:?}", name, found.as_ref().map(|a| &a.mbid));
        Ok(found)
    }

    /// Search for a work, optionally narrowed by composer name.
    pub async fn search_work(
        &self,
        title: &str,
        composer: Option<&str>,
    ) -> EtlResult<Option<WorkMatch>> {
        let mut query = format!("work:{}", quoted(title));
        if let Some(composer) = composer {
            query.push_str(" AND composer:");
            query.push_str(&quoted(composer));
        }
        let response: Option<WorkSearchResponse> = self
            .get("/work", &[("query", query.as_str()), ("limit", SEARCH_LIMIT)])
            .await?;
        Ok(response
            .and_then(|r| r.works.into_iter().next())
            .map(WorkMatch::from))
    }

    /// Look up an artist by MusicBrainz ID; `None` if it does not exist.
    pub async fn get_artist(&self, mbid: &str) -> EtlResult<Option<ArtistMatch>> {
        let artist: Option<MbArtist> = self.get(&format!("/artist/{mbid}"), &[]).await?;
        Ok(artist.map(ArtistMatch::from))
    }

    /// The MusicBrainz spelling of a composer's name.
    pub async fn standardize_composer_name(&self, name: &str) -> EtlResult<Option<String>> {
        Ok(self.search_artist(name, "Person").await?.map(|a| a.name))
    }

    /// The MusicBrainz title of a work.
    pub async fn standardize_work_title(
        &self,
        title: &str,
        composer: Option<&str>,
    ) -> EtlResult<Option<String>> {
        Ok(self.search_work(title, composer).await?.map(|w| w.title))
    }
}
