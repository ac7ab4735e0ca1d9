use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::ComposerId;

/// A classical composer.
///
/// The name is the natural key: two composers with the same name are the
/// same composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composer {
    #[serde(default)]
    pub id: Option<ComposerId>,
    pub name: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,

    /// `MusicBrainz` artist ID.
    #[serde(default)]
    pub musicbrainz_id: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Composer {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: name.into(),
            birth_year: None,
            death_year: None,
            nationality: None,
            biography: None,
            musicbrainz_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_life(mut self, birth_year: i32, death_year: i32) -> Self {
        self.birth_year = Some(birth_year);
        self.death_year = Some(death_year);
        self
    }

    #[must_use]
    pub fn with_birth_year(mut self, year: i32) -> Self {
        self.birth_year = Some(year);
        self
    }

    #[must_use]
    pub fn with_nationality(mut self, nationality: impl Into<String>) -> Self {
        self.nationality = Some(nationality.into());
        self
    }

    #[must_use]
    pub fn with_musicbrainz_id(mut self, mbid: impl Into<String>) -> Self {
        self.musicbrainz_id = Some(mbid.into());
        self
    }
}
