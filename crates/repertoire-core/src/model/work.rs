use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::composer::Composer;
use crate::model::ids::{ComposerId, WorkId};

/// A distinct musical work (composition).
///
/// A work always belongs to one composer. Its natural key is
/// (composer, title, catalog number), so the same title may exist once per
/// composer and catalog number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    #[serde(default)]
    pub id: Option<WorkId>,

    /// Owning composer. When unset, `composer` must carry a record to upsert.
    #[serde(default)]
    pub composer_id: Option<ComposerId>,

    /// Embedded composer, resolved to `composer_id` on insert and attached
    /// on hydration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composer: Option<Composer>,

    pub title: String,

    /// Catalog number (BWV, K., Sz., Op., etc.).
    #[serde(default)]
    pub catalog_number: Option<String>,

    /// Musical key (e.g., "C minor").
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub opus: Option<String>,

    #[serde(default)]
    pub duration_seconds: Option<i64>,

    #[serde(default)]
    pub notes: Option<String>,

    /// `MusicBrainz` work ID, if identified.
    #[serde(default)]
    pub musicbrainz_id: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Work {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            composer_id: None,
            composer: None,
            title: title.into(),
            catalog_number: None,
            key: None,
            opus: None,
            duration_seconds: None,
            notes: None,
            musicbrainz_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_composer_id(mut self, composer_id: ComposerId) -> Self {
        self.composer_id = Some(composer_id);
        self
    }

    #[must_use]
    pub fn with_composer(mut self, composer: Composer) -> Self {
        self.composer_id = composer.id;
        self.composer = Some(composer);
        self
    }

    #[must_use]
    pub fn with_catalog_number(mut self, catalog: impl Into<String>) -> Self {
        self.catalog_number = Some(catalog.into());
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_opus(mut self, opus: impl Into<String>) -> Self {
        self.opus = Some(opus.into());
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
