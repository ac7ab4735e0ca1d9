use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::model::ids::{LabelId, RecordingId};
use crate::model::label::Label;
use crate::model::performer::Credit;
use crate::model::work::Work;

/// How a recording was made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingType {
    #[default]
    Studio,
    Live,
    Broadcast,
    Other,
}

impl RecordingType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Studio => "studio",
            Self::Live => "live",
            Self::Broadcast => "broadcast",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for RecordingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordingType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "studio" => Ok(Self::Studio),
            "live" => Ok(Self::Live),
            "broadcast" => Ok(Self::Broadcast),
            "other" => Ok(Self::Other),
            _ => Err(Error::InvalidData(format!("unknown recording type: {s}"))),
        }
    }
}

impl ToSql for RecordingType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RecordingType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
    }
}

/// A physical or digital release (album).
///
/// A recording holds any number of works, in track order, and any number of
/// credited performers. Its natural key is (title, catalog number, label).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub id: Option<RecordingId>,
    pub title: String,
    #[serde(default)]
    pub recording_type: RecordingType,

    #[serde(default)]
    pub label_id: Option<LabelId>,

    /// Embedded label, upserted on insert when `label_id` is unset.
    #[serde(default)]
    pub label: Option<Label>,

    /// Label catalog number (e.g., "439 947-2").
    #[serde(default)]
    pub catalog_number: Option<String>,

    /// EAN/UPC barcode.
    #[serde(default)]
    pub ean: Option<String>,

    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub recording_year: Option<i32>,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub cover_url: Option<String>,

    /// Discogs release ID; unique across the catalog when present.
    #[serde(default)]
    pub discogs_id: Option<i64>,
    #[serde(default)]
    pub discogs_url: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    /// Whether the release is in the owner's own collection.
    #[serde(default)]
    pub in_library: bool,

    #[serde(default)]
    pub performers: Vec<Credit>,

    /// Works on this release, in track order.
    #[serde(default)]
    pub works: Vec<Work>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Recording {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title: title.into(),
            recording_type: RecordingType::default(),
            label_id: None,
            label: None,
            catalog_number: None,
            ean: None,
            release_year: None,
            recording_year: None,
            duration_seconds: None,
            cover_url: None,
            discogs_id: None,
            discogs_url: None,
            notes: None,
            in_library: false,
            performers: Vec::new(),
            works: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_type(mut self, recording_type: RecordingType) -> Self {
        self.recording_type = recording_type;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        self.label_id = label.id;
        self.label = Some(label);
        self
    }

    #[must_use]
    pub fn with_catalog_number(mut self, catalog: impl Into<String>) -> Self {
        self.catalog_number = Some(catalog.into());
        self
    }

    #[must_use]
    pub fn with_release_year(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    #[must_use]
    pub fn with_performer(mut self, credit: impl Into<Credit>) -> Self {
        self.performers.push(credit.into());
        self
    }

    #[must_use]
    pub fn with_work(mut self, work: Work) -> Self {
        self.works.push(work);
        self
    }

    #[must_use]
    pub fn in_library(mut self, in_library: bool) -> Self {
        self.in_library = in_library;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Performer;

    #[test]
    fn test_recording_type_parse() {
        assert_eq!("studio".parse::<RecordingType>().unwrap(), RecordingType::Studio);
        assert_eq!("LIVE".parse::<RecordingType>().unwrap(), RecordingType::Live);
        assert_eq!(" broadcast ".parse::<RecordingType>().unwrap(), RecordingType::Broadcast);
        assert!("bootleg".parse::<RecordingType>().is_err());
    }

    #[test]
    fn test_recording_type_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&RecordingType::Live).unwrap(), "\"live\"");
        assert!(serde_json::from_str::<RecordingType>("\"bootleg\"").is_err());
    }

    #[test]
    fn test_recording_type_rejects_unknown_sql_value() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let result: rusqlite::Result<RecordingType> =
            conn.query_row("SELECT 'bootleg'", [], |row| row.get(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_recording_builder() {
        let recording = Recording::new("Symphony No. 5")
            .with_type(RecordingType::Live)
            .with_label(Label::new("Deutsche Grammophon"))
            .with_catalog_number("DGG-001")
            .with_performer(Performer::new("Carlos Kleiber"))
            .with_work(Work::new("Symphony No. 5 in C minor"))
            .in_library(true);

        assert_eq!(recording.recording_type, RecordingType::Live);
        assert!(recording.label_id.is_none());
        assert_eq!(recording.label.as_ref().map(|l| l.name.as_str()), Some("Deutsche Grammophon"));
        assert_eq!(recording.performers.len(), 1);
        assert_eq!(recording.works.len(), 1);
        assert!(recording.in_library);
    }

    #[test]
    fn test_recording_deserialize_minimal() {
        let recording: Recording = serde_json::from_str(r#"{"title": "Goldberg Variations"}"#).unwrap();
        assert_eq!(recording.recording_type, RecordingType::Studio);
        assert!(!recording.in_library);
        assert!(recording.works.is_empty());
    }
}
