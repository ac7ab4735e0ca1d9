use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::PerformerId;

/// A musical performer: soloist, conductor, ensemble, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    #[serde(default)]
    pub id: Option<PerformerId>,
    pub name: String,

    /// Free-text classifier ("soloist", "conductor", "ensemble", ...).
    #[serde(default)]
    pub performer_type: Option<String>,

    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Performer {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: name.into(),
            performer_type: None,
            instrument: None,
            biography: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_type(mut self, performer_type: impl Into<String>) -> Self {
        self.performer_type = Some(performer_type.into());
        self
    }

    #[must_use]
    pub fn with_instrument(mut self, instrument: impl Into<String>) -> Self {
        self.instrument = Some(instrument.into());
        self
    }
}

/// A performer as credited on a recording, with an optional role
/// ("conductor", "piano", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credit {
    #[serde(flatten)]
    pub performer: Performer,
    #[serde(default)]
    pub role: Option<String>,
}

impl Credit {
    #[must_use]
    pub fn new(performer: Performer) -> Self {
        Self {
            performer,
            role: None,
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

impl From<Performer> for Credit {
    fn from(performer: Performer) -> Self {
        Self::new(performer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performer_builder() {
        let performer = Performer::new("Itzhak Perlman")
            .with_type("soloist")
            .with_instrument("violin");

        assert_eq!(performer.name, "Itzhak Perlman");
        assert_eq!(performer.performer_type.as_deref(), Some("soloist"));
        assert_eq!(performer.instrument.as_deref(), Some("violin"));
    }

    #[test]
    fn test_credit_serializes_flat() {
        let credit = Credit::new(Performer::new("Carlos Kleiber")).with_role("conductor");
        let value = serde_json::to_value(&credit).unwrap();
        assert_eq!(value["name"], "Carlos Kleiber");
        assert_eq!(value["role"], "conductor");
    }

    #[test]
    fn test_credit_deserializes_without_role() {
        let credit: Credit = serde_json::from_str(r#"{"name": "Wiener Philharmoniker"}"#).unwrap();
        assert_eq!(credit.performer.name, "Wiener Philharmoniker");
        assert!(credit.role.is_none());
    }
}
