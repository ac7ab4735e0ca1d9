use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[must_use]
            pub const fn new(rowid: i64) -> Self {
                Self(rowid)
            }

            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(rowid: i64) -> Self {
                Self(rowid)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map(Self)
            }
        }
    };
}

define_id!(ComposerId, "Row identifier of a composer.");
define_id!(WorkId, "Row identifier of a musical work.");
define_id!(PerformerId, "Row identifier of a performer.");
define_id!(LabelId, "Row identifier of a record label.");
define_id!(
    RecordingId,
    "Row identifier of a recording (a physical or digital release)."
);
define_id!(PageId, "Row identifier of a scraped page record.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trips_rowid() {
        let id = WorkId::new(42);
        assert_eq!(id.get(), 42);
        assert_eq!(WorkId::from(42), id);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ComposerId::new(7).to_string(), "7");
    }

    #[test]
    fn test_id_serializes_as_bare_number() {
        let json = serde_json::to_string(&RecordingId::new(3)).unwrap();
        assert_eq!(json, "3");
        let back: RecordingId = serde_json::from_str("3").unwrap();
        assert_eq!(back, RecordingId::new(3));
    }

    #[test]
    fn test_id_sql_round_trip() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let id: LabelId = conn
            .query_row("SELECT ?1", [LabelId::new(99)], |row| row.get(0))
            .unwrap();
        assert_eq!(id, LabelId::new(99));
    }
}
