use rusqlite::ToSql;

use crate::error::Result;
use crate::model::Recording;

use super::db::Database;
use super::recordings::{hydrate, row_to_recording, RECORDING_COLUMNS};

/// Default cap on the number of recordings a query returns.
pub const DEFAULT_LIMIT: usize = 100;

/// Filters for [`Database::get_recordings`].
///
/// Text filters are case-insensitive substring matches; unset filters match
/// everything. All set filters must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingQuery {
    /// Matches recordings holding a work by a composer whose name contains this.
    pub composer: Option<String>,
    /// Matches recordings holding a work whose title contains this.
    pub work: Option<String>,
    /// Matches recordings whose label name contains this.
    pub label: Option<String>,
    pub in_library: Option<bool>,
    pub limit: usize,
}

impl Default for RecordingQuery {
    fn default() -> Self {
        Self {
            composer: None,
            work: None,
            label: None,
            in_library: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl RecordingQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn composer(mut self, name: impl Into<String>) -> Self {
        self.composer = Some(name.into());
        self
    }

    #[must_use]
    pub fn work(mut self, title: impl Into<String>) -> Self {
        self.work = Some(title.into());
        self
    }

    #[must_use]
    pub fn label(mut self, name: impl Into<String>) -> Self {
        self.label = Some(name.into());
        self
    }

    #[must_use]
    pub const fn in_library(mut self, in_library: bool) -> Self {
        self.in_library = Some(in_library);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Wrap user input as a `LIKE ... ESCAPE '\'` "contains" pattern, escaping the
/// wildcard characters it may carry.
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn non_empty(filter: Option<&str>) -> Option<&str> {
    filter.filter(|s| !s.is_empty())
}

impl Database {
    /// Recordings matching `query`, hydrated, in insertion order.
    ///
    /// Empty text filters impose no constraint.
    pub fn get_recordings(&self, query: &RecordingQuery) -> Result<Vec<Recording>> {
        let mut sql = format!("SELECT {RECORDING_COLUMNS} FROM recordings r WHERE 1 = 1");
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(composer) = non_empty(query.composer.as_deref()) {
            sql.push_str(
                " AND r.id IN (
                    SELECT rw.recording_id FROM recording_works rw
                    JOIN works w ON w.id = rw.work_id
                    JOIN composers c ON c.id = w.composer_id
                    WHERE c.name LIKE ? ESCAPE '\\')",
            );
            params.push(Box::new(contains_pattern(composer)));
        }

        if let Some(work) = non_empty(query.work.as_deref()) {
            sql.push_str(
                " AND r.id IN (
                    SELECT rw.recording_id FROM recording_works rw
                    JOIN works w ON w.id = rw.work_id
                    WHERE w.title LIKE ? ESCAPE '\\')",
            );
            params.push(Box::new(contains_pattern(work)));
        }

        if let Some(label) = non_empty(query.label.as_deref()) {
            sql.push_str(" AND r.label_id IN (SELECT id FROM labels WHERE name LIKE ? ESCAPE '\\')");
            params.push(Box::new(contains_pattern(label)));
        }

        if let Some(in_library) = query.in_library {
            sql.push_str(" AND r.in_library = ?");
            params.push(Box::new(in_library));
        }

        sql.push_str(" ORDER BY r.id LIMIT ?");
        params.push(Box::new(i64::try_from(query.limit).unwrap_or(i64::MAX)));

        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let mut recordings = stmt
            .query_map(param_refs.as_slice(), row_to_recording)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for recording in &mut recordings {
            hydrate(&self.conn, recording)?;
        }

        log::debug!("Recording query matched {} rows", recordings.len());
        Ok(recordings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Composer, Label, Work};

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn recording_of(title: &str, work: &str, composer: &str) -> Recording {
        Recording::new(title).with_work(Work::new(work).with_composer(Composer::new(composer)))
    }

    fn titles(recordings: &[Recording]) -> Vec<&str> {
        recordings.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Bach"), "%Bach%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }

    #[test]
    fn test_no_filters_respects_limit() {
        let mut db = test_db();
        for i in 0..10 {
            db.add_recording(Recording::new(format!("Recording {i}"))).unwrap();
        }

        let results = db.get_recordings(&RecordingQuery::new().limit(5)).unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].title, "Recording 0");
        assert_eq!(db.get_recordings(&RecordingQuery::new()).unwrap().len(), 10);
    }

    #[test]
    fn test_composer_filter_is_case_insensitive() {
        let mut db = test_db();
        db.add_recording(recording_of("Fifth", "Symphony No. 5", "Ludwig van Beethoven"))
            .unwrap();
        db.add_recording(recording_of("Goldberg", "Goldberg Variations", "Johann Sebastian Bach"))
            .unwrap();
        db.add_recording(recording_of("Ninth", "Symphony No. 9", "Ludwig van Beethoven"))
            .unwrap();

        let results = db
            .get_recordings(&RecordingQuery::new().composer("BEETHOVEN"))
            .unwrap();
        assert_eq!(titles(&results), ["Fifth", "Ninth"]);
        assert!(results.iter().all(|r| r
            .works
            .iter()
            .any(|w| w.composer.as_ref().is_some_and(|c| c.name.contains("Beethoven")))));
    }

    #[test]
    fn test_filters_combine() {
        let mut db = test_db();
        db.add_recording(
            recording_of("Fifth (DG)", "Symphony No. 5", "Ludwig van Beethoven")
                .with_label(Label::new("Deutsche Grammophon"))
                .in_library(true),
        )
        .unwrap();
        db.add_recording(
            recording_of("Fifth (Decca)", "Symphony No. 5", "Ludwig van Beethoven")
                .with_label(Label::new("Decca")),
        )
        .unwrap();
        db.add_recording(
            recording_of("Pathetique", "Piano Sonata No. 8", "Ludwig van Beethoven")
                .with_label(Label::new("Decca"))
                .in_library(true),
        )
        .unwrap();

        let q = RecordingQuery::new().work("symphony").label("decca");
        assert_eq!(titles(&db.get_recordings(&q).unwrap()), ["Fifth (Decca)"]);

        let q = RecordingQuery::new().composer("beethoven").in_library(true);
        assert_eq!(titles(&db.get_recordings(&q).unwrap()), ["Fifth (DG)", "Pathetique"]);

        let q = RecordingQuery::new().in_library(false);
        assert_eq!(titles(&db.get_recordings(&q).unwrap()), ["Fifth (Decca)"]);
    }

    #[test]
    fn test_wildcards_in_input_match_literally() {
        let mut db = test_db();
        db.add_recording(recording_of("A", "Etude 100%", "Composer A")).unwrap();
        db.add_recording(recording_of("B", "Etude 1000", "Composer B")).unwrap();

        let results = db.get_recordings(&RecordingQuery::new().work("100%")).unwrap();
        assert_eq!(titles(&results), ["A"]);

        let results = db.get_recordings(&RecordingQuery::new().work("_tude")).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_empty_text_filters_are_ignored() {
        let mut db = test_db();
        db.add_recording(Recording::new("Recital")).unwrap();
        db.add_recording(recording_of("Fifth", "Symphony No. 5", "Ludwig van Beethoven"))
            .unwrap();

        let all = db.get_recordings(&RecordingQuery::new()).unwrap();
        assert_eq!(all.len(), 2);

        let q = RecordingQuery::new().composer("").work("").label("");
        assert_eq!(titles(&db.get_recordings(&q).unwrap()), titles(&all));
    }

    #[test]
    fn test_no_matches_is_empty() {
        let mut db = test_db();
        db.add_recording(recording_of("Fifth", "Symphony No. 5", "Ludwig van Beethoven"))
            .unwrap();
        let results = db.get_recordings(&RecordingQuery::new().composer("Mahler")).unwrap();
        assert!(results.is_empty());
    }
}
