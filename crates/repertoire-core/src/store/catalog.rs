use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Error, Result};
use crate::model::{Composer, ComposerId, Label, LabelId, Performer, PerformerId, Work, WorkId};

use super::db::{get_timestamp, resolve_conflict, Database};

pub(super) const COMPOSER_COLUMNS: &str = "id, name, birth_year, death_year, nationality, \
     biography, musicbrainz_id, created_at, updated_at";

const PERFORMER_COLUMNS: &str =
    "id, name, performer_type, instrument, biography, created_at, updated_at";

pub(super) const LABEL_COLUMNS: &str = "id, name, country, created_at, updated_at";

// Upserts are free functions over a plain connection so `add_recording` can
// run them inside its transaction.

/// Insert a composer, or resolve it to the existing row with the same name
/// (falling back to the same `MusicBrainz` ID).
pub(super) fn upsert_composer(conn: &Connection, composer: &mut Composer) -> Result<ComposerId> {
    let inserted = conn.execute(
        "INSERT INTO composers (name, birth_year, death_year, nationality, biography,
                                musicbrainz_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            composer.name,
            composer.birth_year,
            composer.death_year,
            composer.nationality,
            composer.biography,
            composer.musicbrainz_id,
            composer.created_at.to_rfc3339(),
            composer.updated_at.to_rfc3339(),
        ],
    );

    let id: ComposerId = resolve_conflict(conn, inserted, "composer", || {
        let by_name = conn
            .query_row(
                "SELECT id FROM composers WHERE name = ?1",
                [&composer.name],
                |row| row.get(0),
            )
            .optional()?;
        match (by_name, &composer.musicbrainz_id) {
            (Some(id), _) => Ok(Some(id)),
            (None, Some(mbid)) => conn
                .query_row(
                    "SELECT id FROM composers WHERE musicbrainz_id = ?1",
                    [mbid],
                    |row| row.get(0),
                )
                .optional(),
            (None, None) => Ok(None),
        }
    })?;

    composer.id = Some(id);
    Ok(id)
}

pub(super) fn upsert_performer(conn: &Connection, performer: &mut Performer) -> Result<PerformerId> {
    let inserted = conn.execute(
        "INSERT INTO performers (name, performer_type, instrument, biography, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            performer.name,
            performer.performer_type,
            performer.instrument,
            performer.biography,
            performer.created_at.to_rfc3339(),
            performer.updated_at.to_rfc3339(),
        ],
    );

    let id: PerformerId = resolve_conflict(conn, inserted, "performer", || {
        conn.query_row(
            "SELECT id FROM performers WHERE name = ?1",
            [&performer.name],
            |row| row.get(0),
        )
        .optional()
    })?;

    performer.id = Some(id);
    Ok(id)
}

pub(super) fn upsert_label(conn: &Connection, label: &mut Label) -> Result<LabelId> {
    let inserted = conn.execute(
        "INSERT INTO labels (name, country, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            label.name,
            label.country,
            label.created_at.to_rfc3339(),
            label.updated_at.to_rfc3339(),
        ],
    );

    let id: LabelId = resolve_conflict(conn, inserted, "label", || {
        conn.query_row(
            "SELECT id FROM labels WHERE name = ?1",
            [&label.name],
            |row| row.get(0),
        )
        .optional()
    })?;

    label.id = Some(id);
    Ok(id)
}

/// Insert a work, resolving its composer first.
///
/// A work without `composer_id` has its embedded composer upserted. A work
/// with neither is rejected. On conflict the existing row wins: its fields
/// are never overwritten.
pub(super) fn upsert_work(conn: &Connection, work: &mut Work) -> Result<WorkId> {
    let composer_id = match (work.composer_id, work.composer.as_mut()) {
        (Some(id), _) => id,
        (None, Some(composer)) => upsert_composer(conn, composer)?,
        (None, None) => {
            return Err(Error::InvalidData(format!(
                "work {:?} has no composer",
                work.title
            )))
        }
    };
    work.composer_id = Some(composer_id);

    let inserted = conn.execute(
        "INSERT INTO works (composer_id, title, catalog_number, key, opus, duration_seconds,
                            notes, musicbrainz_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            composer_id,
            work.title,
            work.catalog_number,
            work.key,
            work.opus,
            work.duration_seconds,
            work.notes,
            work.musicbrainz_id,
            work.created_at.to_rfc3339(),
            work.updated_at.to_rfc3339(),
        ],
    );

    let id: WorkId = resolve_conflict(conn, inserted, "work", || {
        let by_key = conn
            .query_row(
                "SELECT id FROM works
                 WHERE composer_id = ?1 AND title = ?2
                   AND COALESCE(catalog_number, '') = COALESCE(?3, '')",
                params![composer_id, work.title, work.catalog_number],
                |row| row.get(0),
            )
            .optional()?;
        match (by_key, &work.musicbrainz_id) {
            (Some(id), _) => Ok(Some(id)),
            (None, Some(mbid)) => conn
                .query_row(
                    "SELECT id FROM works WHERE musicbrainz_id = ?1",
                    [mbid],
                    |row| row.get(0),
                )
                .optional(),
            (None, None) => Ok(None),
        }
    })?;

    work.id = Some(id);
    Ok(id)
}

/// Map a composer row whose columns start at `offset`, in
/// [`COMPOSER_COLUMNS`] order.
pub(super) fn row_to_composer(row: &Row, offset: usize) -> rusqlite::Result<Composer> {
    Ok(Composer {
        id: Some(row.get(offset)?),
        name: row.get(offset + 1)?,
        birth_year: row.get(offset + 2)?,
        death_year: row.get(offset + 3)?,
        nationality: row.get(offset + 4)?,
        biography: row.get(offset + 5)?,
        musicbrainz_id: row.get(offset + 6)?,
        created_at: get_timestamp(row, offset + 7)?,
        updated_at: get_timestamp(row, offset + 8)?,
    })
}

/// Map a performer row in `PERFORMER_COLUMNS` order.
pub(super) fn row_to_performer(row: &Row, offset: usize) -> rusqlite::Result<Performer> {
    Ok(Performer {
        id: Some(row.get(offset)?),
        name: row.get(offset + 1)?,
        performer_type: row.get(offset + 2)?,
        instrument: row.get(offset + 3)?,
        biography: row.get(offset + 4)?,
        created_at: get_timestamp(row, offset + 5)?,
        updated_at: get_timestamp(row, offset + 6)?,
    })
}

pub(super) fn row_to_label(row: &Row, offset: usize) -> rusqlite::Result<Label> {
    Ok(Label {
        id: Some(row.get(offset)?),
        name: row.get(offset + 1)?,
        country: row.get(offset + 2)?,
        created_at: get_timestamp(row, offset + 3)?,
        updated_at: get_timestamp(row, offset + 4)?,
    })
}

/// Map a work row (10 columns) followed by its composer's columns.
pub(super) fn row_to_work_with_composer(row: &Row) -> rusqlite::Result<Work> {
    let composer = row_to_composer(row, 11)?;
    Ok(Work {
        id: Some(row.get(0)?),
        composer_id: composer.id,
        composer: Some(composer),
        title: row.get(1)?,
        catalog_number: row.get(2)?,
        key: row.get(3)?,
        opus: row.get(4)?,
        duration_seconds: row.get(5)?,
        notes: row.get(6)?,
        musicbrainz_id: row.get(7)?,
        created_at: get_timestamp(row, 8)?,
        updated_at: get_timestamp(row, 9)?,
    })
}

/// Work columns for [`row_to_work_with_composer`], aliased `w` and joined to
/// composers aliased `c`. Column 10 is left free for the caller (track number).
pub(super) const WORK_WITH_COMPOSER_COLUMNS: &str = "w.id, w.title, w.catalog_number, w.key, \
     w.opus, w.duration_seconds, w.notes, w.musicbrainz_id, w.created_at, w.updated_at";

impl Database {
    // ========== Composer Operations ==========

    /// Add a composer, returning it with its identifier.
    ///
    /// Adding a composer whose name is already catalogued returns the existing
    /// identifier and leaves the stored row untouched.
    pub fn add_composer(&self, mut composer: Composer) -> Result<Composer> {
        upsert_composer(&self.conn, &mut composer)?;
        Ok(composer)
    }

    /// Look up a composer by exact name.
    pub fn get_composer(&self, name: &str) -> Result<Option<Composer>> {
        let sql = format!("SELECT {COMPOSER_COLUMNS} FROM composers WHERE name = ?1");
        let composer = self
            .conn
            .query_row(&sql, [name], |row| row_to_composer(row, 0))
            .optional()?;
        Ok(composer)
    }

    // ========== Performer Operations ==========

    pub fn add_performer(&self, mut performer: Performer) -> Result<Performer> {
        upsert_performer(&self.conn, &mut performer)?;
        Ok(performer)
    }

    pub fn get_performer(&self, name: &str) -> Result<Option<Performer>> {
        let sql = format!("SELECT {PERFORMER_COLUMNS} FROM performers WHERE name = ?1");
        let performer = self
            .conn
            .query_row(&sql, [name], |row| row_to_performer(row, 0))
            .optional()?;
        Ok(performer)
    }

    // ========== Label Operations ==========

    pub fn add_label(&self, mut label: Label) -> Result<Label> {
        upsert_label(&self.conn, &mut label)?;
        Ok(label)
    }

    pub fn get_label(&self, name: &str) -> Result<Option<Label>> {
        let sql = format!("SELECT {LABEL_COLUMNS} FROM labels WHERE name = ?1");
        let label = self
            .conn
            .query_row(&sql, [name], |row| row_to_label(row, 0))
            .optional()?;
        Ok(label)
    }

    // ========== Work Operations ==========

    /// Add a work, returning it with its identifier and resolved composer.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidData`] when the work has neither a composer identifier
    /// nor an embedded composer.
    pub fn add_work(&self, mut work: Work) -> Result<Work> {
        upsert_work(&self.conn, &mut work)?;
        Ok(work)
    }

    /// All works of one composer, ordered by title.
    pub fn get_works_by_composer(&self, composer_id: ComposerId) -> Result<Vec<Work>> {
        let sql = format!(
            "SELECT {WORK_WITH_COMPOSER_COLUMNS}, NULL, {composers}
             FROM works w JOIN composers c ON c.id = w.composer_id
             WHERE w.composer_id = ?1
             ORDER BY w.title, w.id",
            composers = prefixed_composer_columns(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let works = stmt
            .query_map([composer_id], row_to_work_with_composer)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(works)
    }
}

/// [`COMPOSER_COLUMNS`] qualified with the `c` alias.
pub(super) fn prefixed_composer_columns() -> String {
    COMPOSER_COLUMNS
        .split(", ")
        .map(|column| format!("c.{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.conn()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_add_composer_assigns_id() {
        let db = test_db();
        let composer = db.add_composer(Composer::new("Johann Sebastian Bach")).unwrap();
        assert!(composer.id.is_some());
    }

    #[test]
    fn test_add_composer_is_idempotent() {
        let db = test_db();
        let first = db.add_composer(Composer::new("Frédéric Chopin")).unwrap();
        let second = db.add_composer(Composer::new("Frédéric Chopin")).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(count(&db, "composers"), 1);
    }

    #[test]
    fn test_add_composer_conflict_keeps_stored_fields() {
        let db = test_db();
        db.add_composer(Composer::new("Frédéric Chopin").with_life(1810, 1849))
            .unwrap();
        db.add_composer(Composer::new("Frédéric Chopin").with_nationality("Polish"))
            .unwrap();

        let stored = db.get_composer("Frédéric Chopin").unwrap().unwrap();
        assert_eq!(stored.birth_year, Some(1810));
        assert_eq!(stored.death_year, Some(1849));
        assert!(stored.nationality.is_none());
    }

    #[test]
    fn test_composer_conflict_on_musicbrainz_id() {
        let db = test_db();
        let first = db
            .add_composer(Composer::new("J. S. Bach").with_musicbrainz_id("24f1766e"))
            .unwrap();
        let second = db
            .add_composer(Composer::new("Johann Sebastian Bach").with_musicbrainz_id("24f1766e"))
            .unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_get_composer_missing() {
        let db = test_db();
        assert!(db.get_composer("Nobody").unwrap().is_none());
    }

    #[test]
    fn test_add_performer_and_label_idempotent() {
        let db = test_db();
        let p1 = db.add_performer(Performer::new("Glenn Gould").with_instrument("piano")).unwrap();
        let p2 = db.add_performer(Performer::new("Glenn Gould")).unwrap();
        assert_eq!(p1.id, p2.id);
        assert_eq!(
            db.get_performer("Glenn Gould").unwrap().unwrap().instrument.as_deref(),
            Some("piano")
        );

        let l1 = db.add_label(Label::new("Sony Classical").with_country("US")).unwrap();
        let l2 = db.add_label(Label::new("Sony Classical")).unwrap();
        assert_eq!(l1.id, l2.id);
        assert_eq!(count(&db, "labels"), 1);
    }

    #[test]
    fn test_add_work_upserts_embedded_composer() {
        let db = test_db();
        let work = db
            .add_work(Work::new("Ballade No. 1").with_composer(Composer::new("Frédéric Chopin")))
            .unwrap();

        let composer = db.get_composer("Frédéric Chopin").unwrap().unwrap();
        assert_eq!(work.composer_id, composer.id);
        assert_eq!(work.composer.and_then(|c| c.id), composer.id);
    }

    #[test]
    fn test_add_work_without_composer_is_invalid() {
        let db = test_db();
        let err = db.add_work(Work::new("Orphan")).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert_eq!(count(&db, "works"), 0);
    }

    #[test]
    fn test_add_work_with_unknown_composer_id_fails() {
        let db = test_db();
        let err = db
            .add_work(Work::new("Orphan").with_composer_id(ComposerId::new(999)))
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_add_work_conflict_does_not_overwrite() {
        let db = test_db();
        let chopin = db.add_composer(Composer::new("Frédéric Chopin")).unwrap();
        let chopin_id = chopin.id.unwrap();

        let first = db
            .add_work(
                Work::new("Nocturne")
                    .with_composer_id(chopin_id)
                    .with_catalog_number("Op. 9 No. 2")
                    .with_key("E-flat major"),
            )
            .unwrap();
        let second = db
            .add_work(
                Work::new("Nocturne")
                    .with_composer_id(chopin_id)
                    .with_catalog_number("Op. 9 No. 2")
                    .with_key("C minor"),
            )
            .unwrap();

        assert_eq!(first.id, second.id);
        let works = db.get_works_by_composer(chopin_id).unwrap();
        assert_eq!(works.len(), 1);
        assert_eq!(works[0].key.as_deref(), Some("E-flat major"));
    }

    #[test]
    fn test_works_without_catalog_number_collide() {
        let db = test_db();
        let composer_id = db.add_composer(Composer::new("Erik Satie")).unwrap().id.unwrap();

        let a = db.add_work(Work::new("Gymnopédie").with_composer_id(composer_id)).unwrap();
        let b = db.add_work(Work::new("Gymnopédie").with_composer_id(composer_id)).unwrap();
        assert_eq!(a.id, b.id);

        let c = db
            .add_work(Work::new("Gymnopédie").with_composer_id(composer_id).with_catalog_number("No. 1"))
            .unwrap();
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_same_title_different_composers() {
        let db = test_db();
        let w1 = db
            .add_work(Work::new("Requiem").with_composer(Composer::new("Wolfgang Amadeus Mozart")))
            .unwrap();
        let w2 = db
            .add_work(Work::new("Requiem").with_composer(Composer::new("Gabriel Fauré")))
            .unwrap();
        assert_ne!(w1.id, w2.id);
    }

    #[test]
    fn test_get_works_by_composer_attaches_composer() {
        let db = test_db();
        let bach = db.add_composer(Composer::new("Johann Sebastian Bach")).unwrap();
        let bach_id = bach.id.unwrap();
        db.add_work(Work::new("Goldberg Variations").with_composer_id(bach_id).with_catalog_number("BWV 988"))
            .unwrap();
        db.add_work(Work::new("Cello Suite No. 1").with_composer_id(bach_id).with_catalog_number("BWV 1007"))
            .unwrap();

        let works = db.get_works_by_composer(bach_id).unwrap();
        assert_eq!(works.len(), 2);
        assert_eq!(works[0].title, "Cello Suite No. 1");
        assert!(works
            .iter()
            .all(|w| w.composer.as_ref().map(|c| c.name.as_str()) == Some("Johann Sebastian Bach")));
    }
}
