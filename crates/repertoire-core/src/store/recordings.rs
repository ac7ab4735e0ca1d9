use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Credit, Recording, RecordingId};

use super::catalog::{
    prefixed_composer_columns, row_to_label, row_to_performer, row_to_work_with_composer,
    upsert_label, upsert_performer, upsert_work, LABEL_COLUMNS, WORK_WITH_COMPOSER_COLUMNS,
};
use super::db::{get_timestamp, is_unique_violation, Database};

pub(super) const RECORDING_COLUMNS: &str = "r.id, r.title, r.recording_type, r.label_id, \
     r.catalog_number, r.ean, r.release_year, r.recording_year, r.duration_seconds, \
     r.cover_url, r.discogs_id, r.discogs_url, r.notes, r.in_library, r.created_at, r.updated_at";

/// Catalog-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_recordings: i64,
    pub in_library: i64,
    /// Distinct composers with at least one work on a recording.
    pub unique_composers: i64,
}

/// Map a recording row (no children) in [`RECORDING_COLUMNS`] order.
pub(super) fn row_to_recording(row: &Row) -> rusqlite::Result<Recording> {
    Ok(Recording {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        recording_type: row.get(2)?,
        label_id: row.get(3)?,
        label: None,
        catalog_number: row.get(4)?,
        ean: row.get(5)?,
        release_year: row.get(6)?,
        recording_year: row.get(7)?,
        duration_seconds: row.get(8)?,
        cover_url: row.get(9)?,
        discogs_id: row.get(10)?,
        discogs_url: row.get(11)?,
        notes: row.get(12)?,
        in_library: row.get(13)?,
        performers: Vec::new(),
        works: Vec::new(),
        created_at: get_timestamp(row, 14)?,
        updated_at: get_timestamp(row, 15)?,
    })
}

/// Load label, credits and track list into a recording read from its row.
pub(super) fn hydrate(conn: &Connection, recording: &mut Recording) -> Result<()> {
    let Some(id) = recording.id else {
        return Ok(());
    };

    if let Some(label_id) = recording.label_id {
        let sql = format!("SELECT {LABEL_COLUMNS} FROM labels WHERE id = ?1");
        recording.label = conn
            .query_row(&sql, [label_id], |row| row_to_label(row, 0))
            .optional()?;
    }

    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, p.performer_type, p.instrument, p.biography,
                p.created_at, p.updated_at, rp.role
         FROM recording_performers rp
         JOIN performers p ON p.id = rp.performer_id
         WHERE rp.recording_id = ?1
         ORDER BY p.id",
    )?;
    recording.performers = stmt
        .query_map([id], |row| {
            Ok(Credit {
                performer: row_to_performer(row, 0)?,
                role: row.get(7)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let sql = format!(
        "SELECT {WORK_WITH_COMPOSER_COLUMNS}, rw.track_number, {composers}
         FROM recording_works rw
         JOIN works w ON w.id = rw.work_id
         JOIN composers c ON c.id = w.composer_id
         WHERE rw.recording_id = ?1
         ORDER BY rw.track_number, w.id",
        composers = prefixed_composer_columns(),
    );
    let mut stmt = conn.prepare(&sql)?;
    recording.works = stmt
        .query_map([id], row_to_work_with_composer)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(())
}

impl Database {
    // ========== Recording Operations ==========

    /// Add a recording with its label, performer credits and works.
    ///
    /// Everything happens in one transaction. Embedded entities without an
    /// identifier are upserted; the returned recording carries every id.
    /// Credits and tracks are linked idempotently, so a performer or work
    /// listed twice yields one junction row (the first track number wins).
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateRecording`] when a recording with the same title,
    /// catalog number and label, or the same Discogs ID, already exists. No
    /// part of the rejected recording is persisted.
    pub fn add_recording(&mut self, mut recording: Recording) -> Result<Recording> {
        let tx = self.conn.transaction()?;

        if recording.label_id.is_none() {
            if let Some(label) = recording.label.as_mut() {
                recording.label_id = Some(upsert_label(&tx, label)?);
            }
        }

        let inserted = tx.execute(
            "INSERT INTO recordings (title, recording_type, label_id, catalog_number, ean,
                                     release_year, recording_year, duration_seconds, cover_url,
                                     discogs_id, discogs_url, notes, in_library,
                                     created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                recording.title,
                recording.recording_type,
                recording.label_id,
                recording.catalog_number,
                recording.ean,
                recording.release_year,
                recording.recording_year,
                recording.duration_seconds,
                recording.cover_url,
                recording.discogs_id,
                recording.discogs_url,
                recording.notes,
                recording.in_library,
                recording.created_at.to_rfc3339(),
                recording.updated_at.to_rfc3339(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                log::warn!("Rejected duplicate recording: {}", recording.title);
                return Err(Error::DuplicateRecording {
                    title: recording.title,
                    catalog_number: recording.catalog_number,
                });
            }
            Err(err) => return Err(err.into()),
        }
        let recording_id = RecordingId::new(tx.last_insert_rowid());

        for credit in &mut recording.performers {
            let performer_id = match credit.performer.id {
                Some(id) => id,
                None => upsert_performer(&tx, &mut credit.performer)?,
            };
            tx.execute(
                "INSERT OR IGNORE INTO recording_performers (recording_id, performer_id, role)
                 VALUES (?1, ?2, ?3)",
                params![recording_id, performer_id, credit.role],
            )?;
        }

        let mut track_number: i64 = 0;
        for work in &mut recording.works {
            track_number += 1;
            let work_id = match work.id {
                Some(id) => id,
                None => upsert_work(&tx, work)?,
            };
            tx.execute(
                "INSERT OR IGNORE INTO recording_works (recording_id, work_id, track_number)
                 VALUES (?1, ?2, ?3)",
                params![recording_id, work_id, track_number],
            )?;
        }

        tx.commit()?;

        log::info!("Added recording {}: {}", recording_id, recording.title);
        recording.id = Some(recording_id);
        Ok(recording)
    }

    /// Get a hydrated recording by ID.
    pub fn get_recording(&self, id: RecordingId) -> Result<Option<Recording>> {
        let sql = format!("SELECT {RECORDING_COLUMNS} FROM recordings r WHERE r.id = ?1");
        let recording = self
            .conn
            .query_row(&sql, [id], row_to_recording)
            .optional()?;

        match recording {
            Some(mut recording) => {
                hydrate(&self.conn, &mut recording)?;
                Ok(Some(recording))
            }
            None => Ok(None),
        }
    }

    /// Delete a recording and its credit and track rows. Returns whether a
    /// row was removed. Works, performers and labels are kept.
    pub fn delete_recording(&self, id: RecordingId) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM recordings WHERE id = ?1", [id])?;
        if removed > 0 {
            log::info!("Deleted recording {}", id);
        }
        Ok(removed > 0)
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        let stats = self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM recordings),
                (SELECT COUNT(*) FROM recordings WHERE in_library = 1),
                (SELECT COUNT(DISTINCT w.composer_id)
                   FROM recording_works rw JOIN works w ON w.id = rw.work_id)",
            [],
            |row| {
                Ok(CatalogStats {
                    total_recordings: row.get(0)?,
                    in_library: row.get(1)?,
                    unique_composers: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }
}
