//! Table definitions for the catalog.
//!
//! Every statement is idempotent, so the whole batch runs on each open.
//! Optional parts of a natural key are folded with `COALESCE` in the unique
//! indexes: an absent catalog number collides with another absent catalog
//! number instead of being treated as distinct `NULL`s.

pub const SCHEMA: &str = r#"
-- Composers
CREATE TABLE IF NOT EXISTS composers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    birth_year INTEGER,
    death_year INTEGER,
    nationality TEXT,
    biography TEXT,
    musicbrainz_id TEXT UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Works (owned by one composer)
CREATE TABLE IF NOT EXISTS works (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    composer_id INTEGER NOT NULL REFERENCES composers(id),
    title TEXT NOT NULL,
    catalog_number TEXT,
    key TEXT,
    opus TEXT,
    duration_seconds INTEGER,
    notes TEXT,
    musicbrainz_id TEXT UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_works_natural_key
    ON works(composer_id, title, COALESCE(catalog_number, ''));

-- Performers
CREATE TABLE IF NOT EXISTS performers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    performer_type TEXT,
    instrument TEXT,
    biography TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Labels
CREATE TABLE IF NOT EXISTS labels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    country TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Recordings (releases)
CREATE TABLE IF NOT EXISTS recordings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    recording_type TEXT NOT NULL DEFAULT 'studio'
        CHECK (recording_type IN ('studio', 'live', 'broadcast', 'other')),
    label_id INTEGER REFERENCES labels(id),
    catalog_number TEXT,
    ean TEXT,
    release_year INTEGER,
    recording_year INTEGER,
    duration_seconds INTEGER,
    cover_url TEXT,
    discogs_id INTEGER UNIQUE,
    discogs_url TEXT,
    notes TEXT,
    in_library INTEGER NOT NULL DEFAULT 0 CHECK (in_library IN (0, 1)),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_recordings_natural_key
    ON recordings(title, COALESCE(catalog_number, ''), COALESCE(label_id, 0));
CREATE INDEX IF NOT EXISTS idx_recordings_label_id ON recordings(label_id);

-- Recording <-> Work (track list)
CREATE TABLE IF NOT EXISTS recording_works (
    recording_id INTEGER NOT NULL REFERENCES recordings(id) ON DELETE CASCADE,
    work_id INTEGER NOT NULL REFERENCES works(id),
    track_number INTEGER,
    PRIMARY KEY (recording_id, work_id)
);

CREATE INDEX IF NOT EXISTS idx_recording_works_work_id ON recording_works(work_id);

-- Recording <-> Performer (credits)
CREATE TABLE IF NOT EXISTS recording_performers (
    recording_id INTEGER NOT NULL REFERENCES recordings(id) ON DELETE CASCADE,
    performer_id INTEGER NOT NULL REFERENCES performers(id),
    role TEXT,
    PRIMARY KEY (recording_id, performer_id)
);

-- Scraped pages (fetch provenance)
CREATE TABLE IF NOT EXISTS scraped_pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    rubric TEXT NOT NULL,
    letter TEXT,
    page_number INTEGER,
    scraped_at TEXT NOT NULL,
    raw_content TEXT,
    notes TEXT
);
"#;
