//! Core catalog model for repertoire.
//!
//! This crate defines the classical-music catalog (composers, works,
//! performers, labels, recordings and scraped-page provenance) and the
//! SQLite store that deduplicates them by natural key.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod store;

pub use error::{Error, Result};
pub use model::{
    Composer, ComposerId, Credit, Label, LabelId, PageId, Performer, PerformerId, Recording,
    RecordingId, RecordingType, ScrapedPage, Work, WorkId,
};
pub use store::{CatalogStats, Database, RecordingQuery, DEFAULT_LIMIT};
