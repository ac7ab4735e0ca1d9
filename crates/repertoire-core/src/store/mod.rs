//! SQLite-backed catalog store.

mod catalog;
mod db;
mod pages;
mod query;
mod recordings;
mod tables;

pub use db::Database;
pub use query::{RecordingQuery, DEFAULT_LIMIT};
pub use recordings::CatalogStats;
pub use tables::SCHEMA;
