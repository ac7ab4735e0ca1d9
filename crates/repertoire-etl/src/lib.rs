//! Data acquisition for repertoire.
//!
//! Scrapes musicalifeiten.nl into the catalog's page provenance, and looks
//! up releases and names on Discogs and MusicBrainz.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod enrich;
pub mod error;
pub mod ingest;
pub mod scrape;

pub use config::Config;
pub use enrich::discogs::{DiscogsClient, DiscogsRelease};
pub use enrich::musicbrainz::{ArtistMatch, MusicBrainzClient, WorkMatch};
pub use error::{EtlError, EtlResult};
pub use ingest::{scrape_pages, scrape_target, PageOutcome, PageStatus, ScrapeReport};
pub use scrape::{Rubric, ScrapeTarget, Scraper};
