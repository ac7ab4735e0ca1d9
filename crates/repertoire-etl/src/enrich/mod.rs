//! Clients for external catalogs used to enrich and import recordings.

pub mod discogs;
pub mod musicbrainz;
pub mod resilience;
