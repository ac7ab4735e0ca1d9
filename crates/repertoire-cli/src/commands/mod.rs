pub mod config;
mod discogs;
mod musicbrainz;
mod query;
mod scrape;
mod server;

use anyhow::{Context, Result};
use repertoire_core::Database;
use repertoire_etl::Config;

pub use discogs::{run_discogs, DiscogsLookup};
pub use musicbrainz::run_musicbrainz;
pub use query::run_query;
pub use scrape::run_scrape;
pub use server::run_server;

/// Open the configured database, creating its directory if needed.
fn open_database(config: &Config) -> Result<Database> {
    let path = &config.database_path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Database::open(path).with_context(|| format!("Failed to open database {}", path.display()))
}
