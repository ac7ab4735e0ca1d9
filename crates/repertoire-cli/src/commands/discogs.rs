use anyhow::{Context, Result};

use repertoire_etl::enrich::discogs::extract_release_id;
use repertoire_etl::{Config, DiscogsClient, DiscogsRelease};

use super::open_database;

/// How to find the release.
#[derive(Debug, Clone)]
pub enum DiscogsLookup {
    Url(String),
    Release(u64),
    Catalog {
        catalog: String,
        label: Option<String>,
        artist: Option<String>,
    },
    Search(String),
}

pub async fn run_discogs(config: &Config, lookup: DiscogsLookup, add: bool) -> Result<()> {
    let client = DiscogsClient::new(config.discogs_token.clone())?;
    if !client.is_authenticated() {
        log::info!("No Discogs token configured, using the unauthenticated rate limit");
    }

    let release = match lookup {
        DiscogsLookup::Url(url) => {
            let id = extract_release_id(&url)
                .with_context(|| format!("Not a Discogs release URL: {url}"))?;
            client.get_release(id).await?
        }
        DiscogsLookup::Release(id) => client.get_release(id).await?,
        DiscogsLookup::Catalog {
            catalog,
            label,
            artist,
        } => {
            client
                .find_release(Some(&catalog), label.as_deref(), artist.as_deref(), None)
                .await?
        }
        DiscogsLookup::Search(query) => client.find_release(None, None, None, Some(&query)).await?,
    };

    let Some(release) = release else {
        println!("No matching release found on Discogs.");
        return Ok(());
    };

    print_release(&release);

    if add {
        let mut db = open_database(config)?;
        match db.add_recording(release.to_recording()) {
            Ok(recording) => {
                if let Some(id) = recording.id {
                    println!("\nAdded as recording {}", id);
                }
            }
            Err(e) if e.is_duplicate() => {
                println!("\nAlready in the database: {}", release.title);
            }
            Err(e) => return Err(e).context("Failed to add release"),
        }
    }

    Ok(())
}

fn print_release(release: &DiscogsRelease) {
    println!("{}", release.title);
    println!("  Discogs: {} ({})", release.release_id, release.url);
    if let Some(ref artists) = release.artists {
        println!("  Artists: {}", artists);
    }
    if let Some(ref label) = release.label_name {
        println!("  Label: {}", label);
    }
    if let Some(ref catalog) = release.catalog_number {
        println!("  Catalog: {}", catalog);
    }
    if let Some(year) = release.year {
        println!("  Year: {}", year);
    }
    if let Some(ref country) = release.country {
        println!("  Country: {}", country);
    }
    if let Some(ref ean) = release.ean {
        println!("  EAN: {}", ean);
    }
    for credit in &release.extra_artists {
        println!("  Credit: {}", credit);
    }
    if !release.tracklist.is_empty() {
        println!("  Tracks:");
        for track in &release.tracklist {
            println!(
                "    {:>4} {}{}",
                track.position.as_deref().unwrap_or(""),
                track.title,
                track
                    .duration
                    .as_deref()
                    .map(|d| format!(" ({d})"))
                    .unwrap_or_default()
            );
        }
    }
}
