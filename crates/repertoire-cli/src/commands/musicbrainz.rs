use anyhow::Result;

use repertoire_etl::{ArtistMatch, Config, MusicBrainzClient};

use super::open_database;

pub async fn run_musicbrainz(
    config: &Config,
    composer: Option<String>,
    work: Option<String>,
    add: bool,
) -> Result<()> {
    let client = MusicBrainzClient::new(config.musicbrainz_contact.as_deref())?;

    if let Some(title) = work {
        match client.search_work(&title, composer.as_deref()).await? {
            Some(found) => {
                println!("Work: {}", found.title);
                println!("  MBID: {}", found.mbid);
                if let Some(ref work_type) = found.work_type {
                    println!("  Type: {}", work_type);
                }
                if let Some(ref composer) = found.composer {
                    println!("  Composer: {} ({})", composer.name, composer.mbid);
                }
            }
            None => println!("No MusicBrainz work found for {:?}", title),
        }
        return Ok(());
    }

    let Some(name) = composer else {
        anyhow::bail!("--composer or --work is required");
    };

    let Some(artist) = client.search_artist(&name, "Person").await? else {
        println!("No MusicBrainz composer found for {:?}", name);
        return Ok(());
    };

    print_artist(&artist);

    if add {
        let db = open_database(config)?;
        let stored = db.add_composer(artist.to_composer())?;
        if let Some(id) = stored.id {
            println!("\nStored composer {} as {}", stored.name, id);
        }
    }

    Ok(())
}

fn print_artist(artist: &ArtistMatch) {
    println!("Composer: {}", artist.name);
    println!("  MBID: {}", artist.mbid);
    if let Some(ref sort_name) = artist.sort_name {
        println!("  Sort name: {}", sort_name);
    }
    if let Some(ref country) = artist.country {
        println!("  Country: {}", country);
    }
    match (artist.birth_year(), artist.death_year()) {
        (Some(born), Some(died)) => println!("  Life: {}-{}", born, died),
        (Some(born), None) => println!("  Born: {}", born),
        _ => {}
    }
}
