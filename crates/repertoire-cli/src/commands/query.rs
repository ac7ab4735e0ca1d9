use anyhow::Result;

use repertoire_core::{Recording, RecordingQuery};
use repertoire_etl::Config;

use super::open_database;

pub fn run_query(config: &Config, query: RecordingQuery) -> Result<()> {
    let db = open_database(config)?;
    let recordings = db.get_recordings(&query)?;

    println!("Found {} recording(s):\n", recordings.len());
    for recording in &recordings {
        print_recording(recording);
    }

    Ok(())
}

fn print_recording(recording: &Recording) {
    println!("Title: {}", recording.title);
    if let Some(ref label) = recording.label {
        println!("Label: {}", label.name);
    }
    if let Some(ref catalog) = recording.catalog_number {
        println!("Catalog: {}", catalog);
    }
    if let Some(year) = recording.release_year {
        println!("Year: {}", year);
    }
    for work in &recording.works {
        match work.composer {
            Some(ref composer) => println!("  {}: {}", composer.name, work.title),
            None => println!("  {}", work.title),
        }
    }
    for credit in &recording.performers {
        match credit.role {
            Some(ref role) => println!("  {} ({})", credit.performer.name, role),
            None => println!("  {}", credit.performer.name),
        }
    }
    if recording.in_library {
        println!("In library");
    }
    println!();
}
