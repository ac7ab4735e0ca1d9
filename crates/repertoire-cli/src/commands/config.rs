use anyhow::Result;
use repertoire_etl::{config, Config};

/// Show the current effective configuration.
pub fn show_config() -> Result<()> {
    let config = Config::load()?;
    let path = config::config_file_path();

    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", path.display());
    println!(
        "File exists: {}\n",
        if path.exists() { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!(
        "  discogs_token: {}",
        if config.discogs_token.is_some() { "<set>" } else { "<not set>" }
    );
    println!(
        "  musicbrainz_contact: {}",
        config.musicbrainz_contact.as_deref().unwrap_or("<not set>")
    );
    println!("  database_path: {}", config.database_path.display());
    println!("  throttle_seconds: {}", config.throttle_seconds);
    println!("  request_timeout_secs: {}", config.request_timeout_secs);

    println!("\nPriority: CLI args > ENV vars (REPERTOIRE_*) > Config file > Defaults");

    Ok(())
}

/// Print the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Write the example config file unless one exists.
pub fn init_config() -> Result<()> {
    let path = config::config_file_path();
    if config::ensure_config_file()? {
        println!("Created config file: {}", path.display());
    } else {
        println!("Config file already exists: {}", path.display());
    }
    Ok(())
}

pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}
