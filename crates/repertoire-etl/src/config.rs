use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for repertoire.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (REPERTOIRE_* prefix)
/// 3. Config file (~/.config/repertoire/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Discogs personal access token. Without it Discogs allows one request
    /// per second instead of four.
    ///
    /// Can be set via:
    /// - ENV: REPERTOIRE_DISCOGS_TOKEN
    /// - Config: discogs_token = "..."
    #[serde(default)]
    pub discogs_token: Option<String>,

    /// Contact (email or URL) sent in the MusicBrainz user agent.
    #[serde(default)]
    pub musicbrainz_contact: Option<String>,

    /// Path to the SQLite database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: REPERTOIRE_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/repertoire/repertoire.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Seconds to wait between scrape requests.
    #[serde(default = "default_throttle_seconds")]
    pub throttle_seconds: f64,

    /// Per-request timeout for scraping, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discogs_token: None,
            musicbrainz_contact: None,
            database_path: default_db_path(),
            throttle_seconds: default_throttle_seconds(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/repertoire/config.toml
    /// Reads environment variables with REPERTOIRE_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("repertoire");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;
        config.validate()?;
        log::debug!("Loaded configuration from {}", config_path.display());

        Ok(config)
    }

    /// Load configuration, overriding the database path when the --db CLI
    /// flag is given.
    pub fn load_with_db_path(db_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::load()?;
        if let Some(path) = db_path {
            config.database_path = path;
        }
        Ok(config)
    }

    /// Reject settings that cannot be used as given.
    ///
    /// # Errors
    ///
    /// Returns an error if `throttle_seconds` is negative or not finite.
    pub fn validate(&self) -> Result<()> {
        if !self.throttle_seconds.is_finite() || self.throttle_seconds < 0.0 {
            anyhow::bail!(
                "throttle_seconds must be a non-negative number of seconds, got {}",
                self.throttle_seconds
            );
        }
        Ok(())
    }

    pub fn throttle(&self) -> Duration {
        Duration::try_from_secs_f64(self.throttle_seconds).unwrap_or(Duration::ZERO)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_throttle_seconds() -> f64 {
    1.0
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Get the default database path.
///
/// Returns: ~/.local/share/repertoire/repertoire.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("repertoire")
        .join("repertoire.db")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/repertoire/config.toml
/// - macOS: ~/Library/Application Support/repertoire/config.toml
/// - Windows: %APPDATA%\repertoire\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("repertoire")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Repertoire Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (REPERTOIRE_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Discogs personal access token
# Raises the Discogs rate limit from 1 to 4 requests per second
#
# Generate one at: https://www.discogs.com/settings/developers
#
# Can also be set via:
# - Environment: REPERTOIRE_DISCOGS_TOKEN=your-token-here
#discogs_token = "your-discogs-token-here"

# Contact sent to MusicBrainz in the User-Agent header
#musicbrainz_contact = "you@example.org"

# Path to the SQLite database
#
# Can also be set via:
# - CLI: repertoire --db /custom/path.db query
# - Environment: REPERTOIRE_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/repertoire.db"

# Seconds between scrape requests to musicalifeiten.nl
throttle_seconds = 1.0

# Per-request timeout for scraping, in seconds
request_timeout_secs = 10
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
