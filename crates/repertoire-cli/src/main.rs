use anyhow::Result;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use repertoire_core::RecordingQuery;
use repertoire_etl::{Config, Rubric};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "repertoire", version, about = "Repertoire - Classical music manager")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/repertoire/repertoire.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum LibraryFilter {
    Yes,
    No,
}

impl From<LibraryFilter> for bool {
    fn from(filter: LibraryFilter) -> Self {
        filter == LibraryFilter::Yes
    }
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Scrape random pages of a musicalifeiten.nl rubric
    ///
    /// Each page is a random letter of the rubric. Pages already in the
    /// database are skipped without being fetched. For every fetched page the
    /// raw HTML is stored and the first paragraphs are previewed.
    Scrape {
        /// Rubric to scrape: portretten, discografieen, mini_discografieen,
        /// vergelijkingen, mini_vergelijkingen
        #[arg(long, default_value = "portretten")]
        rubric: Rubric,

        /// Number of random pages to scrape
        #[arg(long, default_value_t = 1)]
        pages: u32,

        /// Seconds to wait between requests (default: from config)
        #[arg(long)]
        throttle: Option<f64>,
    },
    /// Query recordings in the database
    Query {
        /// Filter by composer name (substring, case-insensitive)
        #[arg(long)]
        composer: Option<String>,

        /// Filter by work title
        #[arg(long)]
        work: Option<String>,

        /// Filter by label name
        #[arg(long)]
        label: Option<String>,

        /// Filter by library status
        #[arg(long, value_enum)]
        library: Option<LibraryFilter>,

        /// Maximum number of results
        #[arg(long, default_value_t = repertoire_core::DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Start the JSON API server
    Server {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 5173)]
        port: u16,

        /// Log at debug level
        #[arg(long)]
        debug: bool,
    },
    /// Look up a release on Discogs
    #[command(group(
        ArgGroup::new("lookup")
            .required(true)
            .args(["url", "release", "catalog", "search"])
    ))]
    Discogs {
        /// Discogs release URL
        #[arg(long)]
        url: Option<String>,

        /// Discogs release ID
        #[arg(long)]
        release: Option<u64>,

        /// Catalog number to search for
        #[arg(long)]
        catalog: Option<String>,

        /// Label name, to narrow a catalog search
        #[arg(long, requires = "catalog")]
        label: Option<String>,

        /// Artist name, to narrow a catalog search
        #[arg(long, requires = "catalog")]
        artist: Option<String>,

        /// Free-text search
        #[arg(long)]
        search: Option<String>,

        /// Add the release to the database
        #[arg(long)]
        add: bool,
    },
    /// Standardize a composer name or work title via MusicBrainz
    #[command(group(
        ArgGroup::new("subject").required(true).args(["composer", "work"]).multiple(true)
    ))]
    Musicbrainz {
        /// Composer name to look up, or to narrow a work search
        #[arg(long)]
        composer: Option<String>,

        /// Work title to look up
        #[arg(long)]
        work: Option<String>,

        /// Add the found composer to the database
        #[arg(long, conflicts_with = "work")]
        add: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Create the config file with example content
    Init,
    /// Print an example config file
    Example,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let debug = cli.verbose || matches!(cli.command, Commands::Server { debug: true, .. });
    init_logging(debug);

    if let Commands::Config { action } = cli.command {
        return match action {
            ConfigAction::Show => commands::config::show_config(),
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Init => commands::config::init_config(),
            ConfigAction::Example => commands::config::show_example(),
        };
    }

    let config = Config::load_with_db_path(cli.db)?;

    match cli.command {
        Commands::Scrape {
            rubric,
            pages,
            throttle,
        } => {
            commands::run_scrape(&config, rubric, pages, throttle).await?;
        }
        Commands::Query {
            composer,
            work,
            label,
            library,
            limit,
        } => {
            let query = RecordingQuery {
                composer,
                work,
                label,
                in_library: library.map(bool::from),
                limit,
            };
            commands::run_query(&config, query)?;
        }
        Commands::Server { host, port, .. } => {
            commands::run_server(&config, &host, port).await?;
        }
        Commands::Discogs {
            url,
            release,
            catalog,
            label,
            artist,
            search,
            add,
        } => {
            let lookup = match (url, release, catalog, search) {
                (Some(url), ..) => commands::DiscogsLookup::Url(url),
                (_, Some(id), ..) => commands::DiscogsLookup::Release(id),
                (_, _, Some(catalog), _) => commands::DiscogsLookup::Catalog {
                    catalog,
                    label,
                    artist,
                },
                (_, _, _, Some(query)) => commands::DiscogsLookup::Search(query),
                (None, None, None, None) => {
                    anyhow::bail!("one of --url, --release, --catalog or --search is required")
                }
            };
            commands::run_discogs(&config, lookup, add).await?;
        }
        Commands::Musicbrainz {
            composer,
            work,
            add,
        } => {
            commands::run_musicbrainz(&config, composer, work, add).await?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scrape_defaults() {
        let cli = Cli::try_parse_from(["repertoire", "scrape"]).unwrap();
        match cli.command {
            Commands::Scrape {
                rubric,
                pages,
                throttle,
            } => {
                assert_eq!(rubric, Rubric::Portretten);
                assert_eq!(pages, 1);
                assert!(throttle.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_unknown_rubric_rejected() {
        assert!(Cli::try_parse_from(["repertoire", "scrape", "--rubric", "nieuws"]).is_err());
    }

    #[test]
    fn test_query_library_flag() {
        let cli =
            Cli::try_parse_from(["repertoire", "--db", "/tmp/r.db", "query", "--library", "no"])
                .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/r.db")));
        match cli.command {
            Commands::Query { library, limit, .. } => {
                assert_eq!(library.map(bool::from), Some(false));
                assert_eq!(limit, 100);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["repertoire", "query", "--library", "maybe"]).is_err());
    }

    #[test]
    fn test_server_defaults() {
        let cli = Cli::try_parse_from(["repertoire", "server"]).unwrap();
        match cli.command {
            Commands::Server { host, port, debug } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 5173);
                assert!(!debug);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_discogs_requires_one_lookup() {
        assert!(Cli::try_parse_from(["repertoire", "discogs"]).is_err());
        assert!(Cli::try_parse_from(["repertoire", "discogs", "--release", "1", "--search", "x"])
            .is_err());
        assert!(Cli::try_parse_from(["repertoire", "discogs", "--label", "DG"]).is_err());
        assert!(Cli::try_parse_from([
            "repertoire", "discogs", "--catalog", "439 947-2", "--label", "DG", "--add"
        ])
        .is_ok());
    }

    #[test]
    fn test_musicbrainz_arguments() {
        assert!(Cli::try_parse_from(["repertoire", "musicbrainz"]).is_err());
        assert!(Cli::try_parse_from(["repertoire", "musicbrainz", "--composer", "Bach", "--add"])
            .is_ok());
        assert!(Cli::try_parse_from([
            "repertoire", "musicbrainz", "--work", "Goldberg", "--composer", "Bach"
        ])
        .is_ok());
        assert!(
            Cli::try_parse_from(["repertoire", "musicbrainz", "--work", "Goldberg", "--add"])
                .is_err()
        );
    }
}
