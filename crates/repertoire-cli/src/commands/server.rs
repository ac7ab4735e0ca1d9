use anyhow::{Context, Result};

use repertoire_etl::Config;

use super::open_database;

pub async fn run_server(config: &Config, host: &str, port: u16) -> Result<()> {
    let db = open_database(config)?;

    println!("Starting Repertoire server on {}:{}", host, port);
    println!("Open http://{}:{} in your browser", host, port);

    repertoire_web::serve(db, host, port)
        .await
        .with_context(|| format!("Server on {host}:{port} failed"))
}
