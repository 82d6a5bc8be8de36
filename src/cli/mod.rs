use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;

use crate::config;
use crate::http::server::HttpServer;
use crate::storage::TrackStore;
use crate::storage::operations::Storage;

#[derive(Parser)]
#[command(name = "trackdeck")]
#[command(version = "0.1")]
#[command(about = "Music track library served over HTTP")]
pub struct Cli {
    /// Path to the config TOML file. Defaults apply when omitted;
    /// PORT, BIND_ADDR and DB_PATH override either.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run http server exposing the track API
    Serve,
    /// Create the tracks table
    Setup {
        /// Drop the existing table first. Deletes every stored track
        #[arg(long)]
        reset: bool,
    },
    /// List stored tracks
    List,
}

/// Pings the store before serving. A failure aborts when `fail_fast` is set,
/// otherwise it is logged and requests keep retrying the connection.
fn check_connectivity(
    store: &mut impl TrackStore,
    location: &str,
    fail_fast: bool,
) -> anyhow::Result<()> {
    match store.ping() {
        Ok(()) => info!("Connection to database {location} successfully established"),
        Err(e) if fail_fast => bail!("Unable to connect to the database {location}: {e}"),
        Err(e) => error!("Unable to connect to the database {location}: {e}"),
    }
    Ok(())
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = config::Config::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Serve => {
            let mut storage = Storage::new(cfg.database.clone());
            let location = storage.location();
            check_connectivity(&mut storage, &location, cfg.database.fail_fast)?;

            HttpServer::new(storage, cfg.http).run()?;
        }

        Commands::Setup { reset } => {
            let mut storage = Storage::open(cfg.database)
                .with_context(|| "Unable to connect to the database")?;
            info!("Connection to database {} successfully established", storage.location());

            if *reset {
                storage
                    .reset_schema()
                    .with_context(|| "Failed to reset tracks table")?;
                info!("Tracks table recreated at {}", storage.location());
            } else {
                info!("Tracks table ready at {}", storage.location());
            }
        }

        Commands::List => {
            let mut storage = Storage::open(cfg.database)
                .with_context(|| "Unable to connect to the database")?;

            let tracks = storage.list_tracks()?;
            println!("{} tracks", tracks.len());

            for track in tracks {
                let fields = &track.fields;
                println!(
                    "  [{}] {} - {} ({}, {}) {}s, {}",
                    track.track_id,
                    fields.artist_name,
                    fields.song_title,
                    fields.album_name,
                    fields.release_year,
                    fields.duration,
                    fields.genre
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::track::{Track, TrackFields, TrackId, TrackPatch};
    use crate::storage::error::StorageError;
    use crate::storage::schema;
    use rusqlite::Connection;

    struct UnreachableStore;

    impl TrackStore for UnreachableStore {
        fn ping(&mut self) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("connection refused".into()))
        }

        fn list_tracks(&mut self) -> Result<Vec<Track>, StorageError> {
            unimplemented!()
        }

        fn get_track(&mut self, _id: TrackId) -> Result<Track, StorageError> {
            unimplemented!()
        }

        fn create_track(&mut self, _fields: TrackFields) -> Result<Track, StorageError> {
            unimplemented!()
        }

        fn update_track(&mut self, _id: TrackId, _patch: TrackPatch) -> Result<Track, StorageError> {
            unimplemented!()
        }

        fn delete_track(&mut self, _id: TrackId) -> Result<(), StorageError> {
            unimplemented!()
        }
    }

    #[test]
    fn test_fail_fast_aborts_on_unreachable_database() {
        let result = check_connectivity(&mut UnreachableStore, "test.db", true);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Unable to connect to the database test.db"), "{err}");
        assert!(err.contains("connection refused"), "{err}");
    }

    #[test]
    fn test_permissive_startup_continues_on_unreachable_database() {
        assert!(check_connectivity(&mut UnreachableStore, "test.db", false).is_ok());
    }

    #[test]
    fn test_reachable_database_passes_with_fail_fast() -> anyhow::Result<()> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        let mut storage = Storage::from_existing_conn(conn);
        let location = storage.location();

        check_connectivity(&mut storage, &location, true)?;
        Ok(())
    }
}
