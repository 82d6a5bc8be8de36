use std::path::Path;

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;

use crate::{
    config::Database,
    storage::{error::StorageError, schema},
};

fn open_in_memory() -> Result<rusqlite::Connection, rusqlite::Error> {
    Connection::open_in_memory()
}

fn open_from_file(path: &Path) -> Result<rusqlite::Connection, StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create database directory {}", parent.display()))
            .map_err(StorageError::Internal)?;
    }
    Ok(Connection::open(path)?)
}

/// Opens a connection and makes sure the schema exists.
pub fn open(config: &Database) -> Result<rusqlite::Connection, StorageError> {
    let db = if config.in_memory {
        open_in_memory()?
    } else {
        open_from_file(&config.path)?
    };
    schema::init(&db)?;
    Ok(db)
}

/// Round-trip to the database, used as a connectivity check.
pub fn ping(conn: &Connection) -> Result<(), StorageError> {
    let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
    if one != 1 {
        return Err(StorageError::Unavailable(format!(
            "unexpected connectivity check result {one}"
        )));
    }
    Ok(())
}

/// Current UTC time as stored in `created_at` / `updated_at`,
/// e.g. `2024-05-01T12:30:00.000Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::tempdir;

    use crate::{
        config::Database,
        storage::{
            db::{now_timestamp, open, ping},
            schema,
        },
    };

    fn in_memory() -> Database {
        Database {
            in_memory: true,
            ..Default::default()
        }
    }

    fn table_names(db: &rusqlite::Connection) -> Vec<String> {
        let mut stmt = db
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();

        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn open_in_memory_db_initializes_schema() {
        let db = open(&in_memory()).unwrap();
        let tables = table_names(&db);

        for table in schema::tables::ALL_TABLES {
            assert!(tables.contains(&table.to_string()));
        }
    }

    #[test]
    fn open_file_db_creates_missing_directories() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path: PathBuf = dir.path().join("nested").join("music_library.db");

        let db = open(&Database {
            in_memory: false,
            path: path.clone(),
            fail_fast: false,
        })?;

        assert!(path.exists());
        assert!(table_names(&db).contains(&schema::TRACKS.to_string()));

        Ok(())
    }

    #[test]
    fn ping_succeeds_on_open_connection() -> anyhow::Result<()> {
        let db = open(&in_memory())?;
        ping(&db)?;
        Ok(())
    }

    #[test]
    fn timestamp_is_rfc3339_utc() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'), "{ts}");
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
