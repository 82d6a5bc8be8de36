use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::{
    config,
    domain::track::{Track, TrackFields, TrackId, TrackPatch},
    storage::{
        TrackStore,
        db::{self, now_timestamp},
        error::StorageError,
        schema::{self, columns, tables},
    },
};

use columns::*;
use tables::*;

/// Sqlite-backed implementation of [`TrackStore`].
///
/// The connection is opened lazily: if opening fails it is retried on the
/// next call instead of taking the whole process down.
pub struct Storage {
    pub(crate) db: Option<rusqlite::Connection>,
    config: config::Database,
}

struct Location<'a>(&'a config::Database);

impl Display for Location<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.in_memory {
            write!(f, "in-memory database")
        } else {
            write!(f, "{}", self.0.path.to_string_lossy())
        }
    }
}

fn select_tracks() -> String {
    format!(
        "SELECT {TRACK_ID}, {SONG_TITLE}, {ARTIST_NAME}, {ALBUM_NAME}, {GENRE}, {DURATION}, {RELEASE_YEAR}, {CREATED_AT}, {UPDATED_AT} FROM {TRACKS}"
    )
}

fn track_from_row(row: &Row) -> rusqlite::Result<Track> {
    Ok(Track {
        track_id: TrackId(row.get(0)?),
        fields: TrackFields {
            song_title: row.get(1)?,
            artist_name: row.get(2)?,
            album_name: row.get(3)?,
            genre: row.get(4)?,
            duration: row.get(5)?,
            release_year: row.get(6)?,
        },
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn fetch_track(conn: &Connection, id: TrackId) -> Result<Track, StorageError> {
    conn.query_row(
        &format!("{} WHERE {TRACK_ID} = ?1", select_tracks()),
        params![id.0],
        track_from_row,
    )
    .optional()?
    .ok_or(StorageError::TrackNotFound(id))
}

impl Storage {
    /// Defers opening the database to the first storage call.
    /// A failed open is returned to that caller and retried on the next call.
    pub fn new(config: config::Database) -> Self {
        Self { db: None, config }
    }

    /// Like [`Storage::new`] but fails when the database can't be opened.
    pub fn open(config: config::Database) -> Result<Self, StorageError> {
        let db = db::open(&config)?;
        Ok(Self {
            db: Some(db),
            config,
        })
    }

    pub fn from_existing_conn(db: rusqlite::Connection) -> Self {
        Self {
            db: Some(db),
            config: config::Database {
                in_memory: true,
                ..Default::default()
            },
        }
    }

    pub fn location(&self) -> String {
        Location(&self.config).to_string()
    }

    fn conn(&mut self) -> Result<&mut Connection, StorageError> {
        let db = match self.db.take() {
            Some(db) => db,
            None => {
                let db = db::open(&self.config)?;
                log::info!("Opened {}", Location(&self.config));
                db
            }
        };
        Ok(self.db.insert(db))
    }

    /// Drops the tracks table and creates it again
    pub fn reset_schema(&mut self) -> Result<(), StorageError> {
        let conn = self.conn()?;
        schema::reset(conn)?;
        Ok(())
    }
}

impl TrackStore for Storage {
    fn ping(&mut self) -> Result<(), StorageError> {
        db::ping(self.conn()?)
    }

    fn list_tracks(&mut self) -> Result<Vec<Track>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY {TRACK_ID}", select_tracks()))?;
        let tracks = stmt
            .query_map([], track_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    fn get_track(&mut self, id: TrackId) -> Result<Track, StorageError> {
        fetch_track(self.conn()?, id)
    }

    fn create_track(&mut self, fields: TrackFields) -> Result<Track, StorageError> {
        schema::enforce(&fields)?;
        let now = now_timestamp();
        let conn = self.conn()?;

        conn.execute(
            &format!(
                "INSERT INTO {TRACKS} ({SONG_TITLE}, {ARTIST_NAME}, {ALBUM_NAME}, {GENRE}, {DURATION}, {RELEASE_YEAR}, {CREATED_AT}, {UPDATED_AT})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)"
            ),
            params![
                fields.song_title,
                fields.artist_name,
                fields.album_name,
                fields.genre,
                fields.duration,
                fields.release_year,
                now
            ],
        )?;

        let id = TrackId(conn.last_insert_rowid());
        fetch_track(conn, id)
    }

    fn update_track(&mut self, id: TrackId, patch: TrackPatch) -> Result<Track, StorageError> {
        let conn = self.conn()?;
        let tx = conn.transaction()?;

        let existing = fetch_track(&tx, id)?;
        let fields = patch.apply(existing.fields);
        schema::enforce(&fields)?;

        tx.execute(
            &format!(
                "UPDATE {TRACKS} SET {SONG_TITLE} = ?1, {ARTIST_NAME} = ?2, {ALBUM_NAME} = ?3, {GENRE} = ?4,
                 {DURATION} = ?5, {RELEASE_YEAR} = ?6, {UPDATED_AT} = ?7
                 WHERE {TRACK_ID} = ?8"
            ),
            params![
                fields.song_title,
                fields.artist_name,
                fields.album_name,
                fields.genre,
                fields.duration,
                fields.release_year,
                now_timestamp(),
                id.0
            ],
        )?;

        let updated = fetch_track(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_track(&mut self, id: TrackId) -> Result<(), StorageError> {
        let deleted = self.conn()?.execute(
            &format!("DELETE FROM {TRACKS} WHERE {TRACK_ID} = ?1"),
            params![id.0],
        )?;
        if deleted == 0 {
            return Err(StorageError::TrackNotFound(id));
        }
        Ok(())
    }
}
