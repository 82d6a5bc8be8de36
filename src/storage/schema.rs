use rusqlite::Connection;

use crate::{
    domain::track::{TrackFields, current_year},
    storage::error::StorageError,
};

pub mod tables {
    pub const TRACKS: &str = "tracks";

    pub const ALL_TABLES: &[&str] = &[TRACKS];
}

pub mod columns {
    pub const TRACK_ID: &str = "track_id";
    pub const SONG_TITLE: &str = "song_title";
    pub const ARTIST_NAME: &str = "artist_name";
    pub const ALBUM_NAME: &str = "album_name";
    pub const GENRE: &str = "genre";
    pub const DURATION: &str = "duration";
    pub const RELEASE_YEAR: &str = "release_year";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

pub use columns::*;
pub use tables::*;

// AUTOINCREMENT keeps ids of deleted tracks from being issued again.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tracks (
    track_id INTEGER PRIMARY KEY AUTOINCREMENT,
    song_title TEXT NOT NULL CHECK (length(song_title) > 0),
    artist_name TEXT NOT NULL CHECK (length(artist_name) > 0),
    album_name TEXT NOT NULL CHECK (length(album_name) > 0),
    genre TEXT NOT NULL CHECK (length(genre) > 0),
    duration INTEGER NOT NULL CHECK (duration >= 1),
    release_year INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// Constraint attached to a column, checked before every write.
///
/// `MaxCurrentYear` can't live in a CHECK clause since sqlite rejects
/// `'now'` there, so these rules are the only place it is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    NotEmpty,
    Min(i64),
    MaxCurrentYear,
}

impl std::fmt::Display for FieldRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldRule::NotEmpty => write!(f, "must not be empty"),
            FieldRule::Min(min) => write!(f, "must be at least {min}"),
            FieldRule::MaxCurrentYear => write!(f, "must not be after the current year"),
        }
    }
}

pub const FIELD_RULES: &[(&str, FieldRule)] = &[
    (SONG_TITLE, FieldRule::NotEmpty),
    (ARTIST_NAME, FieldRule::NotEmpty),
    (ALBUM_NAME, FieldRule::NotEmpty),
    (GENRE, FieldRule::NotEmpty),
    (DURATION, FieldRule::Min(1)),
    (RELEASE_YEAR, FieldRule::MaxCurrentYear),
];

enum Value<'a> {
    Text(&'a str),
    Int(i64),
}

fn column_value<'a>(fields: &'a TrackFields, column: &str) -> Option<Value<'a>> {
    match column {
        SONG_TITLE => Some(Value::Text(&fields.song_title)),
        ARTIST_NAME => Some(Value::Text(&fields.artist_name)),
        ALBUM_NAME => Some(Value::Text(&fields.album_name)),
        GENRE => Some(Value::Text(&fields.genre)),
        DURATION => Some(Value::Int(fields.duration)),
        RELEASE_YEAR => Some(Value::Int(fields.release_year)),
        _ => None,
    }
}

fn satisfies(rule: FieldRule, value: &Value, year: i64) -> bool {
    match (rule, value) {
        (FieldRule::NotEmpty, Value::Text(s)) => !s.trim().is_empty(),
        (FieldRule::Min(min), Value::Int(v)) => *v >= min,
        (FieldRule::MaxCurrentYear, Value::Int(v)) => *v <= year,
        _ => false,
    }
}

/// Checks `fields` against [`FIELD_RULES`]; the first broken rule is returned as an error.
pub fn enforce(fields: &TrackFields) -> Result<(), StorageError> {
    let year = current_year();
    for (column, rule) in FIELD_RULES {
        let ok = column_value(fields, column)
            .map(|value| satisfies(*rule, &value, year))
            .unwrap_or(false);
        if !ok {
            return Err(StorageError::ConstraintViolation {
                column: *column,
                rule: *rule,
            });
        }
    }
    Ok(())
}

pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}

/// Drops every table and creates them again. All stored tracks are lost.
pub fn reset(conn: &Connection) -> Result<(), rusqlite::Error> {
    for table in ALL_TABLES {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
    }
    // ids start again from 1 after a reset
    let has_sequence: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE name = 'sqlite_sequence')",
        [],
        |row| row.get(0),
    )?;
    if has_sequence {
        conn.execute("DELETE FROM sqlite_sequence WHERE name = ?1", [TRACKS])?;
    }
    init(conn)
}
