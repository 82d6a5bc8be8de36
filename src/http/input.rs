//! Sanitization and validation of track request bodies.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::track::{TrackFields, TrackPatch};

pub const SONG_TITLE: &str = "songTitle";
pub const ARTIST_NAME: &str = "artistName";
pub const ALBUM_NAME: &str = "albumName";
pub const GENRE: &str = "genre";
pub const DURATION: &str = "duration";
pub const RELEASE_YEAR: &str = "releaseYear";

const REQUIRED_FIELDS: &[&str] = &[
    SONG_TITLE,
    ARTIST_NAME,
    ALBUM_NAME,
    GENRE,
    DURATION,
    RELEASE_YEAR,
];

static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Missing required fields")]
    MissingFields,

    #[error("Field '{0}' must be a non-empty string")]
    InvalidText(&'static str),

    #[error("Duration must be a positive number")]
    InvalidDuration,

    #[error("Release year must be a valid year")]
    InvalidReleaseYear,
}

/// Removes tag-like `<...>` substrings, then surrounding whitespace.
pub fn sanitize(input: &str) -> String {
    HTML_TAG_RE.replace_all(input, "").trim().to_string()
}

// falsy values count as absent: null, "", false and 0.
// A zero duration is left to the duration check and reported as invalid there.
fn is_missing(name: &str, value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => name != DURATION && n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationError> {
    body.as_object().ok_or(ValidationError::NotAnObject)
}

fn text(value: &Value, name: &'static str) -> Result<String, ValidationError> {
    let clean = value
        .as_str()
        .map(sanitize)
        .ok_or(ValidationError::InvalidText(name))?;
    if clean.is_empty() {
        return Err(ValidationError::InvalidText(name));
    }
    Ok(clean)
}

fn duration(value: &Value) -> Result<i64, ValidationError> {
    value
        .as_i64()
        .filter(|d| *d > 0)
        .ok_or(ValidationError::InvalidDuration)
}

fn release_year(value: &Value, current_year: i64) -> Result<i64, ValidationError> {
    value
        .as_i64()
        .filter(|y| *y <= current_year)
        .ok_or(ValidationError::InvalidReleaseYear)
}

fn required<'a>(obj: &'a Map<String, Value>, name: &str) -> Result<&'a Value, ValidationError> {
    obj.get(name)
        .filter(|v| !is_missing(name, Some(*v)))
        .ok_or(ValidationError::MissingFields)
}

/// Validates a create request. Checks run in order and the first failure is returned:
/// presence of all six fields, string contents, duration, release year.
pub fn parse_new_track(body: &Value, current_year: i64) -> Result<TrackFields, ValidationError> {
    let obj = as_object(body)?;

    if REQUIRED_FIELDS
        .iter()
        .any(|name| is_missing(name, obj.get(*name)))
    {
        return Err(ValidationError::MissingFields);
    }

    let song_title = text(required(obj, SONG_TITLE)?, SONG_TITLE)?;
    let artist_name = text(required(obj, ARTIST_NAME)?, ARTIST_NAME)?;
    let album_name = text(required(obj, ALBUM_NAME)?, ALBUM_NAME)?;
    let genre = text(required(obj, GENRE)?, GENRE)?;
    let duration = duration(required(obj, DURATION)?)?;
    let release_year = release_year(required(obj, RELEASE_YEAR)?, current_year)?;

    Ok(TrackFields {
        song_title,
        artist_name,
        album_name,
        genre,
        duration,
        release_year,
    })
}

/// Validates an update request. Only keys present in the body are checked,
/// and a present `null` is invalid for its field.
pub fn parse_track_patch(body: &Value, current_year: i64) -> Result<TrackPatch, ValidationError> {
    let obj = as_object(body)?;
    let text_field = |name: &'static str| obj.get(name).map(|v| text(v, name)).transpose();

    Ok(TrackPatch {
        song_title: text_field(SONG_TITLE)?,
        artist_name: text_field(ARTIST_NAME)?,
        album_name: text_field(ALBUM_NAME)?,
        genre: text_field(GENRE)?,
        duration: obj.get(DURATION).map(duration).transpose()?,
        release_year: obj
            .get(RELEASE_YEAR)
            .map(|v| release_year(v, current_year))
            .transpose()?,
    })
}
