use std::fmt::Display;

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

/// Identifier of a stored track, assigned by the database on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub i64);

impl TrackId {
    /// Parses an id coming from a URL path segment.
    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse::<i64>().ok().map(Self)
    }
}

impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User-editable part of a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackFields {
    pub song_title: String,
    pub artist_name: String,
    pub album_name: String,
    pub genre: String,
    /// seconds
    pub duration: i64,
    pub release_year: i64,
}

/// Represent a stored music track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub track_id: TrackId,
    #[serde(flatten)]
    pub fields: TrackFields,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial modification of a track. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackPatch {
    pub song_title: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<i64>,
    pub release_year: Option<i64>,
}

impl TrackPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `fields` with every supplied value replaced.
    pub fn apply(self, fields: TrackFields) -> TrackFields {
        TrackFields {
            song_title: self.song_title.unwrap_or(fields.song_title),
            artist_name: self.artist_name.unwrap_or(fields.artist_name),
            album_name: self.album_name.unwrap_or(fields.album_name),
            genre: self.genre.unwrap_or(fields.genre),
            duration: self.duration.unwrap_or(fields.duration),
            release_year: self.release_year.unwrap_or(fields.release_year),
        }
    }
}

/// Calendar year in local time, the upper bound for `release_year`.
pub fn current_year() -> i64 {
    i64::from(Local::now().year())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> TrackFields {
        TrackFields {
            song_title: "Ripple".to_string(),
            artist_name: "Grateful Dead".to_string(),
            album_name: "American Beauty".to_string(),
            genre: "Rock".to_string(),
            duration: 250,
            release_year: 1970,
        }
    }

    #[test]
    fn test_patch_changes_only_supplied_fields() {
        let patch = TrackPatch {
            genre: Some("Folk".to_string()),
            duration: Some(251),
            ..Default::default()
        };

        let patched = patch.apply(fields());

        assert_eq!(patched.genre, "Folk");
        assert_eq!(patched.duration, 251);
        assert_eq!(patched.song_title, "Ripple");
        assert_eq!(patched.release_year, 1970);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let patch = TrackPatch::default();
        assert!(patch.is_empty());
        assert_eq!(patch.apply(fields()), fields());
    }

    #[test]
    fn test_track_serializes_camel_case_flat() -> anyhow::Result<()> {
        let track = Track {
            track_id: TrackId(7),
            fields: fields(),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000Z".to_string(),
        };

        let json = serde_json::to_value(&track)?;

        assert_eq!(json["trackId"], 7);
        assert_eq!(json["songTitle"], "Ripple");
        assert_eq!(json["releaseYear"], 1970);
        assert_eq!(json["createdAt"], "2024-01-01T00:00:00.000Z");

        Ok(())
    }

    #[test]
    fn test_parse_track_id() {
        assert_eq!(TrackId::parse("42"), Some(TrackId(42)));
        assert_eq!(TrackId::parse("abc"), None);
        assert_eq!(TrackId::parse(""), None);
    }
}
