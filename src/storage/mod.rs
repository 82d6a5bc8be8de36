use crate::{
    domain::track::{Track, TrackFields, TrackId, TrackPatch},
    storage::error::StorageError,
};

pub mod db;
pub mod error;
pub mod operations;
pub mod schema;

/// Key-based persistence of tracks, the only storage surface the HTTP layer sees.
pub trait TrackStore: Send {
    /// Checks that the backing store answers.
    fn ping(&mut self) -> Result<(), StorageError>;

    /// All tracks, ordered by id. Empty when nothing is stored.
    fn list_tracks(&mut self) -> Result<Vec<Track>, StorageError>;

    /// Returns [`StorageError::TrackNotFound`] if no track has this id.
    fn get_track(&mut self, id: TrackId) -> Result<Track, StorageError>;

    /// Stores a new track and returns it with its assigned id and timestamps.
    fn create_track(&mut self, fields: TrackFields) -> Result<Track, StorageError>;

    /// Changes the supplied fields only and returns the full updated track.
    /// Returns [`StorageError::TrackNotFound`] if no track has this id.
    fn update_track(&mut self, id: TrackId, patch: TrackPatch) -> Result<Track, StorageError>;

    /// Returns [`StorageError::TrackNotFound`] if no track has this id.
    fn delete_track(&mut self, id: TrackId) -> Result<(), StorageError>;
}
