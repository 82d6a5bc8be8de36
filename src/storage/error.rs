use thiserror::Error;

use crate::{domain::track::TrackId, storage::schema::FieldRule};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("track {0} not found")]
    TrackNotFound(TrackId),

    #[error("column {column} {rule}")]
    ConstraintViolation {
        column: &'static str,
        rule: FieldRule,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
