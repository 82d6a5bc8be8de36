use std::fmt::Display;

use rouille::Response;
use serde_json::json;

use crate::{http::input::ValidationError, storage::error::StorageError};

/// The storage interaction a request was performing, used to pick error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    fn failure_message(self) -> &'static str {
        match self {
            Operation::List => "Failed to fetch tracks",
            Operation::Get => "Failed to fetch track",
            Operation::Create => "Error creating track",
            Operation::Update => "Error updating track",
            Operation::Delete => "Error deleting track",
        }
    }

    fn not_found_message(self, id: impl Display) -> String {
        match self {
            Operation::Update | Operation::Delete => format!("Track with id: {id} not found"),
            Operation::List | Operation::Get | Operation::Create => "Track not found".to_string(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl ApiError {
    /// Maps a storage failure to a response error.
    /// Anything but a missing track is logged and hidden behind a static message.
    pub fn from_storage(err: StorageError, operation: Operation) -> Self {
        match err {
            StorageError::TrackNotFound(id) => ApiError::NotFound(operation.not_found_message(id)),

            StorageError::Database(_)
            | StorageError::ConstraintViolation { .. }
            | StorageError::Unavailable(_)
            | StorageError::Internal(_) => {
                log::error!("{}: {err}", operation.failure_message());
                ApiError::Internal(operation.failure_message().into())
            }
        }
    }

    /// Not-found error for an id that isn't a valid track id at all.
    pub fn unknown_id(raw: &str, operation: Operation) -> Self {
        ApiError::NotFound(operation.not_found_message(raw))
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg,
        }
    }

    pub fn into_response(self) -> Response {
        Response::json(&json!({ "error": self.message() })).with_status_code(self.status_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::track::TrackId,
        storage::schema::{DURATION, FieldRule},
    };

    #[test]
    fn test_not_found_messages_per_operation() {
        assert_eq!(
            ApiError::from_storage(StorageError::TrackNotFound(TrackId(3)), Operation::Get),
            ApiError::NotFound("Track not found".into())
        );
        assert_eq!(
            ApiError::from_storage(StorageError::TrackNotFound(TrackId(3)), Operation::Delete),
            ApiError::NotFound("Track with id: 3 not found".into())
        );
    }

    #[test]
    fn test_storage_failures_hide_details() {
        let err = StorageError::ConstraintViolation {
            column: DURATION,
            rule: FieldRule::Min(1),
        };
        let api = ApiError::from_storage(err, Operation::Create);

        assert_eq!(api, ApiError::Internal("Error creating track".into()));
        assert_eq!(api.status_code(), 500);

        let api = ApiError::from_storage(
            StorageError::Unavailable("disk on fire".into()),
            Operation::List,
        );
        assert_eq!(api.message(), "Failed to fetch tracks");
    }

    #[test]
    fn test_validation_error_is_bad_request() {
        let api = ApiError::from(ValidationError::InvalidDuration);
        assert_eq!(api.status_code(), 400);
        assert_eq!(api.message(), "Duration must be a positive number");
    }
}
