use anyhow::anyhow;
use log::{debug, info};
use rouille::{Request, Response};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

use crate::{
    config::HttpConfig,
    domain::track::{TrackId, current_year},
    http::{
        error::{ApiError, Operation},
        input::{self, ValidationError},
    },
    storage::{TrackStore, error::StorageError},
};

pub struct HttpServer<S> {
    storage: Arc<Mutex<S>>,
    pub config: HttpConfig,
}

impl<S: TrackStore + 'static> HttpServer<S> {
    pub fn new(storage: S, config: HttpConfig) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            config,
        }
    }

    /// Binds the listener and serves requests until the process exits.
    pub fn run(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        let port = self.config.port;

        let server = rouille::Server::new(addr.as_str(), move |request| {
            self.handle_request(request)
        })
        .map_err(|e| anyhow!("Failed to listen on {addr}: {e}"))?;

        info!("Server running at http://localhost:{port}");
        server.run();
        Ok(())
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = rouille::router!(request,
            (GET) (/api/tracks) => {
                Self::respond(self.list_tracks())
            },
            (POST) (/api/tracks) => {
                Self::respond(self.create_track(request))
            },
            (GET) (/api/tracks/{id: String}) => {
                Self::respond(self.get_track(&id))
            },
            (PUT) (/api/tracks/{id: String}) => {
                Self::respond(self.update_track(&id, request))
            },
            (DELETE) (/api/tracks/{id: String}) => {
                Self::respond(self.delete_track(&id))
            },
            _ => ApiError::NotFound("Not found".into()).into_response()
        );

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn respond(result: Result<Response, ApiError>) -> Response {
        match result {
            Ok(r) => r,
            Err(e) => e.into_response(),
        }
    }

    /// Runs `f` with the storage locked, mapping failures to the operation's error.
    fn with_storage<T>(
        &self,
        operation: Operation,
        f: impl FnOnce(&mut S) -> Result<T, StorageError>,
    ) -> Result<T, ApiError> {
        let mut storage = self.storage.lock().map_err(|e| {
            let err = StorageError::Internal(anyhow!("Could not access storage under lock: {e}"));
            ApiError::from_storage(err, operation)
        })?;
        f(&mut storage).map_err(|e| ApiError::from_storage(e, operation))
    }

    fn parse_id(raw: &str, operation: Operation) -> Result<TrackId, ApiError> {
        TrackId::parse(raw).ok_or_else(|| ApiError::unknown_id(raw, operation))
    }

    fn json_body(request: &Request) -> Result<Value, ApiError> {
        rouille::input::json_input::<Value>(request).map_err(|e| {
            debug!("Rejected request body: {e}");
            ApiError::from(ValidationError::NotAnObject)
        })
    }

    fn list_tracks(&self) -> Result<Response, ApiError> {
        let tracks = self.with_storage(Operation::List, |s| s.list_tracks())?;
        Ok(Response::json(&tracks))
    }

    fn get_track(&self, id: &str) -> Result<Response, ApiError> {
        let id = Self::parse_id(id, Operation::Get)?;
        let track = self.with_storage(Operation::Get, |s| s.get_track(id))?;
        Ok(Response::json(&track))
    }

    fn create_track(&self, request: &Request) -> Result<Response, ApiError> {
        let body = Self::json_body(request)?;
        let fields = input::parse_new_track(&body, current_year())?;

        let track = self.with_storage(Operation::Create, |s| s.create_track(fields))?;
        info!("Created track {}", track.track_id);

        Ok(Response::json(&track).with_status_code(201))
    }

    fn update_track(&self, id: &str, request: &Request) -> Result<Response, ApiError> {
        let body = Self::json_body(request)?;
        let patch = input::parse_track_patch(&body, current_year())?;
        let id = Self::parse_id(id, Operation::Update)?;
        if patch.is_empty() {
            debug!("Update of track {id} supplies no fields, only updatedAt changes");
        }

        let track = self.with_storage(Operation::Update, |s| s.update_track(id, patch))?;
        Ok(Response::json(&track))
    }

    fn delete_track(&self, id: &str) -> Result<Response, ApiError> {
        let id = Self::parse_id(id, Operation::Delete)?;
        self.with_storage(Operation::Delete, |s| s.delete_track(id))?;
        info!("Deleted track {id}");

        Ok(Response::json(&json!({ "message": "Track deleted successfully" })))
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
