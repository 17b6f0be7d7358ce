use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::event::EventRouter;
use crate::ws::connection_manager::ConnectionManager;

/// Shared application state handed to the transport layer
#[derive(Clone)]
pub struct AppState {
    pub event_router: Arc<EventRouter>,
    pub connection_manager: Arc<dyn ConnectionManager>,
}

impl AppState {
    pub fn new(
        event_router: Arc<EventRouter>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            event_router,
            connection_manager,
        }
    }
}

/// Error taxonomy for the relay core. None of these are fatal to the
/// process; a failed operation affects only the requesting connection and
/// leaves store state unchanged.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Could not allocate a room id")]
    RoomIdSpaceExhausted,

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::RoomNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::RoomIdSpaceExhausted => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
