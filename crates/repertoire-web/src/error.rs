use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use repertoire_core::RecordingId;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("recording {0} not found")]
    NotFound(RecordingId),

    #[error(transparent)]
    Store(#[from] repertoire_core::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(repertoire_core::Error::DuplicateRecording { .. }) => StatusCode::CONFLICT,
            Self::Store(repertoire_core::Error::InvalidData(_)) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
