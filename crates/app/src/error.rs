use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use services::QuizServiceError;
use thiserror::Error;

/// Failures surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no file part in upload")]
    MissingFile,
    #[error("option must be an integer, got `{raw}`")]
    InvalidOption { raw: String },
    #[error("invalid upload body: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Service(#[from] QuizServiceError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingFile | Self::InvalidOption { .. } | Self::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Service(QuizServiceError::NotStarted) => StatusCode::CONFLICT,
            Self::Service(err) if err.is_rejection() => StatusCode::BAD_REQUEST,
            Self::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
