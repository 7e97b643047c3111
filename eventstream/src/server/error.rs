//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors surfaced to HTTP clients.
///
/// Error bodies are plain text ending in a newline. User-supplied parameter
/// values are never echoed back; the reasons are fixed strings plus log
/// error descriptions.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    /// 400 with the given reason as the body.
    BadRequest(String),

    /// 503 while the log has not been initialized yet.
    Unavailable,

    /// The request's cancellation signal fired; nothing is written.
    Cancelled,

    /// 500; the reason is logged, never sent to the client.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, format!("{reason}\n")).into_response()
            }
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE.into_response(),
            // The client is gone; an empty response goes nowhere.
            ApiError::Cancelled => ().into_response(),
            ApiError::Internal(reason) => {
                tracing::error!(error = %reason, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl ApiError {
    /// Maps a log read error to its HTTP meaning.
    ///
    /// Purged and future offsets both answer 400 today, but the taxonomy
    /// stays distinct in the body text.
    pub fn from_read(err: eventlog::Error) -> ApiError {
        match err {
            e @ (eventlog::Error::OutOfRange | eventlog::Error::FutureOffset) => {
                ApiError::BadRequest(format!("invalid offset: {e}"))
            }
            eventlog::Error::Cancelled => ApiError::Cancelled,
            e => ApiError::Internal(e.to_string()),
        }
    }
}
