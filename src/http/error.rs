use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

/// An error response for the item resource.
///
/// Serializes to the wire shape `{"error": "...", "details": "..."}`, with
/// `details` carried only for opaque store failures.
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// Create a new [`AppError`].
    pub fn new(status: StatusCode, error: impl ToString) -> AppError {
        Self {
            status,
            error: error.to_string(),
            details: None,
        }
    }

    /// A validation failure, surfaced verbatim to the caller.
    pub fn bad_request(error: impl ToString) -> AppError {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// An operation that matched nothing it was required to match.
    pub fn not_found(error: impl ToString) -> AppError {
        Self::new(StatusCode::NOT_FOUND, error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let json = Json(self.clone());
        (self.status, json).into_response()
    }
}

/// Store failures bubble up as anyhow errors and respond as opaque 500s.
impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Database error".to_string(),
            details: Some(value.to_string()),
        }
    }
}

impl From<crate::query::InvalidNumber> for AppError {
    fn from(value: crate::query::InvalidNumber) -> Self {
        Self::bad_request(value)
    }
}
