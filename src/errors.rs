use axum::http::StatusCode;
use axum::response::IntoResponse;
use sqlx::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Storage error: {0}")]
    Storage(sqlx::Error),
    #[error("Aggregation stage '{stage}' failed: {source}")]
    PartialAggregation {
        stage: &'static str,
        #[source]
        source: Box<AppError>,
    },
    #[error("Not found")]
    NotFound,
}

impl AppError {
    /// Tags an error with the sub-calculation it came from, so the caller can
    /// tell which of the concurrent aggregation stages failed the request.
    pub fn in_stage(self, stage: &'static str) -> Self {
        AppError::PartialAggregation {
            stage,
            source: Box::new(self),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            AppError::InvalidRange(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Storage(_) | AppError::PartialAggregation { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: Error) -> Self {
        AppError::Storage(value)
    }
}
