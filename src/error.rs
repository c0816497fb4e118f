use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors};

/// AppError
///
/// The single failure type shared by the token service, the middleware chain,
/// the resource services and the repositories. Every variant maps to exactly one
/// HTTP status and is rendered as the `{status, message}` failure envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A required field is missing, empty or malformed.
    #[error("{0}")]
    Validation(String),

    /// The addressed entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A unique constraint (username / email) would be violated.
    #[error("{0}")]
    Conflict(String),

    /// Missing, malformed or expired bearer token, or wrong login credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but the caller does not own the addressed resource.
    #[error("{0}")]
    Forbidden(String),

    /// The persistence deadline elapsed before the store answered.
    #[error("the database did not respond in time")]
    Timeout,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// ErrorBody
///
/// Wire shape of every failed response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "fail")]
    pub status: String,
    #[schema(example = "the error explained here")]
    pub message: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            // Ownership mismatches keep the 401 the public API has always returned.
            AppError::Forbidden(_) => StatusCode::UNAUTHORIZED,
            AppError::Timeout => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The short `status` label placed in the failure envelope.
    pub fn label(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "unauthenticated",
            AppError::Forbidden(_) => "unauthorized",
            AppError::Internal(_) => "error",
            _ => "fail",
        }
    }

    pub fn body(&self) -> ErrorBody {
        let message = match self {
            // Driver details stay in the logs.
            AppError::Database(_) => "the request could not be completed".to_string(),
            AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };

        ErrorBody {
            status: self.label().to_string(),
            message,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!("database error: {:?}", e),
            AppError::Internal(msg) => tracing::error!("internal error: {}", msg),
            AppError::Timeout => tracing::error!("persistence deadline exceeded"),
            _ => {}
        }

        (self.status_code(), Json(self.body())).into_response()
    }
}

/// Flattens derive-level validation failures into one `Validation` message, one
/// clause per offending field in field order.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|(a, _), (b, _)| a.cmp(b));

        let message = fields
            .into_iter()
            .filter_map(|(field, errors)| errors.first().map(|error| describe(&field, error)))
            .collect::<Vec<_>>()
            .join(", ");

        AppError::Validation(message)
    }
}

fn describe(field: &str, error: &ValidationError) -> String {
    match (&error.message, &*error.code) {
        (Some(message), _) => message.to_string(),
        (None, "required") => format!("{field} is required"),
        (None, _) => format!("{field} is invalid"),
    }
}

pub type AppResult<T> = Result<T, AppError>;
