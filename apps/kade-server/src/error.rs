//! # API Errors
//!
//! Every handler returns `Result<_, ApiError>`. The body is always
//! `{"error": "<message>"}`.
//!
//! ## Status Mapping
//! ```text
//! ┌────────────────────────────────────────┬────────┬──────────────────────┐
//! │ Source                                 │ Status │ Message              │
//! ├────────────────────────────────────────┼────────┼──────────────────────┤
//! │ DbError::NotFound                      │ 404    │ "Product not found"  │
//! │ malformed JSON / query / path          │ 400    │ extractor message    │
//! │ ValidationError, sale pre-validation   │ 400    │ validation message   │
//! │ InsufficientStock / InsufficientPoints │ 409    │ policy message       │
//! │ bad login, bad or missing token        │ 401    │ fixed message        │
//! │ UNIQUE / FOREIGN KEY, other DB errors  │ 500    │ raw database message │
//! └────────────────────────────────────────┴────────┴──────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use kade_core::{CoreError, ValidationError};
use kade_db::DbError;

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unparseable or invalid request.
    #[error("{0}")]
    BadRequest(String),

    /// Wrong username or password. Deliberately says nothing more.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed or expired bearer token.
    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Db(DbError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Db(DbError::Rejected(e)) if e.is_balance_conflict() => StatusCode::CONFLICT,
            ApiError::Db(DbError::Rejected(_)) => StatusCode::BAD_REQUEST,
            ApiError::Db(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!(error = %message, "Request failed");
        } else if status == StatusCode::CONFLICT {
            warn!(error = %message, "Request rejected by balance policy");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Db(DbError::Rejected(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status_of(DbError::not_found("Product", 7)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ValidationError::Required { field: "name".into() }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(CoreError::EmptySale), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(CoreError::InsufficientStock {
                product_id: 1,
                available: 2,
                requested: 3
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DbError::UniqueViolation {
                field: "products.barcode".into(),
                message: "UNIQUE constraint failed: products.barcode".into(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(ApiError::InvalidCredentials), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ApiError::from(DbError::not_found("Customer", 3)).to_string(),
            "Customer not found"
        );
        assert_eq!(
            ApiError::from(DbError::UniqueViolation {
                field: "customers.email".into(),
                message: "UNIQUE constraint failed: customers.email".into(),
            })
            .to_string(),
            "UNIQUE constraint failed: customers.email"
        );
        assert_eq!(ApiError::InvalidCredentials.to_string(), "Invalid credentials");
    }
}
