use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Invalid credentials")]
    Auth,

    #[error("{0}")]
    Conflict(String),

    #[error("Cannot delete product with existing order items")]
    ReferentialConstraint,

    #[error("database unavailable")]
    BackendUnavailable,

    #[error("ORM error")]
    Orm(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Auth => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Conflict(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::ReferentialConstraint => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::BackendUnavailable => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Orm(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            AppError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        // Auth failures use the `{success:false, message}` envelope the
        // storefront expects; everything else is `{error: message}`.
        let body = if matches!(self, AppError::Auth) {
            serde_json::json!({ "success": false, "message": message })
        } else {
            serde_json::json!({ "error": message })
        };
        (status, axum::Json(body)).into_response()
    }
}

/// True when a `DbErr` is a unique-key violation on either backend.
pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

pub type AppResult<T> = Result<T, AppError>;
