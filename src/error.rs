//! Central error type mapped onto the HTTP status taxonomy.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::ErrorResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("transisi status tidak valid: {0}")]
    InvalidTransition(String),
    #[error("data penerbit tidak lengkap: {0}")]
    IncompleteIssuerData(String),
    #[error("gagal membuat dokumen: {0}")]
    Rendering(#[from] crate::renderer::RenderError),
    #[error("layanan penyimpanan gagal: {0}")]
    Storage(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
            AppError::InvalidTransition(_) => "InvalidTransition",
            AppError::IncompleteIssuerData(_) => "IncompleteIssuerData",
            AppError::Rendering(_) => "RenderingFailure",
            AppError::Storage(_) => "StorageFailure",
            AppError::Database(_) => "InternalServerError",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => {
                AppError::NotFound("data tidak ditemukan".to_string())
            }
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => AppError::Conflict(
                    "data dengan nilai unik yang sama sudah ada".to_string(),
                ),
                // foreign_key_violation
                Some("23503") => AppError::Conflict(
                    "data masih digunakan oleh entitas lain".to_string(),
                ),
                _ => AppError::Database(e),
            },
            _ => AppError::Database(e),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::IncompleteIssuerData(_)
            | AppError::Rendering(_)
            | AppError::Storage(_)
            | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("{}: {}", self.error_type(), self);
        }
        HttpResponse::build(self.status_code())
            .json(ErrorResponse::new(self.error_type(), &self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidTransition("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Storage("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
