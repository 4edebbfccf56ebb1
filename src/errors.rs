use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::{DomainError, ErrorKind};
use crate::handlers::response::Envelope;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Admin role required")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Envelope `type`: the error kind clients branch on.
    fn kind_label(&self) -> &'static str {
        match self {
            AppError::Domain(e) => match e.kind() {
                ErrorKind::NotFound => "not_found",
                ErrorKind::Validation => "validation_error",
                ErrorKind::Conflict => "conflict_error",
                ErrorKind::Internal => "internal_error",
            },
            AppError::BadRequest(_) => "validation_error",
            AppError::Unauthorized(_) | AppError::Forbidden => "auth_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Envelope `status`: stable machine code.
    fn code(&self) -> &'static str {
        match self {
            AppError::Domain(e) => e.code(),
            AppError::BadRequest(_) => "INVALID_INPUT",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_internal(&self) -> bool {
        self.kind_label() == "internal_error"
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Domain(DomainError::CheckoutFailed(_)) => "Checkout failed".to_string(),
            _ if self.is_internal() => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // Checkout failures are reported to the buyer as a failed request.
            AppError::Domain(DomainError::CheckoutFailed(_)) => StatusCode::BAD_REQUEST,
            AppError::Domain(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if self.is_internal() {
            log::error!("Request failed: {}", self);
        }
        HttpResponse::build(status).json(Envelope::<()> {
            kind: self.kind_label(),
            status: self.code(),
            message: self.public_message(),
            data: None,
        })
    }
}
