use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::constants::err_category_unknown;
use crate::views;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Not found")]
    NotFound,

    /// The record changed between load and save and still exists
    #[error("Record was modified by another request")]
    Conflict,

    #[error("Category {0} does not exist")]
    CategoryNotFound(u64),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid anti-forgery token")]
    InvalidFormToken,

    #[error("Anti-forgery token could not be issued")]
    FormTokenUnavailable,

    /// The request body could not be read as a form
    #[error("Malformed form submission: {message}")]
    MalformedForm { status: StatusCode, message: String },
}

impl AppError {
    /// True for failures of the persistence layer itself
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::Transaction(_)
                | AppError::Table(_)
                | AppError::Storage(_)
                | AppError::Commit(_)
                | AppError::Serialization(_)
                | AppError::Deserialization(_)
                | AppError::TaskJoin(_)
        )
    }
}

/// Implement IntoResponse to convert AppError into rendered error pages
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_store_failure() {
            tracing::error!("Store failure: {:?}", self);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                views::error_page("Error", "Internal server error"),
            )
                .into_response();
        }

        let (status, title, message) = match self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "Not Found",
                "The requested record does not exist.".to_string(),
            ),
            AppError::Conflict => {
                tracing::warn!("Unresolved concurrent update");
                (
                    StatusCode::CONFLICT,
                    "Conflict",
                    "The record was changed by another request. Reload it and try again."
                        .to_string(),
                )
            }
            AppError::CategoryNotFound(id) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid Category",
                err_category_unknown(id),
            ),
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Sign in to continue.".to_string(),
            ),
            AppError::InvalidFormToken => (
                StatusCode::BAD_REQUEST,
                "Bad Request",
                "The form has expired or was not issued by this site.".to_string(),
            ),
            AppError::MalformedForm { status, message } => {
                tracing::debug!("Rejected form body: {}", message);
                (status, status.canonical_reason().unwrap_or("Error"), message)
            }
            AppError::FormTokenUnavailable => {
                tracing::error!("Anti-forgery token could not be issued");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error",
                    "Internal server error".to_string(),
                )
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error",
                "Internal server error".to_string(),
            ),
        };

        (status, views::error_page(title, &message)).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
