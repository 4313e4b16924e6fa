//! Error handling for the content ledger
//!
//! Every fallible store operation returns [`ContentResult`]. The variants
//! split into conditions a caller is expected to handle (`NotFound`,
//! `Encoding`) and failures that abort the in-flight operation (`StoreIo`,
//! `ConcurrencyViolation`).

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Main error type for the content ledger
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Content not found: {id}")]
    NotFound { id: u64 },

    #[error("Encoding failed: {context} - {message}")]
    Encoding { context: String, message: String },

    #[error("Store I/O failed: {operation}")]
    StoreIo {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Concurrency violation: {message}")]
    ConcurrencyViolation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Type alias for Result with ContentError
pub type ContentResult<T> = Result<T, ContentError>;

impl ContentError {
    /// Create a not found error
    pub fn not_found(id: u64) -> Self {
        Self::NotFound { id }
    }

    /// Create an encoding error
    pub fn encoding(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Encoding {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a store I/O error
    pub fn store_io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::StoreIo {
            operation: operation.into(),
            source,
        }
    }

    /// Create a concurrency violation
    pub fn concurrency(message: impl Into<String>) -> Self {
        Self::ConcurrencyViolation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl IntoResponse for ContentError {
    fn into_response(self) -> Response {
        let status = match self {
            ContentError::NotFound { .. } => StatusCode::NOT_FOUND,
            ContentError::Encoding { .. } => StatusCode::BAD_REQUEST,
            ContentError::StoreIo { .. }
            | ContentError::ConcurrencyViolation { .. }
            | ContentError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Helper trait for mutex operations that report poisoning as an error
pub trait SafeLock<T: ?Sized> {
    fn safe_lock(&self) -> ContentResult<std::sync::MutexGuard<'_, T>>;
}

impl<T: ?Sized> SafeLock<T> for std::sync::Mutex<T> {
    fn safe_lock(&self) -> ContentResult<std::sync::MutexGuard<'_, T>> {
        self.lock()
            .map_err(|_| ContentError::concurrency("mutex poisoned"))
    }
}

/// Helper trait for RwLock read operations that report poisoning as an error
pub trait SafeReadLock<T: ?Sized> {
    fn safe_read(&self) -> ContentResult<std::sync::RwLockReadGuard<'_, T>>;
}

impl<T: ?Sized> SafeReadLock<T> for std::sync::RwLock<T> {
    fn safe_read(&self) -> ContentResult<std::sync::RwLockReadGuard<'_, T>> {
        self.read()
            .map_err(|_| ContentError::concurrency("store read lock poisoned"))
    }
}

/// Helper trait for RwLock write operations that report poisoning as an error
pub trait SafeWriteLock<T: ?Sized> {
    fn safe_write(&self) -> ContentResult<std::sync::RwLockWriteGuard<'_, T>>;
}

impl<T: ?Sized> SafeWriteLock<T> for std::sync::RwLock<T> {
    fn safe_write(&self) -> ContentResult<std::sync::RwLockWriteGuard<'_, T>> {
        self.write()
            .map_err(|_| ContentError::concurrency("store write lock poisoned"))
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        ContentError::encoding("json_operation", err)
    }
}

/// A request body that is not JSON, or not the expected JSON, is the
/// caller's mistake and answers with the usual error body.
impl From<JsonRejection> for ContentError {
    fn from(rejection: JsonRejection) -> Self {
        ContentError::encoding("request body", rejection.body_text())
    }
}
