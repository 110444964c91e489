//! The module contains the errors the engine can raise.
//!
//! Contract violations handled as "logged, not raised" (dangling child
//! references, corrupted cache keys, edits to derived fields) still have
//! variants here so the call sites that detect them can log a typed value
//! instead of a bare string.

use thiserror::Error;

use crate::api::ApiError;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error("row \"{0}\" already present")]
    DuplicateRow(String),
    #[error("invalid update: {0}")]
    InvalidUpdate(String),
    #[error("dangling child reference: {0}")]
    DanglingChild(String),
    #[error("invalid cache key: \"{0}\"")]
    InvalidCacheKey(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::DuplicateRow(a), Self::DuplicateRow(b)) => a == b,
            (Self::InvalidUpdate(a), Self::InvalidUpdate(b)) => a == b,
            (Self::DanglingChild(a), Self::DanglingChild(b)) => a == b,
            (Self::InvalidCacheKey(a), Self::InvalidCacheKey(b)) => a == b,
            (Self::Api(a), Self::Api(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
