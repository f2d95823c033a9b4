//! Mesh and adaptation error types.

use cf_core::CfError;
use thiserror::Error;

/// Errors raised by mesh maps, fields and adaptation handlers.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Size mismatch for {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid map: {what}")]
    InvalidMap { what: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Object '{name}' already registered in {registry}")]
    DuplicateObject { name: String, registry: String },

    #[error("Object '{name}' not found in {registry}")]
    UnknownObject { name: String, registry: String },

    #[error("Object '{name}' is not a {expected}")]
    WrongObjectType { name: String, expected: &'static str },
}

pub type MeshResult<T> = Result<T, MeshError>;

impl From<MeshError> for CfError {
    fn from(e: MeshError) -> Self {
        CfError::Invariant {
            what: e.to_string(),
        }
    }
}
