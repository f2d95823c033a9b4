//! Error types for the cf-app service layer.

use std::path::PathBuf;

/// Application error wrapping the backend crates' errors for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read case file: {path}")]
    CaseFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse case file: {0}")]
    CaseParse(String),

    #[error("Case validation failed: {0}")]
    Validation(String),

    #[error("Mesh error: {0}")]
    Mesh(String),

    #[error("Heat transfer error: {0}")]
    Heat(String),

    #[error("Cloud error: {0}")]
    Cloud(String),

    #[error("Numerical error: {0}")]
    Numeric(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cf-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<cf_config::ConfigError> for AppError {
    fn from(err: cf_config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<cf_mesh::MeshError> for AppError {
    fn from(err: cf_mesh::MeshError) -> Self {
        AppError::Mesh(err.to_string())
    }
}

impl From<cf_heat::HeatError> for AppError {
    fn from(err: cf_heat::HeatError) -> Self {
        match err {
            cf_heat::HeatError::Config(inner) => inner.into(),
            other => AppError::Heat(other.to_string()),
        }
    }
}

impl From<cf_cloud::CloudError> for AppError {
    fn from(err: cf_cloud::CloudError) -> Self {
        AppError::Cloud(err.to_string())
    }
}

impl From<cf_core::CfError> for AppError {
    fn from(err: cf_core::CfError) -> Self {
        AppError::Numeric(err.to_string())
    }
}
