//! Error types for heat-transfer models.

use cf_config::ConfigError;
use cf_core::CfError;
use cf_mesh::MeshError;
use thiserror::Error;

/// Errors raised while building or evaluating heat-transfer models.
#[derive(Error, Debug)]
pub enum HeatError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// A derived field was read before the operation producing it ran
    /// against the current phase-system state.
    #[error("{what} is not available: call {requires} first")]
    NotYetComputed {
        what: &'static str,
        requires: &'static str,
    },

    #[error("Unknown phase '{name}'")]
    UnknownPhase { name: String },

    #[error("Phase system lock poisoned")]
    Poisoned,
}

pub type HeatResult<T> = Result<T, HeatError>;

impl From<HeatError> for CfError {
    fn from(e: HeatError) -> Self {
        CfError::Invariant {
            what: e.to_string(),
        }
    }
}
