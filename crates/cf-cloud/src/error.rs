//! Cloud error types.

use cf_core::{CfError, ParticleId};
use cf_mesh::MeshError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Element {id} placed in cell {cell} of {n_cells}")]
    CellOutOfRange {
        id: ParticleId,
        cell: usize,
        n_cells: usize,
    },

    #[error("Element {id} already present in cloud '{cloud}'")]
    DuplicateId { id: ParticleId, cloud: String },

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

pub type CloudResult<T> = Result<T, CloudError>;

impl From<CloudError> for MeshError {
    fn from(e: CloudError) -> Self {
        match e {
            CloudError::Mesh(inner) => inner,
            other => MeshError::InvalidMap {
                what: other.to_string(),
            },
        }
    }
}

impl From<CloudError> for CfError {
    fn from(e: CloudError) -> Self {
        CfError::Invariant {
            what: e.to_string(),
        }
    }
}
