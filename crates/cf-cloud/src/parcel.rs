//! Computational parcel: a group of physical particles sharing one state.

use crate::cloud::CloudElement;
use cf_core::ParticleId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub id: ParticleId,
    pub cell: usize,
    /// Total mass carried [kg].
    pub mass: f64,
    /// Particle diameter [m].
    pub diameter: f64,
    /// Temperature [K].
    pub temperature: f64,
}

impl Parcel {
    pub fn new(id: ParticleId, cell: usize, mass: f64, diameter: f64, temperature: f64) -> Self {
        Self {
            id,
            cell,
            mass,
            diameter,
            temperature,
        }
    }
}

impl CloudElement for Parcel {
    fn id(&self) -> ParticleId {
        self.id
    }

    fn cell(&self) -> usize {
        self.cell
    }

    fn set_cell(&mut self, cell: usize) {
        self.cell = cell;
    }
}
