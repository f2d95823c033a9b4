//! Sub-cooled nucleate wall boiling.
//!
//! [`WallBoiling`] is a heat-transfer model that owns an underlying
//! heat-transfer model plus four independently selected sub-models, one per
//! family below, and caches the fields derived from them.

pub mod composite;
pub mod departure_diameter;
pub mod departure_frequency;
pub mod nucleation;
pub mod partitioning;

pub use composite::WallBoiling;
pub use departure_diameter::{DepartureDiameterModel, DepartureDiameterModels, TolubinskiKostanchuk};
pub use departure_frequency::{
    Cole, DepartureFrequencyModel, DepartureFrequencyModels, KocamustafaogullariIshii,
};
pub use nucleation::{LemmertChawla, NucleationSiteModel, NucleationSiteModels};
pub use partitioning::{
    Cosine, Lavieville, Linear, PartitioningModel, PartitioningModels, PhaseFraction,
};

/// Near-wall state of one cell, as seen by the boiling sub-models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallConditions {
    pub t_wall: f64,
    pub t_sat: f64,
    pub t_liquid: f64,
    pub alpha_liquid: f64,
    pub rho_liquid: f64,
    pub rho_vapour: f64,
    pub kappa_liquid: f64,
    pub cp_liquid: f64,
    pub sigma: f64,
    pub latent_heat: f64,
}

impl WallConditions {
    /// Wall superheat above saturation, zero when the wall is colder.
    pub fn superheat(&self) -> f64 {
        (self.t_wall - self.t_sat).max(0.0)
    }

    /// Liquid subcooling below saturation; negative when superheated.
    pub fn subcooling(&self) -> f64 {
        self.t_sat - self.t_liquid
    }
}

#[cfg(test)]
pub(crate) fn water_at_one_bar() -> WallConditions {
    WallConditions {
        t_wall: 383.15,
        t_sat: 373.15,
        t_liquid: 368.15,
        alpha_liquid: 0.9,
        rho_liquid: 958.0,
        rho_vapour: 0.6,
        kappa_liquid: 0.68,
        cp_liquid: 4216.0,
        sigma: 0.0589,
        latent_heat: 2.257e6,
    }
}
