//! Case files: mesh size, initial phase state and model selections.
//!
//! ```yaml
//! name: heated-channel
//! mesh: { cells: 8 }
//! residualAlpha: 1.0e-6
//! state:
//!   phases:
//!     liquid: { alpha: 0.95, T: 368.15, rho: 958, kappa: 0.68, Cp: 4216, mu: 2.8e-4 }
//!     gas: { alpha: 0.05, T: 373.15, rho: 0.6, kappa: 0.025, Cp: 2080, mu: 1.2e-5, d: 2.0e-3 }
//!   saturation: { Tsat: 373.15, L: 2.257e6, sigma: 0.0589 }
//!   wall: { T: 383.15, areaDensity: 50 }
//! combustion:
//!   Su: 0.4
//!   XiModel: { type: uniformConstant, Xi: 1.6 }
//! heatTransfer:
//!   - interface: [gas, liquid]
//!     model: { type: wallBoiling, vapourPhase: gas, ... }
//! clouds:
//!   - name: sprayCloud
//!     parcels:
//!       - { cell: 0, mass: 1.0e-9, d: 1.0e-4, T: 300 }
//! ```

use crate::error::{AppError, AppResult};
use cf_cloud::{Cloud, Parcel};
use cf_config::Dict;
use cf_heat::{PhaseInterface, UniformState};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub name: String,
    pub mesh: MeshDef,
    #[serde(rename = "residualAlpha", default = "default_residual_alpha")]
    pub residual_alpha: f64,
    pub state: UniformState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combustion: Option<CombustionDef>,
    #[serde(rename = "heatTransfer", default)]
    pub heat_transfer: Vec<HeatTransferDef>,
    #[serde(default)]
    pub clouds: Vec<CloudDef>,
}

fn default_residual_alpha() -> f64 {
    1.0e-6
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MeshDef {
    pub cells: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombustionDef {
    /// Laminar flame speed [m/s].
    #[serde(rename = "Su")]
    pub su: f64,
    #[serde(rename = "XiModel")]
    pub xi_model: Dict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatTransferDef {
    pub interface: [String; 2],
    pub model: Dict,
}

impl HeatTransferDef {
    pub fn phase_interface(&self) -> PhaseInterface {
        PhaseInterface::new(&self.interface[0], &self.interface[1])
    }

    /// Model block with its path set for error messages.
    pub fn model_dict(&self) -> Dict {
        self.model
            .clone()
            .renamed(format!("heatTransfer.{}", self.phase_interface().name()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudDef {
    #[serde(default = "default_cloud_name")]
    pub name: String,
    #[serde(default)]
    pub parcels: Vec<ParcelDef>,
}

fn default_cloud_name() -> String {
    Cloud::<Parcel>::DEFAULT_NAME.to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParcelDef {
    pub cell: usize,
    pub mass: f64,
    #[serde(rename = "d")]
    pub diameter: f64,
    #[serde(rename = "T")]
    pub temperature: f64,
}

/// Load a case from a YAML file.
pub fn load_case(path: &Path) -> AppResult<Case> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::CaseFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_case(&content)
}

pub fn parse_case(text: &str) -> AppResult<Case> {
    serde_yaml::from_str(text).map_err(|e| AppError::CaseParse(e.to_string()))
}

/// Structural checks that do not need the model registry.
pub fn validate_case(case: &Case) -> AppResult<()> {
    if case.mesh.cells == 0 {
        return Err(AppError::Validation("mesh must have at least one cell".to_string()));
    }
    if !(case.residual_alpha > 0.0 && case.residual_alpha < 1.0) {
        return Err(AppError::Validation(format!(
            "residualAlpha must lie in (0, 1), got {}",
            case.residual_alpha
        )));
    }
    if case.state.phases.is_empty() {
        return Err(AppError::Validation("case defines no phases".to_string()));
    }

    let mut seen = Vec::new();
    for def in &case.heat_transfer {
        let [a, b] = &def.interface;
        for phase in [a, b] {
            if !case.state.phases.contains_key(phase) {
                return Err(AppError::Validation(format!(
                    "interface [{a}, {b}] names unknown phase '{phase}'"
                )));
            }
        }
        if a == b {
            return Err(AppError::Validation(format!("interface [{a}, {b}] repeats a phase")));
        }
        let key = def.phase_interface().key();
        if seen.iter().any(|k: &cf_heat::PhaseInterfaceKey| k.same_pair(&key)) {
            return Err(AppError::Validation(format!(
                "interface [{a}, {b}] has more than one heat transfer model"
            )));
        }
        seen.push(key);
    }

    for cloud in &case.clouds {
        if let Some(p) = cloud.parcels.iter().find(|p| p.cell >= case.mesh.cells) {
            return Err(AppError::Validation(format!(
                "cloud '{}' places a parcel in cell {} of {}",
                cloud.name, p.cell, case.mesh.cells
            )));
        }
    }
    Ok(())
}
