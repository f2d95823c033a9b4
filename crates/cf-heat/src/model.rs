//! The heat-transfer capability.

use crate::error::HeatResult;
use crate::phase::{PhaseInterface, PhaseInterfaceKey, SharedPhaseSystem};
use cf_config::{ConfigResult, Dict};
use cf_mesh::{MeshAdaptive, ScalarField};
use cf_registry::ModelFamily;

/// Arguments every heat-transfer factory receives.
#[derive(Debug, Clone)]
pub struct HeatTransferContext {
    pub interface: PhaseInterface,
    pub phases: SharedPhaseSystem,
    /// Whether the model is owned by the case's object registry, as opposed
    /// to being held privately by another model.
    pub register: bool,
}

impl HeatTransferContext {
    pub fn new(interface: PhaseInterface, phases: SharedPhaseSystem) -> Self {
        Self {
            interface,
            phases,
            register: true,
        }
    }

    /// Same phases and flag, different interface.
    pub fn on(&self, interface: PhaseInterface) -> Self {
        Self {
            interface,
            ..self.clone()
        }
    }

    pub fn unregistered(mut self) -> Self {
        self.register = false;
        self
    }
}

/// Interfacial heat-transfer coefficient provider.
pub trait HeatTransferModel: MeshAdaptive + Send {
    /// Registered tag of this variant.
    fn type_name(&self) -> &'static str;

    fn interface(&self) -> &PhaseInterface;

    /// Heat-transfer coefficient K [W/m^3/K] used in the energy equations.
    ///
    /// `residual_alpha` bounds the dispersed phase fraction from below so K
    /// stays finite where a phase vanishes.
    fn k(&mut self, residual_alpha: f64) -> HeatResult<&ScalarField>;

    /// Re-read coefficients from `dict`, returning whether any changed.
    fn read_coeffs(&mut self, _dict: &Dict) -> ConfigResult<bool> {
        Ok(false)
    }

    /// Phase-change mass transfer driven by this model, if any.
    fn phase_change(&self) -> Option<&dyn PhaseChangeSource> {
        None
    }
}

/// Mass transfer between the two phases of an interface.
pub trait PhaseChangeSource {
    /// Whether this source transfers mass across the interface `key` names.
    fn active_phase_interface(&self, key: &PhaseInterfaceKey) -> bool;

    /// True if [`dmdtf`](Self::dmdtf) must be negated to read as transfer
    /// from the interface's first phase to its second.
    fn flip_sign(&self) -> bool;

    /// Phase-change rate [kg/m^3/s].
    ///
    /// Only valid after [`HeatTransferModel::k`] has run against the current
    /// phase-system state and coefficients; otherwise returns
    /// [`HeatError::NotYetComputed`](crate::HeatError::NotYetComputed).
    fn dmdtf(&self) -> HeatResult<&ScalarField>;
}

/// Registry family of heat-transfer models.
pub struct HeatTransferModels;

impl ModelFamily for HeatTransferModels {
    const NAME: &'static str = "heatTransferModel";
    type Model = dyn HeatTransferModel;
    type Context = HeatTransferContext;
}
