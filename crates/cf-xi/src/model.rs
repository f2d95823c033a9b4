//! The flame-wrinkling capability and its construction context.

use cf_config::{ConfigResult, Dict};
use cf_mesh::{MeshAdaptive, ScalarField};
use cf_registry::ModelFamily;
use std::any::Any;
use std::sync::Arc;

/// Opaque handle to a collaborator the core passes through untouched.
pub type Opaque = Arc<dyn Any + Send + Sync>;

/// Arguments every flame-wrinkling factory receives.
///
/// The thermophysical and turbulence handles are forwarded to variants that
/// need them; the laminar flame speed `su` fixes the cell count of the Xi
/// field.
#[derive(Clone)]
pub struct XiContext {
    pub thermo: Opaque,
    pub turbulence: Opaque,
    pub su: Arc<ScalarField>,
}

impl XiContext {
    pub fn new(su: ScalarField) -> Self {
        Self {
            thermo: Arc::new(()),
            turbulence: Arc::new(()),
            su: Arc::new(su),
        }
    }

    pub fn with_thermo(mut self, thermo: Opaque) -> Self {
        self.thermo = thermo;
        self
    }

    pub fn with_turbulence(mut self, turbulence: Opaque) -> Self {
        self.turbulence = turbulence;
        self
    }

    pub fn n_cells(&self) -> usize {
        self.su.len()
    }
}

impl std::fmt::Debug for XiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XiContext")
            .field("su", &self.su.name())
            .field("n_cells", &self.n_cells())
            .finish_non_exhaustive()
    }
}

/// Flame-wrinkling model.
///
/// `correct` is called once per step by the outer loop; a variant whose
/// output never changes may leave it empty.
pub trait XiModel: MeshAdaptive + Send {
    /// Registered tag of this variant.
    fn type_name(&self) -> &'static str;

    /// Current flame-wrinkling field.
    fn xi(&self) -> &ScalarField;

    fn correct(&mut self);

    /// Re-read coefficients from `dict`, returning whether any changed.
    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool>;
}

/// Registry family of flame-wrinkling models.
pub struct XiModels;

impl ModelFamily for XiModels {
    const NAME: &'static str = "XiModel";
    type Model = dyn XiModel;
    type Context = XiContext;
}
