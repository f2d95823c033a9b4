//! Nusselt-number correlations for a dispersed phase in a continuous one.
//!
//! All variants share K = 6 max(alpha_d, residualAlpha) kappa_c Nu / d^2 and
//! differ only in how Nu is computed.

use crate::error::{HeatError, HeatResult};
use crate::model::{HeatTransferContext, HeatTransferModel, HeatTransferModels};
use crate::phase::{PhaseInterface, read_phases};
use cf_config::{ConfigError, ConfigResult, Dict};
use cf_mesh::{MeshAdaptive, MeshError, ScalarField};
use cf_registry::register_model;

/// Local flow state of one cell.
#[derive(Debug, Clone, Copy)]
pub struct DispersedCell {
    /// Continuous-phase fraction.
    pub alpha_c: f64,
    /// Particle Reynolds number.
    pub re: f64,
    /// Continuous-phase Prandtl number.
    pub pr: f64,
}

/// A Nusselt correlation.
pub trait Nusselt: Sized + Send + 'static {
    const TYPE_NAME: &'static str;

    fn from_dict(dict: &Dict) -> ConfigResult<Self>;

    fn nu(&self, cell: &DispersedCell) -> f64;

    /// Replace coefficients, returning whether any changed.
    fn update(&mut self, _dict: &Dict) -> ConfigResult<bool> {
        Ok(false)
    }
}

/// Heat transfer from a Nusselt correlation.
///
/// K is rebuilt on every call, so nothing needs remapping when the mesh
/// changes.
#[derive(Debug)]
pub struct NusseltHeatTransfer<N> {
    correlation: N,
    ctx: HeatTransferContext,
    k: ScalarField,
}

impl<N: Nusselt> NusseltHeatTransfer<N> {
    pub fn new(dict: &Dict, ctx: &HeatTransferContext) -> ConfigResult<Self> {
        tracing::debug!(
            model = N::TYPE_NAME,
            interface = %ctx.interface,
            "heat transfer model"
        );
        Ok(Self {
            correlation: N::from_dict(dict)?,
            ctx: ctx.clone(),
            k: ScalarField::zeros(format!("K.{}", ctx.interface.name()), 0),
        })
    }

    pub fn correlation(&self) -> &N {
        &self.correlation
    }

    pub(crate) fn build(dict: &Dict, ctx: &HeatTransferContext) -> ConfigResult<Box<dyn HeatTransferModel>> {
        Ok(Box::new(Self::new(dict, ctx)?))
    }
}

impl<N: Nusselt> MeshAdaptive for NusseltHeatTransfer<N> {}

impl<N: Nusselt> HeatTransferModel for NusseltHeatTransfer<N> {
    fn type_name(&self) -> &'static str {
        N::TYPE_NAME
    }

    fn interface(&self) -> &PhaseInterface {
        &self.ctx.interface
    }

    fn k(&mut self, residual_alpha: f64) -> HeatResult<&ScalarField> {
        let phases = read_phases(&self.ctx.phases)?;
        let dispersed = phases.phase(self.ctx.interface.dispersed())?;
        let continuous = phases.phase(self.ctx.interface.continuous())?;
        let ur = phases.slip_velocity().values();
        let n = phases.n_cells();
        if ur.len() != n {
            return Err(HeatError::Mesh(MeshError::SizeMismatch {
                what: "slip velocity".to_string(),
                expected: n,
                actual: ur.len(),
            }));
        }

        self.k.resize(n, 0.0);
        let k = self.k.values_mut();
        for i in 0..n {
            let d = dispersed.d.values()[i];
            let rho_c = continuous.rho.values()[i];
            let mu_c = continuous.mu.values()[i];
            let kappa_c = continuous.kappa.values()[i];
            let cell = DispersedCell {
                alpha_c: continuous.alpha.values()[i],
                re: rho_c * ur[i].abs() * d / mu_c,
                pr: mu_c * continuous.cp.values()[i] / kappa_c,
            };
            let alpha_d = dispersed.alpha.values()[i].max(residual_alpha);
            k[i] = 6.0 * alpha_d * kappa_c * self.correlation.nu(&cell) / (d * d);
        }
        Ok(&self.k)
    }

    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool> {
        self.correlation.update(dict)
    }
}

/// Conduction-limited sphere: Nu = 10.
#[derive(Debug, Clone, Copy)]
pub struct Spherical;

impl Nusselt for Spherical {
    const TYPE_NAME: &'static str = "spherical";

    fn from_dict(_dict: &Dict) -> ConfigResult<Self> {
        Ok(Self)
    }

    fn nu(&self, _cell: &DispersedCell) -> f64 {
        10.0
    }
}

/// Fixed, user-supplied Nusselt number.
#[derive(Debug, Clone, Copy)]
pub struct ConstantNu {
    pub nu: f64,
}

fn read_nu(dict: &Dict) -> ConfigResult<f64> {
    let nu: f64 = dict.lookup("Nu")?;
    if !(nu.is_finite() && nu > 0.0) {
        return Err(ConfigError::BadValue {
            dict: dict.path().to_string(),
            key: "Nu".to_string(),
            reason: format!("must be positive, got {nu}"),
        });
    }
    Ok(nu)
}

impl Nusselt for ConstantNu {
    const TYPE_NAME: &'static str = "constantNu";

    fn from_dict(dict: &Dict) -> ConfigResult<Self> {
        Ok(Self { nu: read_nu(dict)? })
    }

    fn nu(&self, _cell: &DispersedCell) -> f64 {
        self.nu
    }

    fn update(&mut self, dict: &Dict) -> ConfigResult<bool> {
        let nu = read_nu(dict)?;
        let changed = nu != self.nu;
        self.nu = nu;
        Ok(changed)
    }
}

/// Ranz-Marshall: Nu = 2 + 0.6 Re^1/2 Pr^1/3.
#[derive(Debug, Clone, Copy)]
pub struct RanzMarshall;

impl Nusselt for RanzMarshall {
    const TYPE_NAME: &'static str = "RanzMarshall";

    fn from_dict(_dict: &Dict) -> ConfigResult<Self> {
        Ok(Self)
    }

    fn nu(&self, cell: &DispersedCell) -> f64 {
        2.0 + 0.6 * cell.re.sqrt() * cell.pr.cbrt()
    }
}

/// Gunn's packed and fluidised bed correlation.
#[derive(Debug, Clone, Copy)]
pub struct Gunn;

impl Nusselt for Gunn {
    const TYPE_NAME: &'static str = "Gunn";

    fn from_dict(_dict: &Dict) -> ConfigResult<Self> {
        Ok(Self)
    }

    fn nu(&self, cell: &DispersedCell) -> f64 {
        let a = cell.alpha_c;
        let pr3 = cell.pr.cbrt();
        (7.0 - 10.0 * a + 5.0 * a * a) * (1.0 + 0.7 * cell.re.powf(0.2) * pr3)
            + (1.33 - 2.4 * a + 1.2 * a * a) * cell.re.powf(0.7) * pr3
    }
}

pub type SphericalHeatTransfer = NusseltHeatTransfer<Spherical>;
pub type ConstantNuHeatTransfer = NusseltHeatTransfer<ConstantNu>;
pub type RanzMarshallHeatTransfer = NusseltHeatTransfer<RanzMarshall>;
pub type GunnHeatTransfer = NusseltHeatTransfer<Gunn>;

register_model!(HeatTransferModels, "spherical", SphericalHeatTransfer::build);
register_model!(HeatTransferModels, "constantNu", ConstantNuHeatTransfer::build);
register_model!(HeatTransferModels, "RanzMarshall", RanzMarshallHeatTransfer::build);
register_model!(HeatTransferModels, "Gunn", GunnHeatTransfer::build);
