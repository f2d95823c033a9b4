//! The wall-boiling heat-transfer composite.

use super::{
    DepartureDiameterModel, DepartureDiameterModels, DepartureFrequencyModel,
    DepartureFrequencyModels, NucleationSiteModel, NucleationSiteModels, PartitioningModel,
    PartitioningModels, WallConditions,
};
use crate::error::{HeatError, HeatResult};
use crate::model::{HeatTransferContext, HeatTransferModel, HeatTransferModels, PhaseChangeSource};
use crate::phase::{PhaseInterface, PhaseInterfaceKey, SharedPhaseSystem, read_phases};
use cf_config::{ConfigError, ConfigResult, Dict};
use cf_core::relax;
use cf_mesh::conformance::AdaptationState;
use cf_mesh::{
    DistributionMap, MeshAdaptive, MeshError, MeshMap, MeshResult, ScalarField, TopoChangeMap,
};
use cf_registry::{ModelFamily, register_model};
use std::f64::consts::PI;
use std::sync::Arc;

/// Bubble area-of-influence factor (Del Valle and Kenning).
const K_BUBBLE: f64 = 4.0;

/// Waiting time between departures as a fraction of the departure period.
const WAIT_FRACTION: f64 = 0.8;

/// Lower bound on the wall-to-liquid temperature difference when turning
/// boiling heat fluxes into a coefficient.
const DELTA_T_MIN: f64 = 1.0e-3;

const UNDERLYING: &str = "heatTransferModel";
const PARTITIONING: &str = "partitioningModel";
const NUCLEATION: &str = "nucleationSiteModel";
const DEPARTURE_DIAMETER: &str = "departureDiameterModel";
const DEPARTURE_FREQUENCY: &str = "departureFrequencyModel";

/// State the caches were computed from. Any difference means recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    revision: u64,
    residual_alpha: u64,
    generation: u64,
    layout: u64,
}

/// Sub-cooled nucleate boiling on the liquid side of a liquid-vapour
/// interface.
///
/// ```yaml
/// gas_liquid:
///   type: wallBoiling
///   vapourPhase: gas
///   relax: 0.5
///   heatTransferModel: { type: spherical }
///   partitioningModel: { type: Lavieville, alphaCrit: 0.2 }
///   nucleationSiteModel: { type: LemmertChawla }
///   departureDiameterModel: { type: TolubinskiKostanchuk }
///   departureFrequencyModel: { type: KocamustafaogullariIshii, Cf: 1.18 }
/// ```
///
/// The boiling heat flux is split Kurul-Podowski style into quenching and
/// evaporation on the wetted wall fraction and added, as an equivalent
/// coefficient, to the underlying model's K.
///
/// `k` recomputes only when the phase system revision, `residual_alpha`,
/// the coefficients or the mesh changed since the last call; otherwise it
/// returns the cached, relaxed field. [`PhaseChangeSource::dmdtf`] is valid
/// only after `k` has run against the current phase-system revision, the
/// current coefficients and the current mesh. New cells created by a mesh
/// event start from the mean of the cached values, so the first relaxed K
/// after the event stays close to the physical one.
pub struct WallBoiling {
    interface: PhaseInterface,
    liquid: String,
    vapour: String,
    phases: SharedPhaseSystem,
    relax: f64,

    underlying: Box<dyn HeatTransferModel>,
    partitioning: Box<dyn PartitioningModel>,
    nucleation: Box<dyn NucleationSiteModel>,
    departure_diameter: Box<dyn DepartureDiameterModel>,
    departure_frequency: Box<dyn DepartureFrequencyModel>,

    wet_fraction: ScalarField,
    d_departure: ScalarField,
    f_departure: ScalarField,
    n_density: ScalarField,
    dmdtf: ScalarField,
    qq: ScalarField,
    t_surface: ScalarField,
    k_unrelaxed: ScalarField,
    k: ScalarField,

    cache: Option<CacheKey>,
    has_previous: bool,
    generation: u64,
    layout: u64,
}

impl std::fmt::Debug for WallBoiling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WallBoiling")
            .field("interface", &self.interface.name())
            .field("vapour", &self.vapour)
            .field("relax", &self.relax)
            .field("underlying", &self.underlying.type_name())
            .field("partitioning", &self.partitioning.type_name())
            .field("nucleation", &self.nucleation.type_name())
            .field("departure_diameter", &self.departure_diameter.type_name())
            .field("departure_frequency", &self.departure_frequency.type_name())
            .finish_non_exhaustive()
    }
}

impl WallBoiling {
    pub const TYPE_NAME: &'static str = "wallBoiling";

    pub fn new(dict: &Dict, ctx: &HeatTransferContext) -> ConfigResult<Self> {
        let vapour: String = dict.lookup("vapourPhase")?;
        if !ctx.interface.contains(&vapour) {
            return Err(ConfigError::PhaseNotInInterface {
                phase: vapour,
                interface: ctx.interface.name(),
            });
        }
        let liquid = ctx.interface.other_phase(&vapour)?.to_string();
        let interface = ctx.interface.with_side(&liquid)?;

        let underlying_ctx = ctx.on(interface.with_side(&vapour)?).unregistered();
        let underlying = HeatTransferModels::create(&dict.sub_dict(UNDERLYING)?, &underlying_ctx)?;
        let relax = read_relax(dict)?;

        let partitioning = PartitioningModels::create(&dict.sub_dict(PARTITIONING)?, &())?;
        let nucleation = NucleationSiteModels::create(&dict.sub_dict(NUCLEATION)?, &())?;
        let departure_diameter =
            DepartureDiameterModels::create(&dict.sub_dict(DEPARTURE_DIAMETER)?, &())?;
        let departure_frequency =
            DepartureFrequencyModels::create(&dict.sub_dict(DEPARTURE_FREQUENCY)?, &())?;

        let n = match ctx.phases.read() {
            Ok(phases) => phases.n_cells(),
            Err(poisoned) => poisoned.into_inner().n_cells(),
        };
        let name = interface.name();
        let field = |what: &str| ScalarField::zeros(format!("{what}.{name}"), n);

        tracing::debug!(
            interface = %name,
            vapour = %vapour,
            underlying = underlying.type_name(),
            partitioning = partitioning.type_name(),
            nucleation = nucleation.type_name(),
            departure_diameter = departure_diameter.type_name(),
            departure_frequency = departure_frequency.type_name(),
            relax,
            "wall boiling model"
        );

        Ok(Self {
            wet_fraction: field("wetFraction"),
            d_departure: field("dDeparture"),
            f_departure: field("fDeparture"),
            n_density: field("nucleationSiteDensity"),
            dmdtf: field("dmdtf"),
            qq: field("qQuenching"),
            t_surface: field("Tsurface"),
            k_unrelaxed: field("Kunrelaxed"),
            k: field("K"),
            interface,
            liquid,
            vapour,
            phases: Arc::clone(&ctx.phases),
            relax,
            underlying,
            partitioning,
            nucleation,
            departure_diameter,
            departure_frequency,
            cache: None,
            has_previous: false,
            generation: 0,
            layout: 0,
        })
    }

    pub fn liquid_phase(&self) -> &str {
        &self.liquid
    }

    pub fn vapour_phase(&self) -> &str {
        &self.vapour
    }

    pub fn relax_factor(&self) -> f64 {
        self.relax
    }

    pub fn underlying(&self) -> &dyn HeatTransferModel {
        self.underlying.as_ref()
    }

    pub fn wet_fraction(&self) -> &ScalarField {
        &self.wet_fraction
    }

    pub fn departure_diameter(&self) -> &ScalarField {
        &self.d_departure
    }

    pub fn departure_frequency(&self) -> &ScalarField {
        &self.f_departure
    }

    pub fn nucleation_site_density(&self) -> &ScalarField {
        &self.n_density
    }

    pub fn quenching_heat_flux(&self) -> &ScalarField {
        &self.qq
    }

    pub fn surface_temperature(&self) -> &ScalarField {
        &self.t_surface
    }

    /// K before under-relaxation, from the latest recomputation.
    pub fn k_unrelaxed(&self) -> &ScalarField {
        &self.k_unrelaxed
    }

    fn cached_fields_mut(&mut self) -> [&mut ScalarField; 9] {
        [
            &mut self.wet_fraction,
            &mut self.d_departure,
            &mut self.f_departure,
            &mut self.n_density,
            &mut self.dmdtf,
            &mut self.qq,
            &mut self.t_surface,
            &mut self.k_unrelaxed,
            &mut self.k,
        ]
    }

    fn cached_fields(&self) -> [&ScalarField; 9] {
        [
            &self.wet_fraction,
            &self.d_departure,
            &self.f_departure,
            &self.n_density,
            &self.dmdtf,
            &self.qq,
            &self.t_surface,
            &self.k_unrelaxed,
            &self.k,
        ]
    }

    fn recompute(&mut self, residual_alpha: f64) -> HeatResult<()> {
        let k_underlying = self.underlying.k(residual_alpha)?.values().to_vec();

        let shared = Arc::clone(&self.phases);
        let phases = read_phases(&shared)?;
        let liquid = phases.phase(&self.liquid)?;
        let vapour = phases.phase(&self.vapour)?;
        let saturation = phases.saturation();
        let wall = phases.wall();
        let n = phases.n_cells();
        for (what, len) in [("underlying K", k_underlying.len()), ("K", self.k.len())] {
            if len != n {
                return Err(HeatError::Mesh(MeshError::SizeMismatch {
                    what: what.to_string(),
                    expected: n,
                    actual: len,
                }));
            }
        }

        for i in 0..n {
            let cell = WallConditions {
                t_wall: wall.temperature.values()[i],
                t_sat: saturation.t_sat.values()[i],
                t_liquid: liquid.temperature.values()[i],
                alpha_liquid: liquid.alpha.values()[i],
                rho_liquid: liquid.rho.values()[i],
                rho_vapour: vapour.rho.values()[i],
                kappa_liquid: liquid.kappa.values()[i],
                cp_liquid: liquid.cp.values()[i],
                sigma: saturation.sigma.values()[i],
                latent_heat: saturation.latent_heat.values()[i],
            };
            let area_density = wall.area_density.values()[i];

            // Partitioning comes last: it reads the bubble population.
            let n_density = self.nucleation.site_density(&cell);
            let d_dep = self.departure_diameter.departure_diameter(&cell);
            let f_dep = self.departure_frequency.departure_frequency(&cell, d_dep);
            let wet = self.partitioning.wetted_fraction(cell.alpha_liquid);

            let bubble_area = (PI * d_dep * d_dep * n_density * K_BUBBLE / 4.0).min(1.0);
            let wall_superheat = (cell.t_wall - cell.t_liquid).max(0.0);

            // Evaporation per unit wall area, then per unit volume.
            let m_dot = PI / 6.0 * d_dep.powi(3) * cell.rho_vapour * f_dep * n_density;
            let dmdtf = wet * m_dot * area_density;

            let diffusivity = cell.kappa_liquid / (cell.rho_liquid * cell.cp_liquid);
            let h_quench = if f_dep > 0.0 {
                let t_wait = WAIT_FRACTION / f_dep;
                2.0 * cell.kappa_liquid * f_dep * (t_wait / (PI * diffusivity)).sqrt()
            } else {
                0.0
            };
            let qq = wet * bubble_area * h_quench * wall_superheat;
            let qe = wet * m_dot * cell.latent_heat;
            let k_boiling = area_density * (qq + qe) / wall_superheat.max(DELTA_T_MIN);

            self.n_density.values_mut()[i] = n_density;
            self.d_departure.values_mut()[i] = d_dep;
            self.f_departure.values_mut()[i] = f_dep;
            self.wet_fraction.values_mut()[i] = wet;
            self.dmdtf.values_mut()[i] = dmdtf;
            self.qq.values_mut()[i] = qq;
            self.t_surface.values_mut()[i] = cell.t_wall.max(cell.t_liquid);
            self.k_unrelaxed.values_mut()[i] = k_underlying[i] + k_boiling;
        }

        if self.has_previous {
            for (k, &computed) in self.k.values_mut().iter_mut().zip(self.k_unrelaxed.values()) {
                *k = relax(computed, *k, self.relax);
            }
        } else {
            self.k.values_mut().copy_from_slice(self.k_unrelaxed.values());
            self.has_previous = true;
        }
        Ok(())
    }

    /// Sub-blocks in sub-model order, each checked to keep its type and to
    /// build a valid model on its own.
    fn staged_blocks(&self, dict: &Dict) -> ConfigResult<[Dict; 5]> {
        let blocks = [
            check_same_type(dict, UNDERLYING, self.underlying.type_name())?,
            check_same_type(dict, PARTITIONING, self.partitioning.type_name())?,
            check_same_type(dict, NUCLEATION, self.nucleation.type_name())?,
            check_same_type(dict, DEPARTURE_DIAMETER, self.departure_diameter.type_name())?,
            check_same_type(dict, DEPARTURE_FREQUENCY, self.departure_frequency.type_name())?,
        ];
        let underlying_ctx = HeatTransferContext::new(
            self.interface.with_side(&self.vapour)?,
            Arc::clone(&self.phases),
        )
        .unregistered();
        HeatTransferModels::create(&blocks[0], &underlying_ctx)?;
        PartitioningModels::create(&blocks[1], &())?;
        NucleationSiteModels::create(&blocks[2], &())?;
        DepartureDiameterModels::create(&blocks[3], &())?;
        DepartureFrequencyModels::create(&blocks[4], &())?;
        Ok(blocks)
    }

    fn apply_blocks(&mut self, blocks: &[Dict; 5]) -> ConfigResult<bool> {
        let [underlying, partitioning, nucleation, d_departure, f_departure] = blocks;
        let mut changed = self.underlying.read_coeffs(underlying)?;
        changed |= self.partitioning.read_coeffs(partitioning)?;
        changed |= self.nucleation.read_coeffs(nucleation)?;
        changed |= self.departure_diameter.read_coeffs(d_departure)?;
        changed |= self.departure_frequency.read_coeffs(f_departure)?;
        Ok(changed)
    }

    fn current_key(&self, residual_alpha: f64) -> HeatResult<CacheKey> {
        Ok(CacheKey {
            revision: read_phases(&self.phases)?.revision(),
            residual_alpha: residual_alpha.to_bits(),
            generation: self.generation,
            layout: self.layout,
        })
    }

    fn invalidate_layout(&mut self) {
        self.layout += 1;
        self.cache = None;
    }
}

fn read_relax(dict: &Dict) -> ConfigResult<f64> {
    let relax: f64 = dict.lookup_or("relax", 1.0)?;
    if !(0.0..=1.0).contains(&relax) {
        return Err(ConfigError::BadValue {
            dict: dict.path().to_string(),
            key: "relax".to_string(),
            reason: format!("must lie in [0, 1], got {relax}"),
        });
    }
    Ok(relax)
}

/// Sub-model blocks cannot switch variant on a live model.
fn check_same_type(dict: &Dict, key: &str, current: &str) -> ConfigResult<Dict> {
    let sub = dict.sub_dict(key)?;
    let tag = sub.type_name()?;
    if tag != current {
        return Err(ConfigError::BadValue {
            dict: sub.path().to_string(),
            key: cf_config::TYPE_KEY.to_string(),
            reason: format!("cannot change {current} to {tag} without rebuilding the model"),
        });
    }
    Ok(sub)
}

impl HeatTransferModel for WallBoiling {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn interface(&self) -> &PhaseInterface {
        &self.interface
    }

    fn k(&mut self, residual_alpha: f64) -> HeatResult<&ScalarField> {
        let key = self.current_key(residual_alpha)?;
        if self.cache == Some(key) {
            tracing::trace!(interface = %self.interface, "wall boiling K reused");
            return Ok(&self.k);
        }
        self.cache = None;
        self.recompute(residual_alpha)?;
        self.cache = Some(key);
        tracing::trace!(
            interface = %self.interface,
            revision = key.revision,
            "wall boiling K recomputed"
        );
        Ok(&self.k)
    }

    /// All-or-nothing: every block is validated before any coefficient
    /// changes, so a rejected dict leaves the model and its caches as they
    /// were.
    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool> {
        let relax = read_relax(dict)?;
        let blocks = self.staged_blocks(dict)?;

        match self.apply_blocks(&blocks) {
            Ok(sub_changed) => {
                let changed = sub_changed || relax != self.relax;
                self.relax = relax;
                if changed {
                    self.generation += 1;
                    tracing::debug!(interface = %self.interface, "wall boiling coefficients changed");
                }
                Ok(changed)
            }
            Err(e) => {
                // Some sub-models may already hold the new coefficients.
                self.generation += 1;
                tracing::warn!(interface = %self.interface, error = %e, "wall boiling re-read failed part way");
                Err(e)
            }
        }
    }

    fn phase_change(&self) -> Option<&dyn PhaseChangeSource> {
        Some(self)
    }
}

impl PhaseChangeSource for WallBoiling {
    fn active_phase_interface(&self, key: &PhaseInterfaceKey) -> bool {
        self.interface.key().same_pair(key)
    }

    /// Evaporation runs liquid to vapour, so the sign flips when the
    /// interface lists the vapour first.
    fn flip_sign(&self) -> bool {
        self.interface.phase1() == self.vapour
    }

    fn dmdtf(&self) -> HeatResult<&ScalarField> {
        let current = read_phases(&self.phases)?.revision();
        match self.cache {
            Some(key)
                if key.revision == current
                    && key.generation == self.generation
                    && key.layout == self.layout =>
            {
                Ok(&self.dmdtf)
            }
            _ => Err(HeatError::NotYetComputed {
                what: "dmdtf",
                requires: "K",
            }),
        }
    }
}

impl MeshAdaptive for WallBoiling {
    fn topo_change(&mut self, map: &TopoChangeMap) -> MeshResult<()> {
        self.underlying.topo_change(map)?;
        for field in self.cached_fields_mut() {
            let fill = field.fill_value();
            field.map_topo(map, fill)?;
        }
        self.invalidate_layout();
        Ok(())
    }

    fn map_mesh(&mut self, map: &MeshMap) -> MeshResult<()> {
        self.underlying.map_mesh(map)?;
        for field in self.cached_fields_mut() {
            let fill = field.fill_value();
            field.map_mesh(map, fill)?;
        }
        self.invalidate_layout();
        Ok(())
    }

    fn distribute(&mut self, map: &DistributionMap) -> MeshResult<()> {
        self.underlying.distribute(map)?;
        for field in self.cached_fields_mut() {
            field.distribute(map)?;
        }
        self.invalidate_layout();
        Ok(())
    }
}

impl AdaptationState for WallBoiling {
    fn field_lengths(&self) -> Vec<(String, usize)> {
        self.cached_fields()
            .iter()
            .map(|f| (f.name().to_string(), f.len()))
            .collect()
    }
}

fn build(dict: &Dict, ctx: &HeatTransferContext) -> ConfigResult<Box<dyn HeatTransferModel>> {
    Ok(Box::new(WallBoiling::new(dict, ctx)?))
}

register_model!(HeatTransferModels, "wallBoiling", build);
