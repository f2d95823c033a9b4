//! Case driver: owns the mesh and everything defined on it, steps the
//! models and routes mesh events to every owner of cell-indexed state.

use crate::case::Case;
use crate::error::{AppError, AppResult};
use cf_cloud::{Cloud, Parcel};
use cf_config::Dict;
use cf_core::{ParticleId, ensure_finite};
use cf_heat::{
    HeatTransferContext, HeatTransferModel, HeatTransferModels, PhaseSystem, SharedPhaseSystem,
    read_phases, write_phases,
};
use cf_mesh::{
    DistributionMap, Mesh, MeshAdaptive, MeshMap, ObjectRegistry, ScalarField, TopoChangeMap,
};
use cf_registry::ModelFamily;
use cf_xi::{XiContext, XiModel, XiModels};

const XI_OBJECT: &str = "XiModel";

/// Per-interface summary of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceReport {
    pub name: String,
    pub model: &'static str,
    /// Smallest and largest K over the local cells; `None` on an empty rank.
    pub k_range: Option<(f64, f64)>,
    /// Volume-integrated phase-change rate, signed from the interface's
    /// first phase to its second. `None` for models without phase change.
    pub mass_transfer: Option<f64>,
}

/// What one call to [`Driver::step`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub step: usize,
    pub n_cells: usize,
    /// Range of the flame-wrinkling factor, if the case burns.
    pub xi: Option<(f64, f64)>,
    pub interfaces: Vec<InterfaceReport>,
    pub parcels: usize,
}

/// Runs a [`Case`].
///
/// The phase system is adapted first on every mesh event, since models may
/// read it while remapping their own fields; then every registered object
/// in registration order (Xi model, heat-transfer models, clouds).
pub struct Driver {
    name: String,
    mesh: Mesh,
    phases: SharedPhaseSystem,
    objects: ObjectRegistry,
    heat_models: Vec<String>,
    clouds: Vec<String>,
    has_xi: bool,
    residual_alpha: f64,
    step: usize,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("name", &self.name)
            .field("mesh", &self.mesh)
            .field("objects", &self.objects)
            .field("step", &self.step)
            .finish_non_exhaustive()
    }
}

impl Driver {
    /// Build every model the case selects on a serial mesh.
    pub fn new(case: &Case) -> AppResult<Self> {
        Self::on_mesh(case, Mesh::new(case.mesh.cells))
    }

    /// Build on a given (possibly partitioned) mesh; the case's cell count
    /// is ignored in favour of the mesh's. Parcel ids are their index in the
    /// case, so they stay unique across ranks.
    pub fn on_mesh(case: &Case, mesh: Mesh) -> AppResult<Self> {
        let n_cells = mesh.n_cells();
        let phases = PhaseSystem::uniform(n_cells, &case.state).shared();
        let mut objects = ObjectRegistry::new(case.name.clone());

        let has_xi = match &case.combustion {
            Some(def) => {
                let ctx = XiContext::new(ScalarField::uniform("Su", n_cells, def.su));
                let xi = XiModels::create(&def.xi_model.clone().renamed(XI_OBJECT), &ctx)?;
                objects.register(XI_OBJECT, xi)?;
                true
            }
            None => false,
        };

        let mut heat_models = Vec::with_capacity(case.heat_transfer.len());
        for def in &case.heat_transfer {
            let ctx = HeatTransferContext::new(def.phase_interface(), phases.clone());
            let model = HeatTransferModels::create(&def.model_dict(), &ctx)?;
            let name = object_name(model.as_ref());
            tracing::info!(case = %case.name, model = %name, "heat transfer model selected");
            objects.register(name.clone(), model)?;
            heat_models.push(name);
        }

        // Parcel cells are global under a block decomposition: rank r holds
        // cells [r * n_cells, (r + 1) * n_cells).
        let offset = mesh.rank() * n_cells;
        let mut clouds = Vec::with_capacity(case.clouds.len());
        for def in &case.clouds {
            let mut cloud = Cloud::new(def.name.clone(), &mesh);
            for (index, p) in def.parcels.iter().enumerate() {
                if !(offset..offset + n_cells).contains(&p.cell) {
                    continue;
                }
                let id = u32::try_from(index)
                    .ok()
                    .and_then(ParticleId::from_index)
                    .ok_or_else(|| {
                        AppError::Validation(format!("cloud '{}' has too many parcels", def.name))
                    })?;
                cloud.push(Parcel::new(id, p.cell - offset, p.mass, p.diameter, p.temperature))?;
            }
            let path = cloud.path();
            objects.register(path.clone(), cloud)?;
            clouds.push(path);
        }

        tracing::info!(
            case = %case.name,
            cells = n_cells,
            objects = objects.len(),
            "case assembled"
        );
        Ok(Self {
            name: case.name.clone(),
            mesh,
            phases,
            objects,
            heat_models,
            clouds,
            has_xi,
            residual_alpha: case.residual_alpha,
            step: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn phases(&self) -> &SharedPhaseSystem {
        &self.phases
    }

    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    /// Registry names of the heat-transfer models, in case order.
    pub fn heat_model_names(&self) -> &[String] {
        &self.heat_models
    }

    pub fn cloud(&self, path: &str) -> AppResult<&Cloud<Parcel>> {
        Ok(self.objects.lookup::<Cloud<Parcel>>(path)?)
    }

    pub fn xi(&self) -> AppResult<Option<&ScalarField>> {
        if !self.has_xi {
            return Ok(None);
        }
        let model = self.objects.lookup::<Box<dyn XiModel>>(XI_OBJECT)?;
        Ok(Some(model.xi()))
    }

    pub fn heat_model(&self, name: &str) -> AppResult<&dyn HeatTransferModel> {
        Ok(self.objects.lookup::<Box<dyn HeatTransferModel>>(name)?.as_ref())
    }

    /// Raise (or lower) the wall temperature uniformly by `delta` kelvin.
    pub fn ramp_wall_temperature(&mut self, delta: f64) -> AppResult<()> {
        let mut phases = write_phases(&self.phases)?;
        for t in phases.wall_mut().temperature.values_mut() {
            *t += delta;
        }
        Ok(())
    }

    /// Advance one step: correct Xi, evaluate every interface's K and
    /// collect the phase-change rates.
    pub fn step(&mut self) -> AppResult<StepReport> {
        self.step += 1;
        let _span = tracing::debug_span!("step", case = %self.name, step = self.step).entered();

        let xi = if self.has_xi {
            let model = self.objects.lookup_mut::<Box<dyn XiModel>>(XI_OBJECT)?;
            model.correct();
            extent(model.xi())
        } else {
            None
        };

        let mut interfaces = Vec::with_capacity(self.heat_models.len());
        for name in &self.heat_models {
            let model = self.objects.lookup_mut::<Box<dyn HeatTransferModel>>(name)?;
            let k_range = extent(model.k(self.residual_alpha)?);
            if let Some((lo, hi)) = k_range {
                ensure_finite(lo, "heat transfer coefficient")?;
                ensure_finite(hi, "heat transfer coefficient")?;
            }
            let mass_transfer = match model.phase_change() {
                Some(source) => {
                    let total: f64 = source.dmdtf()?.values().iter().sum();
                    let total = ensure_finite(total, "phase change rate")?;
                    Some(if source.flip_sign() { -total } else { total })
                }
                None => None,
            };
            interfaces.push(InterfaceReport {
                name: name.clone(),
                model: model.type_name(),
                k_range,
                mass_transfer,
            });
        }

        let mut parcels = 0;
        for path in &self.clouds {
            parcels += self.objects.lookup::<Cloud<Parcel>>(path)?.len();
        }

        Ok(StepReport {
            step: self.step,
            n_cells: self.mesh.n_cells(),
            xi,
            interfaces,
            parcels,
        })
    }

    /// Re-read model coefficients from an edited case. Returns the names of
    /// the objects whose coefficients changed.
    ///
    /// The set of models, their interfaces and their types must match the
    /// running case. Every block is validated by building a throwaway model
    /// from it before any running model is touched, so a rejected case
    /// leaves the driver as it was.
    pub fn reconfigure(&mut self, case: &Case) -> AppResult<Vec<String>> {
        let xi_dict = self.staged_xi(case)?;
        let heat_dicts = self.staged_heat_models(case)?;

        let mut changed = Vec::new();
        if let Some(dict) = &xi_dict {
            let model = self.objects.lookup_mut::<Box<dyn XiModel>>(XI_OBJECT)?;
            if model.read_coeffs(dict)? {
                changed.push(XI_OBJECT.to_string());
            }
        }
        for (dict, name) in heat_dicts.iter().zip(&self.heat_models) {
            let model = self.objects.lookup_mut::<Box<dyn HeatTransferModel>>(name)?;
            if model.read_coeffs(dict)? {
                changed.push(name.clone());
            }
        }
        if !changed.is_empty() {
            tracing::info!(case = %self.name, ?changed, "coefficients re-read");
        }
        Ok(changed)
    }

    fn staged_xi(&self, case: &Case) -> AppResult<Option<Dict>> {
        let Some(def) = &case.combustion else {
            if self.has_xi {
                return Err(AppError::Validation(
                    "cannot remove the XiModel from a running case".into(),
                ));
            }
            return Ok(None);
        };
        if !self.has_xi {
            return Err(AppError::Validation("cannot add a XiModel to a running case".into()));
        }
        let running = self.objects.lookup::<Box<dyn XiModel>>(XI_OBJECT)?.type_name();
        let dict = def.xi_model.clone().renamed(XI_OBJECT);
        if dict.type_name()? != running {
            return Err(AppError::Validation(format!(
                "'{XI_OBJECT}' cannot change type from {running} to {}",
                dict.type_name()?
            )));
        }
        let ctx = XiContext::new(ScalarField::uniform("Su", self.mesh.n_cells(), def.su));
        XiModels::create(&dict, &ctx)?;
        Ok(Some(dict))
    }

    fn staged_heat_models(&self, case: &Case) -> AppResult<Vec<Dict>> {
        if case.heat_transfer.len() != self.heat_models.len() {
            return Err(AppError::Validation(format!(
                "case has {} heat transfer models, running case has {}",
                case.heat_transfer.len(),
                self.heat_models.len()
            )));
        }
        let mut dicts = Vec::with_capacity(self.heat_models.len());
        for (def, name) in case.heat_transfer.iter().zip(&self.heat_models) {
            let running = self.heat_model(name)?.type_name();
            let dict = def.model_dict();
            if dict.type_name()? != running {
                return Err(AppError::Validation(format!(
                    "'{name}' cannot change type from {running} to {}",
                    dict.type_name()?
                )));
            }
            let ctx = HeatTransferContext::new(def.phase_interface(), self.phases.clone())
                .unregistered();
            let candidate = HeatTransferModels::create(&dict, &ctx)?;
            if object_name(candidate.as_ref()) != *name {
                return Err(AppError::Validation(format!(
                    "'{name}' cannot move to interface {}",
                    candidate.interface()
                )));
            }
            dicts.push(dict);
        }
        Ok(dicts)
    }

    /// Refine or coarsen the mesh locally.
    pub fn topo_change(&mut self, map: &TopoChangeMap) -> AppResult<()> {
        self.mesh.apply_topo_change(map)?;
        write_phases(&self.phases)?.topo_change(map)?;
        self.objects.topo_change(map)?;
        self.after_event("topo_change")
    }

    /// Replace the mesh by a related one.
    pub fn map_mesh(&mut self, map: &MeshMap) -> AppResult<()> {
        self.mesh.apply_mesh_map(map)?;
        write_phases(&self.phases)?.map_mesh(map)?;
        self.objects.map_mesh(map)?;
        self.after_event("map_mesh")
    }

    /// Move cells between ranks. Every rank must call this with its side of
    /// the same redistribution.
    pub fn distribute(&mut self, map: &DistributionMap) -> AppResult<()> {
        self.mesh.apply_distribution(map)?;
        write_phases(&self.phases)?.distribute(map)?;
        self.objects.distribute(map)?;
        self.after_event("distribute")
    }

    fn after_event(&self, event: &'static str) -> AppResult<()> {
        let phase_cells = read_phases(&self.phases)?.n_cells();
        if phase_cells != self.mesh.n_cells() {
            return Err(AppError::Mesh(format!(
                "phase system has {phase_cells} cells after {event}, mesh has {}",
                self.mesh.n_cells()
            )));
        }
        tracing::info!(case = %self.name, event, cells = phase_cells, "mesh adapted");
        Ok(())
    }
}

fn object_name(model: &dyn HeatTransferModel) -> String {
    format!("heatTransferModel.{}", model.interface().name())
}

fn extent(field: &ScalarField) -> Option<(f64, f64)> {
    field.min().zip(field.max())
}
