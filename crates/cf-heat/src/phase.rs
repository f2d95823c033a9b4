//! Phases, phase interfaces and the shared phase-system state.

use crate::error::{HeatError, HeatResult};
use cf_config::{ConfigError, ConfigResult};
use cf_mesh::{DistributionMap, MeshAdaptive, MeshMap, MeshResult, ScalarField, TopoChangeMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Boundary between two named phases, optionally seen from one side.
///
/// `phase1` is treated as the dispersed phase and `phase2` as the
/// continuous one by models that need the distinction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseInterface {
    phase1: String,
    phase2: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    side: Option<String>,
}

impl PhaseInterface {
    pub fn new(phase1: impl Into<String>, phase2: impl Into<String>) -> Self {
        Self {
            phase1: phase1.into(),
            phase2: phase2.into(),
            side: None,
        }
    }

    /// Same interface, oriented towards `phase`.
    pub fn with_side(&self, phase: &str) -> ConfigResult<Self> {
        self.check_member(phase)?;
        Ok(Self {
            side: Some(phase.to_string()),
            ..self.clone()
        })
    }

    pub fn phase1(&self) -> &str {
        &self.phase1
    }

    pub fn phase2(&self) -> &str {
        &self.phase2
    }

    pub fn side(&self) -> Option<&str> {
        self.side.as_deref()
    }

    pub fn dispersed(&self) -> &str {
        &self.phase1
    }

    pub fn continuous(&self) -> &str {
        &self.phase2
    }

    pub fn contains(&self, phase: &str) -> bool {
        self.phase1 == phase || self.phase2 == phase
    }

    /// The member that is not `phase`.
    pub fn other_phase(&self, phase: &str) -> ConfigResult<&str> {
        self.check_member(phase)?;
        Ok(if self.phase1 == phase {
            &self.phase2
        } else {
            &self.phase1
        })
    }

    pub fn key(&self) -> PhaseInterfaceKey {
        PhaseInterfaceKey::new(&self.phase1, &self.phase2)
    }

    /// `a_b`, or `a_b_inThe_c` when sided.
    pub fn name(&self) -> String {
        match &self.side {
            Some(side) => format!("{}_{}_inThe_{side}", self.phase1, self.phase2),
            None => format!("{}_{}", self.phase1, self.phase2),
        }
    }

    fn check_member(&self, phase: &str) -> ConfigResult<()> {
        if self.contains(phase) {
            Ok(())
        } else {
            Err(ConfigError::PhaseNotInInterface {
                phase: phase.to_string(),
                interface: self.name(),
            })
        }
    }
}

impl fmt::Display for PhaseInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Ordered phase pair identifying a mass-transfer direction: positive
/// transfer goes from `first` to `second`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhaseInterfaceKey {
    first: String,
    second: String,
}

impl PhaseInterfaceKey {
    pub fn new(first: &str, second: &str) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    /// True when both keys name the same phases, in either order.
    pub fn same_pair(&self, other: &PhaseInterfaceKey) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }
}

/// Uniform initial state of one phase, as written in case files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformPhase {
    pub alpha: f64,
    #[serde(rename = "T")]
    pub temperature: f64,
    pub rho: f64,
    pub kappa: f64,
    #[serde(rename = "Cp")]
    pub cp: f64,
    pub mu: f64,
    #[serde(default = "default_diameter")]
    pub d: f64,
}

fn default_diameter() -> f64 {
    1.0e-3
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformSaturation {
    #[serde(rename = "Tsat")]
    pub t_sat: f64,
    #[serde(rename = "L")]
    pub latent_heat: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformWall {
    #[serde(rename = "T")]
    pub temperature: f64,
    /// Heated wall area per unit cell volume [1/m].
    #[serde(rename = "areaDensity")]
    pub area_density: f64,
}

/// Uniform initial state of a whole phase system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformState {
    pub phases: BTreeMap<String, UniformPhase>,
    pub saturation: UniformSaturation,
    pub wall: UniformWall,
    #[serde(rename = "slipVelocity", default)]
    pub slip_velocity: f64,
}

/// Cell fields of one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseState {
    pub alpha: ScalarField,
    pub temperature: ScalarField,
    pub rho: ScalarField,
    pub kappa: ScalarField,
    pub cp: ScalarField,
    pub mu: ScalarField,
    pub d: ScalarField,
}

impl PhaseState {
    pub fn uniform(name: &str, n_cells: usize, state: &UniformPhase) -> Self {
        let field = |what: &str, v: f64| ScalarField::uniform(format!("{what}.{name}"), n_cells, v);
        Self {
            alpha: field("alpha", state.alpha),
            temperature: field("T", state.temperature),
            rho: field("rho", state.rho),
            kappa: field("kappa", state.kappa),
            cp: field("Cp", state.cp),
            mu: field("mu", state.mu),
            d: field("d", state.d),
        }
    }

    fn fields_mut(&mut self) -> [&mut ScalarField; 7] {
        [
            &mut self.alpha,
            &mut self.temperature,
            &mut self.rho,
            &mut self.kappa,
            &mut self.cp,
            &mut self.mu,
            &mut self.d,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Saturation {
    pub t_sat: ScalarField,
    pub latent_heat: ScalarField,
    pub sigma: ScalarField,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    pub temperature: ScalarField,
    pub area_density: ScalarField,
}

/// Shared, mutable physical context handed to heat-transfer models.
pub type SharedPhaseSystem = Arc<RwLock<PhaseSystem>>;

/// Per-cell state of every phase plus saturation and wall data.
///
/// Every mutable access bumps [`PhaseSystem::revision`], which is what
/// models compare against to decide whether their caches are stale.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSystem {
    n_cells: usize,
    phases: BTreeMap<String, PhaseState>,
    saturation: Saturation,
    wall: Wall,
    slip_velocity: ScalarField,
    revision: u64,
}

impl PhaseSystem {
    pub fn uniform(n_cells: usize, state: &UniformState) -> Self {
        let phases = state
            .phases
            .iter()
            .map(|(name, phase)| (name.clone(), PhaseState::uniform(name, n_cells, phase)))
            .collect();
        Self {
            n_cells,
            phases,
            saturation: Saturation {
                t_sat: ScalarField::uniform("Tsat", n_cells, state.saturation.t_sat),
                latent_heat: ScalarField::uniform("L", n_cells, state.saturation.latent_heat),
                sigma: ScalarField::uniform("sigma", n_cells, state.saturation.sigma),
            },
            wall: Wall {
                temperature: ScalarField::uniform("Twall", n_cells, state.wall.temperature),
                area_density: ScalarField::uniform("areaDensity", n_cells, state.wall.area_density),
            },
            slip_velocity: ScalarField::uniform("Ur", n_cells, state.slip_velocity),
            revision: 0,
        }
    }

    pub fn shared(self) -> SharedPhaseSystem {
        Arc::new(RwLock::new(self))
    }

    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn phase_names(&self) -> impl Iterator<Item = &str> {
        self.phases.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.phases.contains_key(name)
    }

    pub fn phase(&self, name: &str) -> HeatResult<&PhaseState> {
        self.phases.get(name).ok_or_else(|| HeatError::UnknownPhase {
            name: name.to_string(),
        })
    }

    pub fn phase_mut(&mut self, name: &str) -> HeatResult<&mut PhaseState> {
        let phase = self
            .phases
            .get_mut(name)
            .ok_or_else(|| HeatError::UnknownPhase {
                name: name.to_string(),
            })?;
        self.revision += 1;
        Ok(phase)
    }

    pub fn saturation(&self) -> &Saturation {
        &self.saturation
    }

    pub fn saturation_mut(&mut self) -> &mut Saturation {
        self.revision += 1;
        &mut self.saturation
    }

    pub fn wall(&self) -> &Wall {
        &self.wall
    }

    pub fn wall_mut(&mut self) -> &mut Wall {
        self.revision += 1;
        &mut self.wall
    }

    pub fn slip_velocity(&self) -> &ScalarField {
        &self.slip_velocity
    }

    pub fn slip_velocity_mut(&mut self) -> &mut ScalarField {
        self.revision += 1;
        &mut self.slip_velocity
    }

    /// Fields in a fixed order, identical on every rank.
    fn fields_mut(&mut self) -> Vec<&mut ScalarField> {
        let mut fields: Vec<&mut ScalarField> = self
            .phases
            .values_mut()
            .flat_map(|p| p.fields_mut())
            .collect();
        fields.extend([
            &mut self.saturation.t_sat,
            &mut self.saturation.latent_heat,
            &mut self.saturation.sigma,
            &mut self.wall.temperature,
            &mut self.wall.area_density,
            &mut self.slip_velocity,
        ]);
        fields
    }

    fn adapted(&mut self, n_cells: usize) {
        self.n_cells = n_cells;
        self.revision += 1;
    }
}

impl MeshAdaptive for PhaseSystem {
    fn topo_change(&mut self, map: &TopoChangeMap) -> MeshResult<()> {
        for field in self.fields_mut() {
            let fill = field.fill_value();
            field.map_topo(map, fill)?;
        }
        self.adapted(map.n_new_cells());
        Ok(())
    }

    fn map_mesh(&mut self, map: &MeshMap) -> MeshResult<()> {
        for field in self.fields_mut() {
            let fill = field.fill_value();
            field.map_mesh(map, fill)?;
        }
        self.adapted(map.n_new_cells());
        Ok(())
    }

    fn distribute(&mut self, map: &DistributionMap) -> MeshResult<()> {
        for field in self.fields_mut() {
            field.distribute(map)?;
        }
        self.adapted(map.n_new_cells());
        Ok(())
    }
}

pub fn read_phases(phases: &SharedPhaseSystem) -> HeatResult<RwLockReadGuard<'_, PhaseSystem>> {
    phases.read().map_err(|_| HeatError::Poisoned)
}

pub fn write_phases(phases: &SharedPhaseSystem) -> HeatResult<RwLockWriteGuard<'_, PhaseSystem>> {
    phases.write().map_err(|_| HeatError::Poisoned)
}
