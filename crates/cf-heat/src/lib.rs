//! cf-heat: interfacial heat-transfer models for multiphase flow.
//!
//! Provides:
//! - phase interfaces and the shared `PhaseSystem` state models read from
//! - the `HeatTransferModel` capability and its registry family, with
//!   Nusselt-correlation variants (`spherical`, `constantNu`,
//!   `RanzMarshall`, `Gunn`)
//! - four wall-boiling sub-model families and the `wallBoiling` composite,
//!   which also acts as a phase-change source
//!
//! Models are built from configuration through `cf-registry`; see
//! [`HeatTransferModels`].

pub mod error;
pub mod model;
pub mod nusselt;
pub mod phase;
pub mod wall_boiling;

pub use error::{HeatError, HeatResult};
pub use model::{HeatTransferContext, HeatTransferModel, HeatTransferModels, PhaseChangeSource};
pub use nusselt::{
    ConstantNuHeatTransfer, GunnHeatTransfer, NusseltHeatTransfer, RanzMarshallHeatTransfer,
    SphericalHeatTransfer,
};
pub use phase::{
    PhaseInterface, PhaseInterfaceKey, PhaseState, PhaseSystem, SharedPhaseSystem, UniformPhase,
    UniformSaturation, UniformState, UniformWall, read_phases, write_phases,
};
pub use wall_boiling::WallBoiling;
