//! cf-app: case loading and the driver behind the command-line front end.
//!
//! Linking this crate links every model crate, so the global model
//! registry sees all built-in variants.

pub mod case;
pub mod driver;
pub mod error;

pub use case::{Case, load_case, parse_case, validate_case};
pub use driver::{Driver, InterfaceReport, StepReport};
pub use error::{AppError, AppResult};

use cf_registry::{ModelRegistry, RegistryEntry};

/// Every model variant available to case files, by family then tag.
pub fn registered_models() -> Vec<RegistryEntry> {
    ModelRegistry::global().entries()
}

/// Load, validate and assemble a case in one go.
pub fn open_case(path: &std::path::Path) -> AppResult<Driver> {
    let case = load_case(path)?;
    validate_case(&case)?;
    Driver::new(&case)
}
