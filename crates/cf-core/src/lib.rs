//! cf-core: stable foundation for closureflow.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real, tolerances, relaxation)
//! - ids (compact ids for particles and other tracked elements)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CfError, CfResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
