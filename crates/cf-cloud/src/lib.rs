//! cf-cloud: Lagrangian clouds of point-like elements bound to a mesh.
//!
//! A [`Cloud`] keeps every element's host cell valid across mesh topology
//! changes, remapping and parallel redistribution by implementing all three
//! messages of [`cf_mesh::MeshAdaptive`].

pub mod cloud;
pub mod error;
pub mod parcel;

pub use cloud::{Cloud, CloudElement};
pub use error::{CloudError, CloudResult};
pub use parcel::Parcel;
