//! cf-mesh: the spatial-discretization seam of closureflow.
//!
//! Provides:
//! - `Mesh`: the cell index set cached state is defined over
//! - `ScalarField`: cell-indexed values
//! - adaptation maps for the three mesh events (topology change, remap,
//!   redistribution) and the message-passing `Transport` behind redistribution
//! - `MeshAdaptive`: the three-message protocol every mesh-dependent owner
//!   implements, with no-op defaults
//! - `ObjectRegistry`: named owner of mesh objects that forwards events to
//!   each of them in registration order
//! - `conformance`: a checker that catches owners which handle some events
//!   but not others
//!
//! # Example
//!
//! ```
//! use cf_mesh::{Mesh, ScalarField, TopoChangeMap};
//!
//! let mut mesh = Mesh::new(3);
//! let mut field = ScalarField::new("T", vec![300.0, 310.0, 320.0]);
//!
//! // Split cell 1: the child is appended as cell 3.
//! let map = TopoChangeMap::refine(3, &[1]).unwrap();
//! mesh.apply_topo_change(&map).unwrap();
//! field.map_topo(&map, 0.0).unwrap();
//!
//! assert_eq!(mesh.n_cells(), 4);
//! assert_eq!(field.values(), &[300.0, 310.0, 320.0, 310.0]);
//! ```

pub mod adaptive;
pub mod conformance;
pub mod error;
pub mod field;
pub mod maps;
pub mod mesh;
pub mod transport;

pub use adaptive::{MeshAdaptive, MeshObject, ObjectRegistry};
pub use error::{MeshError, MeshResult};
pub use field::ScalarField;
pub use maps::{Destination, DistributionMap, MeshMap, TopoChangeMap};
pub use mesh::Mesh;
pub use transport::{ChannelTransport, LocalTransport, Transport};
