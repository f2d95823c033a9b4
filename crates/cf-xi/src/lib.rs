//! cf-xi: flame-wrinkling models.
//!
//! The flame-wrinkling factor Xi is the ratio of turbulent to laminar flame
//! area. Models are selected at run time through the [`XiModels`] family:
//!
//! ```
//! use cf_config::Dict;
//! use cf_mesh::ScalarField;
//! use cf_registry::ModelFamily;
//! use cf_xi::{XiContext, XiModels};
//!
//! let ctx = XiContext::new(ScalarField::uniform("Su", 4, 0.4));
//! let dict = Dict::new("XiModel").with("type", "uniformConstant").with("Xi", 2.5);
//! let mut xi = XiModels::create(&dict, &ctx).unwrap();
//! xi.correct();
//! assert_eq!(xi.xi().values(), &[2.5; 4]);
//! ```

pub mod model;
pub mod uniform_constant;

pub use model::{XiContext, XiModel, XiModels};
pub use uniform_constant::UniformConstant;
