//! cf-config: configuration blocks for run-time selected models.
//!
//! Every selectable model is built from a [`Dict`]: a YAML mapping carrying a
//! mandatory `type` key naming the registered variant plus whatever
//! coefficients that variant reads. Nested blocks (for example the sub-models
//! of a composite) are themselves `Dict`s with their own `type`.

pub mod dict;
pub mod error;

pub use dict::{Dict, TYPE_KEY};
pub use error::{ConfigError, ConfigResult};
