//! cf-registry: run-time selection of interchangeable models.
//!
//! A *family* is a capability trait (say, a heat-transfer coefficient
//! provider) plus the context every variant is built from. Variants register
//! a factory under a string tag; configuration then names the tag and the
//! registry builds the variant without the caller knowing its concrete type.
//!
//! # Example
//!
//! ```
//! use cf_config::{ConfigResult, Dict};
//! use cf_registry::{ModelFamily, ModelRegistry};
//!
//! trait Greeter {
//!     fn greet(&self) -> String;
//! }
//!
//! struct Greeters;
//! impl ModelFamily for Greeters {
//!     const NAME: &'static str = "greeter";
//!     type Model = dyn Greeter;
//!     type Context = ();
//! }
//!
//! struct Hello;
//! impl Greeter for Hello {
//!     fn greet(&self) -> String {
//!         "hello".into()
//!     }
//! }
//!
//! fn hello(_dict: &Dict, _ctx: &()) -> ConfigResult<Box<dyn Greeter>> {
//!     Ok(Box::new(Hello))
//! }
//!
//! let mut registry = ModelRegistry::new();
//! registry.register::<Greeters>("hello", hello).unwrap();
//!
//! let dict = Dict::new("greeter").with("type", "hello");
//! let model = registry.create::<Greeters>(&dict, &()).unwrap();
//! assert_eq!(model.greet(), "hello");
//! ```

pub mod error;
pub mod family;
pub mod registry;

#[doc(hidden)]
pub use inventory;

pub use error::{RegistryError, RegistryResult};
pub use family::{Factory, ModelFamily, Submission};
pub use registry::{ModelRegistry, RegistryEntry};

/// Register a factory for `family` under `tag` at process start.
///
/// ```ignore
/// register_model!(XiModels, "uniformConstant", UniformConstant::build);
/// ```
///
/// Registering the same `(family, tag)` twice in one binary aborts on first
/// use of [`ModelRegistry::global`].
#[macro_export]
macro_rules! register_model {
    ($family:ty, $tag:literal, $factory:expr $(,)?) => {
        const _: () = {
            static FACTORY: $crate::Factory<$family> = $factory;
            $crate::inventory::submit! {
                $crate::Submission::new::<$family>(
                    $tag,
                    ::core::env!("CARGO_PKG_NAME"),
                    &FACTORY,
                )
            }
        };
    };
}
