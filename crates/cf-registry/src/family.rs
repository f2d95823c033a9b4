//! Family declaration and static submissions.

use cf_config::{ConfigResult, Dict};
use core::any::Any;

/// A family of interchangeable models behind one capability.
///
/// Implemented on a marker type; the registry key is `(NAME, tag)`.
pub trait ModelFamily: Sized + 'static {
    /// Family name, also used in error messages ("Unknown XiModel type ...").
    const NAME: &'static str;

    /// Capability implemented by every variant, normally `dyn Trait`.
    type Model: ?Sized + 'static;

    /// Fixed positional context every factory receives.
    type Context: 'static;

    /// Build the variant selected by `dict`'s `type` entry from the
    /// process-wide registry.
    fn create(dict: &Dict, ctx: &Self::Context) -> ConfigResult<Box<Self::Model>> {
        crate::ModelRegistry::global().create::<Self>(dict, ctx)
    }
}

/// Constructor signature shared by every variant of family `F`.
pub type Factory<F> = fn(
    &Dict,
    &<F as ModelFamily>::Context,
) -> ConfigResult<Box<<F as ModelFamily>::Model>>;

/// One statically submitted variant. Built by [`register_model!`](crate::register_model).
pub struct Submission {
    pub family: &'static str,
    pub tag: &'static str,
    pub origin: &'static str,
    pub(crate) factory: &'static (dyn Any + Sync),
}

impl Submission {
    pub const fn new<F: ModelFamily>(
        tag: &'static str,
        origin: &'static str,
        factory: &'static Factory<F>,
    ) -> Self {
        Self {
            family: F::NAME,
            tag,
            origin,
            factory,
        }
    }
}

inventory::collect!(Submission);
