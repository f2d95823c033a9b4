//! The `(family, tag) -> factory` table.

use crate::error::{RegistryError, RegistryResult};
use crate::family::{Factory, ModelFamily, Submission};
use cf_config::{ConfigError, ConfigResult, Dict};
use core::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static GLOBAL: LazyLock<ModelRegistry> = LazyLock::new(|| {
    match ModelRegistry::from_submissions(inventory::iter::<Submission>.into_iter()) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!("Model registration failed: {}", e);
            panic!("model registration failed: {e}");
        }
    }
});

enum FactoryRef {
    Static(&'static (dyn Any + Sync)),
    Owned(Box<dyn Any + Send + Sync>),
}

impl FactoryRef {
    fn as_any(&self) -> &dyn Any {
        match self {
            FactoryRef::Static(f) => *f,
            FactoryRef::Owned(f) => f.as_ref(),
        }
    }
}

/// Description of one registered variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub family: &'static str,
    pub tag: &'static str,
    /// Crate (or caller) that registered it.
    pub origin: &'static str,
}

struct Slot {
    origin: &'static str,
    factory: FactoryRef,
}

#[derive(Default)]
struct FamilyTable {
    signature: Option<TypeId>,
    slots: BTreeMap<&'static str, Slot>,
}

/// Table of model factories keyed by family name and variant tag.
///
/// The process-wide instance ([`ModelRegistry::global`]) is built once from
/// every [`register_model!`](crate::register_model) submission linked into
/// the binary and is read-only afterwards. Independent registries can be
/// built with [`ModelRegistry::new`] + [`ModelRegistry::register`].
#[derive(Default)]
pub struct ModelRegistry {
    families: BTreeMap<&'static str, FamilyTable>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    ///
    /// # Panics
    /// On first access, if two submissions share a `(family, tag)` pair.
    pub fn global() -> &'static ModelRegistry {
        &GLOBAL
    }

    /// Build a registry from static submissions, rejecting duplicates.
    pub fn from_submissions<'a>(
        submissions: impl IntoIterator<Item = &'a Submission>,
    ) -> RegistryResult<Self> {
        let mut registry = Self::new();
        for s in submissions {
            registry.insert(s.family, s.tag, s.origin, FactoryRef::Static(s.factory))?;
        }
        Ok(registry)
    }

    /// Register a factory for family `F` under `tag`.
    pub fn register<F: ModelFamily>(
        &mut self,
        tag: &'static str,
        factory: Factory<F>,
    ) -> RegistryResult<()> {
        self.insert(F::NAME, tag, "<runtime>", FactoryRef::Owned(Box::new(factory)))
    }

    fn insert(
        &mut self,
        family: &'static str,
        tag: &'static str,
        origin: &'static str,
        factory: FactoryRef,
    ) -> RegistryResult<()> {
        let table = self.families.entry(family).or_default();

        let signature = factory.as_any().type_id();
        match table.signature {
            Some(existing) if existing != signature => {
                return Err(RegistryError::FamilyMismatch {
                    family: family.to_string(),
                });
            }
            _ => table.signature = Some(signature),
        }

        if let Some(existing) = table.slots.get(tag) {
            return Err(RegistryError::DuplicateTag {
                family: family.to_string(),
                tag: tag.to_string(),
                existing: existing.origin.to_string(),
                duplicate: origin.to_string(),
            });
        }

        tracing::debug!(family, tag, origin, "registered model");
        table.slots.insert(tag, Slot { origin, factory });
        Ok(())
    }

    /// Construct the variant named by `dict`'s `type` entry.
    ///
    /// Ownership of the new model passes to the caller.
    pub fn create<F: ModelFamily>(
        &self,
        dict: &Dict,
        ctx: &F::Context,
    ) -> ConfigResult<Box<F::Model>> {
        let tag = dict.type_name()?;
        self.create_tagged::<F>(&tag, dict, ctx)
    }

    /// Construct the variant `tag`, ignoring any `type` entry in `dict`.
    pub fn create_tagged<F: ModelFamily>(
        &self,
        tag: &str,
        dict: &Dict,
        ctx: &F::Context,
    ) -> ConfigResult<Box<F::Model>> {
        let factory = self.factory::<F>(tag)?;
        tracing::debug!(family = F::NAME, tag, dict = dict.path(), "selecting model");
        factory(dict, ctx)
    }

    /// Look up the factory for `tag` without invoking it.
    pub fn factory<F: ModelFamily>(&self, tag: &str) -> ConfigResult<Factory<F>> {
        let slot = self
            .families
            .get(F::NAME)
            .and_then(|table| table.slots.get(tag))
            .ok_or_else(|| ConfigError::UnknownType {
                family: F::NAME.to_string(),
                tag: tag.to_string(),
                known: self.tags_of(F::NAME).map(str::to_string).collect(),
            })?;

        // Every slot of a family shares one signature (checked on insert), so
        // a mismatch here means two distinct families share a name.
        let factory = slot
            .factory
            .as_any()
            .downcast_ref::<Factory<F>>()
            .expect("family signature checked at registration");
        Ok(*factory)
    }

    pub fn contains(&self, family: &str, tag: &str) -> bool {
        self.families
            .get(family)
            .is_some_and(|table| table.slots.contains_key(tag))
    }

    /// Registered family names, sorted.
    pub fn families(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.families.keys().copied()
    }

    /// Registered tags of `family`, sorted. Empty for unknown families.
    pub fn tags_of<'a>(&'a self, family: &str) -> impl Iterator<Item = &'static str> + use<'a> {
        self.families
            .get(family)
            .into_iter()
            .flat_map(|table| table.slots.keys().copied())
    }

    /// Registered tags of family `F`, sorted.
    pub fn tags<F: ModelFamily>(&self) -> Vec<&'static str> {
        self.tags_of(F::NAME).collect()
    }

    /// Every registered variant, grouped by family.
    pub fn entries(&self) -> Vec<RegistryEntry> {
        self.families
            .iter()
            .flat_map(|(family, table)| {
                table.slots.iter().map(move |(tag, slot)| RegistryEntry {
                    family: *family,
                    tag: *tag,
                    origin: slot.origin,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Shape {
        fn area(&self) -> f64;
    }

    struct Shapes;
    impl ModelFamily for Shapes {
        const NAME: &'static str = "shape";
        type Model = dyn Shape;
        type Context = f64;
    }

    struct Square(f64);
    impl Shape for Square {
        fn area(&self) -> f64 {
            self.0 * self.0
        }
    }

    struct Scaled(f64);
    impl Shape for Scaled {
        fn area(&self) -> f64 {
            self.0
        }
    }

    fn square(dict: &Dict, scale: &f64) -> ConfigResult<Box<dyn Shape>> {
        let side: f64 = dict.lookup("side")?;
        Ok(Box::new(Square(side * scale)))
    }

    fn scaled(_dict: &Dict, scale: &f64) -> ConfigResult<Box<dyn Shape>> {
        Ok(Box::new(Scaled(*scale)))
    }

    // A second family deliberately reusing the first one's name.
    struct Impostors;
    impl ModelFamily for Impostors {
        const NAME: &'static str = "shape";
        type Model = dyn Shape;
        type Context = String;
    }

    fn impostor(_dict: &Dict, _ctx: &String) -> ConfigResult<Box<dyn Shape>> {
        Ok(Box::new(Scaled(0.0)))
    }

    fn registry() -> ModelRegistry {
        let mut r = ModelRegistry::new();
        r.register::<Shapes>("square", square).unwrap();
        r.register::<Shapes>("scaled", scaled).unwrap();
        r
    }

    #[test]
    fn create_known_tag_passes_dict_and_context() {
        let r = registry();
        let dict = Dict::new("shape").with("type", "square").with("side", 3.0);
        let shape = r.create::<Shapes>(&dict, &2.0).unwrap();
        assert_eq!(shape.area(), 36.0);
    }

    #[test]
    fn unknown_tag_names_tag_and_lists_known() {
        let r = registry();
        let dict = Dict::new("shape").with("type", "circle");
        let err = r.create::<Shapes>(&dict, &1.0).err().unwrap();
        match err {
            ConfigError::UnknownType { family, tag, known } => {
                assert_eq!(family, "shape");
                assert_eq!(tag, "circle");
                assert_eq!(known, vec!["scaled", "square"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_type_key_is_config_error() {
        let r = registry();
        let dict = Dict::new("shape").with("side", 1.0);
        assert!(matches!(
            r.create::<Shapes>(&dict, &1.0),
            Err(ConfigError::MissingKey { .. })
        ));
    }

    #[test]
    fn duplicate_tag_is_rejected_and_first_survives() {
        let mut r = registry();
        let err = r.register::<Shapes>("square", scaled).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTag { .. }));

        let dict = Dict::new("shape").with("type", "square").with("side", 2.0);
        assert_eq!(r.create::<Shapes>(&dict, &1.0).unwrap().area(), 4.0);
    }

    #[test]
    fn family_name_collision_is_rejected() {
        let mut r = registry();
        let err = r.register::<Impostors>("impostor", impostor).unwrap_err();
        assert_eq!(
            err,
            RegistryError::FamilyMismatch {
                family: "shape".into()
            }
        );
    }

    #[test]
    fn introspection() {
        let r = registry();
        assert!(r.contains("shape", "square"));
        assert!(!r.contains("shape", "circle"));
        assert!(!r.contains("colour", "square"));
        assert_eq!(r.families().collect::<Vec<_>>(), vec!["shape"]);
        assert_eq!(r.tags::<Shapes>(), vec!["scaled", "square"]);
        assert_eq!(r.entries().len(), 2);
        assert_eq!(r.tags_of("colour").count(), 0);
    }
}
