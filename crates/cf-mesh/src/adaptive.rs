//! The mesh adaptation protocol and the registry that broadcasts it.

use crate::error::{MeshError, MeshResult};
use crate::maps::{DistributionMap, MeshMap, TopoChangeMap};
use std::any::{Any, type_name};

/// Reaction of a mesh-dependent object to the three adaptation events.
///
/// Defaults do nothing, which is correct for objects holding no
/// cell-indexed state. Anything that caches per-cell data must override all
/// three; handling one event but not the others leaves stale state after the
/// missing event.
pub trait MeshAdaptive {
    /// Local connectivity changed (refinement, cell removal).
    fn topo_change(&mut self, _map: &TopoChangeMap) -> MeshResult<()> {
        Ok(())
    }

    /// The mesh was replaced by a related one.
    fn map_mesh(&mut self, _map: &MeshMap) -> MeshResult<()> {
        Ok(())
    }

    /// Cells moved between ranks. Collective.
    fn distribute(&mut self, _map: &DistributionMap) -> MeshResult<()> {
        Ok(())
    }
}

impl<T: MeshAdaptive + ?Sized> MeshAdaptive for Box<T> {
    fn topo_change(&mut self, map: &TopoChangeMap) -> MeshResult<()> {
        (**self).topo_change(map)
    }

    fn map_mesh(&mut self, map: &MeshMap) -> MeshResult<()> {
        (**self).map_mesh(map)
    }

    fn distribute(&mut self, map: &DistributionMap) -> MeshResult<()> {
        (**self).distribute(map)
    }
}

/// Object-safe handle for anything a registry can own.
pub trait MeshObject: MeshAdaptive + Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: MeshAdaptive + Send + Any> MeshObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Named collection of mesh objects.
///
/// Events are forwarded to members in registration order, and the first
/// failure stops the broadcast.
pub struct ObjectRegistry {
    name: String,
    objects: Vec<(String, Box<dyn MeshObject>)>,
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("name", &self.name)
            .field("objects", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl ObjectRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn register<T: MeshObject + 'static>(
        &mut self,
        name: impl Into<String>,
        object: T,
    ) -> MeshResult<()> {
        self.register_boxed(name, Box::new(object))
    }

    pub fn register_boxed(
        &mut self,
        name: impl Into<String>,
        object: Box<dyn MeshObject>,
    ) -> MeshResult<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(MeshError::DuplicateObject {
                name,
                registry: self.name.clone(),
            });
        }
        tracing::debug!(registry = %self.name, object = %name, "registered mesh object");
        self.objects.push((name, object));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Member names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|(n, _)| n.as_str())
    }

    pub fn lookup<T: Any>(&self, name: &str) -> MeshResult<&T> {
        let object = self.find(name)?;
        object
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| MeshError::WrongObjectType {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn lookup_mut<T: Any>(&mut self, name: &str) -> MeshResult<&mut T> {
        let registry = self.name.clone();
        let object = self
            .objects
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, o)| &mut **o)
            .ok_or_else(|| MeshError::UnknownObject {
                name: name.to_string(),
                registry,
            })?;
        object
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| MeshError::WrongObjectType {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn remove(&mut self, name: &str) -> MeshResult<Box<dyn MeshObject>> {
        let index = self
            .objects
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| MeshError::UnknownObject {
                name: name.to_string(),
                registry: self.name.clone(),
            })?;
        Ok(self.objects.remove(index).1)
    }

    fn find(&self, name: &str) -> MeshResult<&dyn MeshObject> {
        self.objects
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| o.as_ref())
            .ok_or_else(|| MeshError::UnknownObject {
                name: name.to_string(),
                registry: self.name.clone(),
            })
    }

    fn broadcast(
        &mut self,
        event: &'static str,
        mut apply: impl FnMut(&mut dyn MeshObject) -> MeshResult<()>,
    ) -> MeshResult<()> {
        for (name, object) in &mut self.objects {
            apply(object.as_mut()).inspect_err(|e| {
                tracing::warn!(registry = %self.name, object = %name, event, error = %e, "adaptation failed");
            })?;
        }
        tracing::debug!(registry = %self.name, event, count = self.objects.len(), "adaptation forwarded");
        Ok(())
    }
}

impl MeshAdaptive for ObjectRegistry {
    fn topo_change(&mut self, map: &TopoChangeMap) -> MeshResult<()> {
        self.broadcast("topo_change", |o| o.topo_change(map))
    }

    fn map_mesh(&mut self, map: &MeshMap) -> MeshResult<()> {
        self.broadcast("map_mesh", |o| o.map_mesh(map))
    }

    fn distribute(&mut self, map: &DistributionMap) -> MeshResult<()> {
        self.broadcast("distribute", |o| o.distribute(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl MeshAdaptive for Recorder {
        fn topo_change(&mut self, _map: &TopoChangeMap) -> MeshResult<()> {
            self.log.lock().unwrap().push(format!("{}:topo", self.tag));
            if self.fail {
                return Err(MeshError::InvalidMap {
                    what: "refused".to_string(),
                });
            }
            Ok(())
        }

        fn map_mesh(&mut self, _map: &MeshMap) -> MeshResult<()> {
            self.log.lock().unwrap().push(format!("{}:map", self.tag));
            Ok(())
        }
    }

    struct Stateless;
    impl MeshAdaptive for Stateless {}

    fn recorder(tag: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Recorder {
        Recorder {
            tag,
            log: Arc::clone(log),
            fail: false,
        }
    }

    #[test]
    fn forwards_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut reg = ObjectRegistry::new("region0");
        reg.register("b", recorder("b", &log)).unwrap();
        reg.register("a", recorder("a", &log)).unwrap();
        reg.register("s", Stateless).unwrap();

        reg.topo_change(&TopoChangeMap::refine(1, &[0]).unwrap())
            .unwrap();
        reg.map_mesh(&MeshMap::coarsen(2, 2).unwrap()).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["b:topo", "a:topo", "b:map", "a:map"]
        );
    }

    #[test]
    fn failure_stops_broadcast() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut reg = ObjectRegistry::new("region0");
        let mut bad = recorder("bad", &log);
        bad.fail = true;
        reg.register("bad", bad).unwrap();
        reg.register("after", recorder("after", &log)).unwrap();

        assert!(reg.topo_change(&TopoChangeMap::refine(1, &[]).unwrap()).is_err());
        assert_eq!(*log.lock().unwrap(), vec!["bad:topo"]);
    }

    #[test]
    fn lookup_by_type() {
        let mut reg = ObjectRegistry::new("region0");
        reg.register("s", Stateless).unwrap();
        assert!(reg.lookup::<Stateless>("s").is_ok());
        assert!(matches!(
            reg.lookup::<Recorder>("s"),
            Err(MeshError::WrongObjectType { .. })
        ));
        assert!(matches!(
            reg.lookup_mut::<Stateless>("t"),
            Err(MeshError::UnknownObject { .. })
        ));
        assert!(matches!(
            reg.register("s", Stateless),
            Err(MeshError::DuplicateObject { .. })
        ));
        reg.remove("s").unwrap();
        assert!(reg.is_empty());
    }
}
