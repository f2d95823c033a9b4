//! The cloud container and its mesh adaptation.

use crate::error::{CloudError, CloudResult};
use cf_core::ParticleId;
use cf_mesh::conformance::AdaptationState;
use cf_mesh::{DistributionMap, Mesh, MeshAdaptive, MeshError, MeshMap, MeshResult, TopoChangeMap};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;

/// Element of a cloud: identified, located in one local cell, and
/// serializable so it can move between ranks.
pub trait CloudElement: Serialize + DeserializeOwned + Send + 'static {
    fn id(&self) -> ParticleId;

    fn cell(&self) -> usize;

    fn set_cell(&mut self, cell: usize);
}

/// Named collection of elements tied to one mesh.
///
/// Element cell indices are only meaningful between adaptation events;
/// each event rewrites them from its map and drops elements whose region
/// disappeared. Deliberately not `Clone`: a cloud is bound to one mesh and
/// one name in the object registry.
#[derive(Debug)]
pub struct Cloud<P> {
    name: String,
    n_cells: usize,
    elements: Vec<P>,
}

impl<P: CloudElement> Cloud<P> {
    /// Registry prefix for cloud objects.
    pub const PREFIX: &'static str = "lagrangian";

    pub const DEFAULT_NAME: &'static str = "defaultCloud";

    pub fn new(name: impl Into<String>, mesh: &Mesh) -> Self {
        Self {
            name: name.into(),
            n_cells: mesh.n_cells(),
            elements: Vec::new(),
        }
    }

    pub fn with_default_name(mesh: &Mesh) -> Self {
        Self::new(Self::DEFAULT_NAME, mesh)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `lagrangian/<name>`.
    pub fn path(&self) -> String {
        format!("{}/{}", Self::PREFIX, self.name)
    }

    /// Local cell count the element indices refer to.
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut P> {
        self.elements.iter_mut()
    }

    pub fn ids(&self) -> Vec<ParticleId> {
        self.elements.iter().map(CloudElement::id).collect()
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.elements.iter().any(|p| p.id() == id)
    }

    pub fn push(&mut self, element: P) -> CloudResult<()> {
        if element.cell() >= self.n_cells {
            return Err(CloudError::CellOutOfRange {
                id: element.id(),
                cell: element.cell(),
                n_cells: self.n_cells,
            });
        }
        if self.contains(element.id()) {
            return Err(CloudError::DuplicateId {
                id: element.id(),
                cloud: self.name.clone(),
            });
        }
        self.elements.push(element);
        Ok(())
    }

    /// Remove elements failing `keep`, returning how many were removed.
    pub fn retain(&mut self, keep: impl FnMut(&P) -> bool) -> usize {
        let before = self.elements.len();
        self.elements.retain(keep);
        before - self.elements.len()
    }

    /// Relocate every element through `old -> new` and drop unmappable ones.
    fn relocate(
        &mut self,
        event: &'static str,
        n_old: usize,
        n_new: usize,
        new_cell: impl Fn(usize) -> Option<usize>,
    ) -> MeshResult<()> {
        self.check_old_size(n_old)?;
        let before = self.elements.len();
        self.elements.retain_mut(|p| match new_cell(p.cell()) {
            Some(cell) => {
                p.set_cell(cell);
                true
            }
            None => false,
        });
        let dropped = before - self.elements.len();
        self.n_cells = n_new;
        tracing::debug!(
            cloud = %self.name,
            event,
            kept = self.elements.len(),
            dropped,
            "cloud adapted"
        );
        Ok(())
    }

    fn check_old_size(&self, n_old: usize) -> MeshResult<()> {
        if n_old != self.n_cells {
            return Err(MeshError::SizeMismatch {
                what: format!("cloud '{}' cells", self.name),
                expected: self.n_cells,
                actual: n_old,
            });
        }
        Ok(())
    }
}

impl<P: CloudElement> MeshAdaptive for Cloud<P> {
    fn topo_change(&mut self, map: &TopoChangeMap) -> MeshResult<()> {
        let reverse = map.reverse_cell_map();
        self.relocate("topo_change", map.n_old_cells(), map.n_new_cells(), |old| {
            reverse.get(old).copied().flatten()
        })
    }

    fn map_mesh(&mut self, map: &MeshMap) -> MeshResult<()> {
        let relocation = map.cell_relocation();
        self.relocate("map_mesh", map.n_old_cells(), map.n_new_cells(), |old| {
            relocation.get(old).copied().flatten()
        })
    }

    /// Collective. Elements staying on this rank are renumbered in place,
    /// departing ones are serialized to their destination rank, and
    /// arrivals are appended.
    ///
    /// A map that cannot place every element is rejected before anything
    /// moves. Once the exchange has started the departing elements belong to
    /// other ranks, so any later error leaves this cloud empty on the new
    /// mesh and the run must stop.
    fn distribute(&mut self, map: &DistributionMap) -> MeshResult<()> {
        self.check_old_size(map.n_old_cells())?;
        let destinations = self
            .elements
            .iter()
            .map(|element| {
                map.destination(element.cell())
                    .ok_or_else(|| MeshError::InvalidMap {
                        what: format!(
                            "element {} in cell {} has no destination",
                            element.id(),
                            element.cell()
                        ),
                    })
            })
            .collect::<MeshResult<Vec<_>>>()?;

        let rank = map.rank();
        let mut outgoing: Vec<Vec<P>> = (0..map.n_ranks()).map(|_| Vec::new()).collect();
        let elements = std::mem::take(&mut self.elements);
        for (mut element, dest) in elements.into_iter().zip(destinations) {
            element.set_cell(dest.cell);
            outgoing[dest.rank].push(element);
        }
        let sent: usize = outgoing
            .iter()
            .enumerate()
            .filter(|(r, _)| *r != rank)
            .map(|(_, v)| v.len())
            .sum();

        self.n_cells = map.n_new_cells();
        let incoming = map.exchange(outgoing).inspect_err(|err| {
            tracing::error!(cloud = %self.name, rank, %err, "cloud exchange failed");
        })?;

        let mut seen: BTreeSet<ParticleId> = BTreeSet::new();
        let mut arrived = Vec::with_capacity(incoming.iter().map(Vec::len).sum());
        let mut received = 0;
        for (source, elements) in incoming.into_iter().enumerate() {
            if source != rank {
                received += elements.len();
            }
            for element in elements {
                if element.cell() >= self.n_cells {
                    return Err(CloudError::CellOutOfRange {
                        id: element.id(),
                        cell: element.cell(),
                        n_cells: self.n_cells,
                    }
                    .into());
                }
                if !seen.insert(element.id()) {
                    return Err(CloudError::DuplicateId {
                        id: element.id(),
                        cloud: self.name.clone(),
                    }
                    .into());
                }
                arrived.push(element);
            }
        }
        self.elements = arrived;
        tracing::debug!(
            cloud = %self.name,
            rank,
            sent,
            received,
            local = self.elements.len(),
            "cloud distributed"
        );
        Ok(())
    }
}

impl<P: CloudElement> AdaptationState for Cloud<P> {
    fn element_cells(&self) -> Vec<usize> {
        self.elements.iter().map(CloudElement::cell).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parcel;
    use cf_core::Id;
    use cf_mesh::conformance::check_adaptation;
    use cf_mesh::{Destination, LocalTransport, Transport};
    use std::sync::Arc;

    fn parcel(i: u32, cell: usize) -> Parcel {
        Parcel::new(Id::from_index(i).unwrap(), cell, 1e-9, 1e-4, 300.0)
    }

    fn cloud(n_cells: usize, cells: &[usize]) -> Cloud<Parcel> {
        let mut cloud = Cloud::with_default_name(&Mesh::new(n_cells));
        for (i, &c) in cells.iter().enumerate() {
            cloud.push(parcel(i as u32, c)).unwrap();
        }
        cloud
    }

    #[test]
    fn naming() {
        let c = cloud(1, &[]);
        assert_eq!(c.name(), "defaultCloud");
        assert_eq!(c.path(), "lagrangian/defaultCloud");
    }

    #[test]
    fn push_validates() {
        let mut c = cloud(2, &[0]);
        assert!(matches!(
            c.push(parcel(5, 2)),
            Err(CloudError::CellOutOfRange { .. })
        ));
        assert!(matches!(
            c.push(parcel(0, 1)),
            Err(CloudError::DuplicateId { .. })
        ));
    }

    #[test]
    fn removed_cells_drop_their_elements() {
        let mut c = cloud(3, &[0, 1, 2, 1]);
        c.topo_change(&TopoChangeMap::remove(3, &[1]).unwrap()).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.element_cells(), vec![0, 1]);
        assert_eq!(c.n_cells(), 2);
    }

    #[test]
    fn remap_uses_relocation() {
        let mut c = cloud(4, &[0, 3]);
        c.map_mesh(&MeshMap::coarsen(4, 2).unwrap()).unwrap();
        assert_eq!(c.element_cells(), vec![0, 1]);
    }

    #[test]
    fn stale_map_is_rejected() {
        let mut c = cloud(4, &[0]);
        assert!(c.topo_change(&TopoChangeMap::refine(3, &[]).unwrap()).is_err());
        assert_eq!(c.element_cells(), vec![0]);
    }

    #[test]
    fn serial_distribution_renumbers() {
        let mut c = cloud(2, &[0, 1]);
        let map = DistributionMap::new(
            vec![Destination { rank: 0, cell: 1 }, Destination { rank: 0, cell: 0 }],
            2,
            Arc::new(LocalTransport),
        )
        .unwrap();
        c.distribute(&map).unwrap();
        let cells: Vec<_> = c.iter().map(|p| (p.id.index(), p.cell)).collect();
        assert_eq!(cells, vec![(0, 1), (1, 0)]);
    }

    /// Rank 0 of two; the other rank always answers with `reply`.
    struct Replying {
        reply: Vec<u8>,
    }

    impl Transport for Replying {
        fn rank(&self) -> usize {
            0
        }

        fn n_ranks(&self) -> usize {
            2
        }

        fn exchange(&self, outgoing: Vec<Vec<u8>>) -> MeshResult<Vec<Vec<u8>>> {
            assert_eq!(outgoing.len(), 2);
            Ok(vec![Vec::new(), self.reply.clone()])
        }
    }

    fn keep_in_place(n_cells: usize, reply: &[Parcel]) -> DistributionMap {
        let destinations = (0..n_cells).map(|cell| Destination { rank: 0, cell }).collect();
        let transport = Replying {
            reply: serde_json::to_vec(reply).unwrap(),
        };
        DistributionMap::new(destinations, n_cells, Arc::new(transport)).unwrap()
    }

    #[test]
    fn arrivals_are_appended() {
        let mut c = cloud(2, &[0, 1]);
        c.distribute(&keep_in_place(2, &[parcel(7, 1)])).unwrap();
        let ids: Vec<_> = c.iter().map(|p| p.id.index()).collect();
        assert_eq!(ids, vec![0, 1, 7]);
    }

    #[test]
    fn duplicate_arrival_leaves_cloud_empty() {
        let mut c = cloud(2, &[0, 1]);
        let err = c.distribute(&keep_in_place(2, &[parcel(1, 0)])).unwrap_err();
        assert!(err.to_string().contains("already present"), "{err}");
        assert!(c.is_empty());
        assert_eq!(c.element_cells(), Vec::<usize>::new());
    }

    #[test]
    fn arrival_outside_mesh_leaves_cloud_empty() {
        let mut c = cloud(2, &[0]);
        assert!(c.distribute(&keep_in_place(2, &[parcel(5, 2)])).is_err());
        assert!(c.is_empty());
    }

    #[test]
    fn stale_distribution_map_moves_nothing() {
        let mut c = cloud(3, &[0, 2]);
        assert!(c.distribute(&keep_in_place(2, &[])).is_err());
        assert_eq!(c.element_cells(), vec![0, 2]);
    }

    #[test]
    fn follows_all_three_events() {
        let mut c = cloud(3, &[0, 1, 2, 2]);
        let violations = check_adaptation(&mut c, 3).unwrap();
        assert!(violations.is_empty(), "{violations:?}");
        assert_eq!(c.len(), 4);
    }
}
