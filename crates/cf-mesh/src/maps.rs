//! Maps describing how the cell index set changes across an adaptation event.

use crate::error::{MeshError, MeshResult};
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Local connectivity change (refinement, cell removal).
///
/// `cell_map[new]` is the old cell the new cell was created from, or `None`
/// for cells inserted from nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopoChangeMap {
    n_old_cells: usize,
    cell_map: Vec<Option<usize>>,
}

impl TopoChangeMap {
    pub fn new(n_old_cells: usize, cell_map: Vec<Option<usize>>) -> MeshResult<Self> {
        if let Some(bad) = cell_map.iter().flatten().find(|&&old| old >= n_old_cells) {
            return Err(MeshError::InvalidMap {
                what: format!("topology map references old cell {bad} of {n_old_cells}"),
            });
        }
        Ok(Self {
            n_old_cells,
            cell_map,
        })
    }

    /// Split each listed cell in two. The original keeps its index and the
    /// new child is appended after the existing cells, in list order.
    pub fn refine(n_old_cells: usize, split: &[usize]) -> MeshResult<Self> {
        let cell_map = (0..n_old_cells)
            .map(Some)
            .chain(split.iter().map(|&c| Some(c)))
            .collect();
        Self::new(n_old_cells, cell_map)
    }

    /// Delete the listed cells and compact the numbering.
    pub fn remove(n_old_cells: usize, removed: &[usize]) -> MeshResult<Self> {
        if let Some(bad) = removed.iter().find(|&&c| c >= n_old_cells) {
            return Err(MeshError::InvalidMap {
                what: format!("cannot remove cell {bad} of {n_old_cells}"),
            });
        }
        let cell_map = (0..n_old_cells)
            .filter(|c| !removed.contains(c))
            .map(Some)
            .collect();
        Self::new(n_old_cells, cell_map)
    }

    pub fn n_old_cells(&self) -> usize {
        self.n_old_cells
    }

    pub fn n_new_cells(&self) -> usize {
        self.cell_map.len()
    }

    /// New cell -> old cell.
    pub fn cell_map(&self) -> &[Option<usize>] {
        &self.cell_map
    }

    /// Old cell -> the first new cell created from it, `None` if removed.
    pub fn reverse_cell_map(&self) -> Vec<Option<usize>> {
        let mut reverse = vec![None; self.n_old_cells];
        for (new, old) in self.cell_map.iter().enumerate() {
            if let Some(old) = *old {
                reverse[old].get_or_insert(new);
            }
        }
        reverse
    }
}

/// Replacement of the mesh by a related but distinct one.
///
/// `weights[new]` lists the old cells (and interpolation weights) a new
/// cell's values are resampled from; an empty list means nothing maps onto
/// it. `cell_relocation[old]` is the new cell containing the old cell, used
/// to relocate point-like elements; `None` means the region no longer exists.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshMap {
    n_old_cells: usize,
    weights: Vec<Vec<(usize, f64)>>,
    cell_relocation: Vec<Option<usize>>,
}

impl MeshMap {
    pub fn new(
        n_old_cells: usize,
        weights: Vec<Vec<(usize, f64)>>,
        cell_relocation: Vec<Option<usize>>,
    ) -> MeshResult<Self> {
        if cell_relocation.len() != n_old_cells {
            return Err(MeshError::SizeMismatch {
                what: "mesh map relocation table".to_string(),
                expected: n_old_cells,
                actual: cell_relocation.len(),
            });
        }
        for (new, sources) in weights.iter().enumerate() {
            for &(old, w) in sources {
                if old >= n_old_cells || !w.is_finite() || w < 0.0 {
                    return Err(MeshError::InvalidMap {
                        what: format!("new cell {new} has invalid source ({old}, {w})"),
                    });
                }
            }
        }
        let n_new = weights.len();
        if let Some(bad) = cell_relocation.iter().flatten().find(|&&c| c >= n_new) {
            return Err(MeshError::InvalidMap {
                what: format!("relocation targets cell {bad} of {n_new}"),
            });
        }
        Ok(Self {
            n_old_cells,
            weights,
            cell_relocation,
        })
    }

    /// Merge every `factor` consecutive old cells into one new cell.
    pub fn coarsen(n_old_cells: usize, factor: usize) -> MeshResult<Self> {
        if factor == 0 {
            return Err(MeshError::InvalidMap {
                what: "coarsening factor must be positive".to_string(),
            });
        }
        let n_new = n_old_cells.div_ceil(factor);
        let weights = (0..n_new)
            .map(|i| {
                (i * factor..((i + 1) * factor).min(n_old_cells))
                    .map(|old| (old, 1.0))
                    .collect()
            })
            .collect();
        let relocation = (0..n_old_cells).map(|old| Some(old / factor)).collect();
        Self::new(n_old_cells, weights, relocation)
    }

    pub fn n_old_cells(&self) -> usize {
        self.n_old_cells
    }

    pub fn n_new_cells(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[Vec<(usize, f64)>] {
        &self.weights
    }

    pub fn cell_relocation(&self) -> &[Option<usize>] {
        &self.cell_relocation
    }
}

/// Where an old local cell lives after redistribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    pub rank: usize,
    pub cell: usize,
}

/// Parallel ownership reassignment.
///
/// Holds, for every old local cell, its destination rank and cell index
/// there, the number of cells this rank owns afterwards, and the transport
/// used to move data. Every rank must apply its map in the same global
/// order of events, since the exchange is collective.
#[derive(Clone)]
pub struct DistributionMap {
    destinations: Vec<Destination>,
    n_new_cells: usize,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for DistributionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributionMap")
            .field("rank", &self.rank())
            .field("n_ranks", &self.n_ranks())
            .field("n_old_cells", &self.n_old_cells())
            .field("n_new_cells", &self.n_new_cells)
            .finish()
    }
}

impl DistributionMap {
    pub fn new(
        destinations: Vec<Destination>,
        n_new_cells: usize,
        transport: Arc<dyn Transport>,
    ) -> MeshResult<Self> {
        let rank = transport.rank();
        let n_ranks = transport.n_ranks();
        let mut claimed = vec![false; n_new_cells];
        for (old, d) in destinations.iter().enumerate() {
            if d.rank >= n_ranks {
                return Err(MeshError::InvalidMap {
                    what: format!("cell {old} sent to rank {} of {n_ranks}", d.rank),
                });
            }
            if d.rank == rank {
                match claimed.get_mut(d.cell) {
                    Some(slot) if !*slot => *slot = true,
                    Some(_) => {
                        return Err(MeshError::InvalidMap {
                            what: format!("local cell {} claimed twice", d.cell),
                        });
                    }
                    None => {
                        return Err(MeshError::InvalidMap {
                            what: format!("cell {old} kept as {} of {n_new_cells}", d.cell),
                        });
                    }
                }
            }
        }
        Ok(Self {
            destinations,
            n_new_cells,
            transport,
        })
    }

    pub fn rank(&self) -> usize {
        self.transport.rank()
    }

    pub fn n_ranks(&self) -> usize {
        self.transport.n_ranks()
    }

    pub fn n_old_cells(&self) -> usize {
        self.destinations.len()
    }

    pub fn n_new_cells(&self) -> usize {
        self.n_new_cells
    }

    pub fn destination(&self, old_cell: usize) -> Option<Destination> {
        self.destinations.get(old_cell).copied()
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// Collective exchange of serializable items.
    ///
    /// `outgoing[r]` is sent to rank `r` (the local slot is passed through
    /// without serialization); the result holds what every rank sent here.
    pub fn exchange<T>(&self, mut outgoing: Vec<Vec<T>>) -> MeshResult<Vec<Vec<T>>>
    where
        T: Serialize + DeserializeOwned,
    {
        let n_ranks = self.n_ranks();
        if outgoing.len() != n_ranks {
            return Err(MeshError::SizeMismatch {
                what: "outgoing rank buffers".to_string(),
                expected: n_ranks,
                actual: outgoing.len(),
            });
        }
        let rank = self.rank();
        let local = std::mem::take(&mut outgoing[rank]);

        let mut buffers = Vec::with_capacity(n_ranks);
        for items in &outgoing {
            buffers.push(serde_json::to_vec(items)?);
        }
        let received = self.transport.exchange(buffers)?;
        if received.len() != n_ranks {
            return Err(MeshError::SizeMismatch {
                what: "incoming rank buffers".to_string(),
                expected: n_ranks,
                actual: received.len(),
            });
        }

        let mut incoming = Vec::with_capacity(n_ranks);
        for (source, bytes) in received.into_iter().enumerate() {
            if source == rank {
                incoming.push(Vec::new());
            } else {
                incoming.push(serde_json::from_slice(&bytes)?);
            }
        }
        incoming[rank] = local;
        Ok(incoming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LocalTransport;

    #[test]
    fn refine_appends_children() {
        let map = TopoChangeMap::refine(3, &[2, 0]).unwrap();
        assert_eq!(map.n_new_cells(), 5);
        assert_eq!(
            map.cell_map(),
            &[Some(0), Some(1), Some(2), Some(2), Some(0)]
        );
        assert_eq!(map.reverse_cell_map(), vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn remove_compacts_and_drops_reverse_entries() {
        let map = TopoChangeMap::remove(4, &[1]).unwrap();
        assert_eq!(map.cell_map(), &[Some(0), Some(2), Some(3)]);
        assert_eq!(map.reverse_cell_map(), vec![Some(0), None, Some(1), Some(2)]);
    }

    #[test]
    fn topo_map_rejects_out_of_range() {
        assert!(TopoChangeMap::new(2, vec![Some(2)]).is_err());
        assert!(TopoChangeMap::remove(2, &[5]).is_err());
    }

    #[test]
    fn coarsen_groups_cells() {
        let map = MeshMap::coarsen(5, 2).unwrap();
        assert_eq!(map.n_new_cells(), 3);
        assert_eq!(map.weights()[2], vec![(4, 1.0)]);
        assert_eq!(map.cell_relocation()[3], Some(1));
    }

    #[test]
    fn mesh_map_validation() {
        assert!(MeshMap::new(2, vec![vec![(0, 1.0)]], vec![Some(0)]).is_err());
        assert!(MeshMap::new(1, vec![vec![(1, 1.0)]], vec![Some(0)]).is_err());
        assert!(MeshMap::new(1, vec![vec![(0, -1.0)]], vec![Some(0)]).is_err());
        assert!(MeshMap::new(1, vec![vec![(0, 1.0)]], vec![Some(1)]).is_err());
        assert!(MeshMap::coarsen(3, 0).is_err());
    }

    #[test]
    fn distribution_rejects_double_claims() {
        let dests = vec![
            Destination { rank: 0, cell: 0 },
            Destination { rank: 0, cell: 0 },
        ];
        assert!(DistributionMap::new(dests, 2, Arc::new(LocalTransport)).is_err());

        let dests = vec![Destination { rank: 1, cell: 0 }];
        assert!(DistributionMap::new(dests, 1, Arc::new(LocalTransport)).is_err());
    }

    #[test]
    fn local_exchange_passes_through() {
        let map = DistributionMap::new(
            vec![Destination { rank: 0, cell: 0 }],
            1,
            Arc::new(LocalTransport),
        )
        .unwrap();
        let incoming = map.exchange(vec![vec![1_u32, 2, 3]]).unwrap();
        assert_eq!(incoming, vec![vec![1, 2, 3]]);
        assert!(map.exchange::<u32>(vec![]).is_err());
    }
}
