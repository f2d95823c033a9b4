//! Minimal spatial discretization descriptor.

use crate::error::{MeshError, MeshResult};
use crate::maps::{DistributionMap, MeshMap, TopoChangeMap};

/// The local cell index set of one rank.
///
/// Geometry is owned elsewhere; models only need the cell count to size
/// cached fields, and a version that changes on every adaptation event so
/// caches can tell they are stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mesh {
    n_cells: usize,
    rank: usize,
    n_ranks: usize,
    version: u64,
}

impl Mesh {
    /// Serial mesh.
    pub fn new(n_cells: usize) -> Self {
        Self {
            n_cells,
            rank: 0,
            n_ranks: 1,
            version: 0,
        }
    }

    /// One rank's share of a decomposed mesh.
    pub fn partitioned(n_cells: usize, rank: usize, n_ranks: usize) -> MeshResult<Self> {
        if n_ranks == 0 || rank >= n_ranks {
            return Err(MeshError::InvalidMap {
                what: format!("rank {rank} out of range for {n_ranks} ranks"),
            });
        }
        Ok(Self {
            n_cells,
            rank,
            n_ranks,
            version: 0,
        })
    }

    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn n_ranks(&self) -> usize {
        self.n_ranks
    }

    pub fn is_parallel(&self) -> bool {
        self.n_ranks > 1
    }

    /// Incremented by every applied adaptation event.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn apply_topo_change(&mut self, map: &TopoChangeMap) -> MeshResult<()> {
        self.check_old_size("topology change", map.n_old_cells())?;
        self.n_cells = map.n_new_cells();
        self.version += 1;
        Ok(())
    }

    pub fn apply_mesh_map(&mut self, map: &MeshMap) -> MeshResult<()> {
        self.check_old_size("mesh map", map.n_old_cells())?;
        self.n_cells = map.n_new_cells();
        self.version += 1;
        Ok(())
    }

    pub fn apply_distribution(&mut self, map: &DistributionMap) -> MeshResult<()> {
        self.check_old_size("distribution", map.n_old_cells())?;
        if map.rank() != self.rank || map.n_ranks() != self.n_ranks {
            return Err(MeshError::InvalidMap {
                what: format!(
                    "distribution map for rank {}/{} applied to rank {}/{}",
                    map.rank(),
                    map.n_ranks(),
                    self.rank,
                    self.n_ranks
                ),
            });
        }
        self.n_cells = map.n_new_cells();
        self.version += 1;
        Ok(())
    }

    fn check_old_size(&self, what: &str, n_old: usize) -> MeshResult<()> {
        if n_old != self.n_cells {
            return Err(MeshError::SizeMismatch {
                what: format!("{what} source cells"),
                expected: self.n_cells,
                actual: n_old,
            });
        }
        Ok(())
    }
}
