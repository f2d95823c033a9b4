//! Cell-indexed scalar fields and their response to adaptation events.

use crate::error::{MeshError, MeshResult};
use crate::maps::{DistributionMap, MeshMap, TopoChangeMap};

/// One value per local cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    name: String,
    values: Vec<f64>,
}

impl ScalarField {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn uniform(name: impl Into<String>, n_cells: usize, value: f64) -> Self {
        Self::new(name, vec![value; n_cells])
    }

    pub fn zeros(name: impl Into<String>, n_cells: usize) -> Self {
        Self::uniform(name, n_cells, 0.0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn get(&self, cell: usize) -> Option<f64> {
        self.values.get(cell).copied()
    }

    /// Overwrite every value, keeping the size.
    pub fn fill(&mut self, value: f64) {
        self.values.iter_mut().for_each(|v| *v = value);
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
        }
    }

    /// Fill for cells created from nothing: the mean of the current values,
    /// or zero for an empty field.
    pub fn fill_value(&self) -> f64 {
        self.mean().unwrap_or(0.0)
    }

    /// Resize to match a new local cell count, keeping values that survive.
    pub fn resize(&mut self, n_cells: usize, fill: f64) {
        self.values.resize(n_cells, fill);
    }

    /// New cells copy their parent cell; cells created from nothing get `fill`.
    pub fn map_topo(&mut self, map: &TopoChangeMap, fill: f64) -> MeshResult<()> {
        self.check_len(map.n_old_cells())?;
        self.values = map
            .cell_map()
            .iter()
            .map(|old| old.map_or(fill, |o| self.values[o]))
            .collect();
        Ok(())
    }

    /// Weighted average of the source cells; unmapped cells get `fill`.
    pub fn map_mesh(&mut self, map: &MeshMap, fill: f64) -> MeshResult<()> {
        self.check_len(map.n_old_cells())?;
        self.values = map
            .weights()
            .iter()
            .map(|sources| {
                let total: f64 = sources.iter().map(|&(_, w)| w).sum();
                if total > 0.0 {
                    sources
                        .iter()
                        .map(|&(old, w)| w * self.values[old])
                        .sum::<f64>()
                        / total
                } else {
                    fill
                }
            })
            .collect();
        Ok(())
    }

    /// Send values to their new owners. Collective: every rank must call it.
    pub fn distribute(&mut self, map: &DistributionMap) -> MeshResult<()> {
        self.check_len(map.n_old_cells())?;
        let mut outgoing: Vec<Vec<(usize, f64)>> = vec![Vec::new(); map.n_ranks()];
        for (old, &value) in self.values.iter().enumerate() {
            if let Some(dest) = map.destination(old) {
                outgoing[dest.rank].push((dest.cell, value));
            }
        }

        let mut slots: Vec<Option<f64>> = vec![None; map.n_new_cells()];
        for (cell, value) in map.exchange(outgoing)?.into_iter().flatten() {
            match slots.get_mut(cell) {
                Some(slot) if slot.is_none() => *slot = Some(value),
                Some(_) => {
                    return Err(MeshError::InvalidMap {
                        what: format!("field '{}' received cell {cell} twice", self.name),
                    });
                }
                None => {
                    return Err(MeshError::InvalidMap {
                        what: format!(
                            "field '{}' received cell {cell} of {}",
                            self.name,
                            map.n_new_cells()
                        ),
                    });
                }
            }
        }

        let mut values = Vec::with_capacity(slots.len());
        for (cell, slot) in slots.into_iter().enumerate() {
            values.push(slot.ok_or_else(|| MeshError::InvalidMap {
                what: format!("field '{}' has no value for new cell {cell}", self.name),
            })?);
        }
        self.values = values;
        Ok(())
    }

    fn check_len(&self, n_old: usize) -> MeshResult<()> {
        if self.values.len() != n_old {
            return Err(MeshError::SizeMismatch {
                what: format!("field '{}'", self.name),
                expected: n_old,
                actual: self.values.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maps::Destination;
    use crate::transport::LocalTransport;
    use std::sync::Arc;

    #[test]
    fn topo_change_fills_new_cells() {
        let mut f = ScalarField::new("a", vec![1.0, 2.0]);
        let map = TopoChangeMap::new(2, vec![Some(1), None, Some(0)]).unwrap();
        f.map_topo(&map, -1.0).unwrap();
        assert_eq!(f.values(), &[2.0, -1.0, 1.0]);
    }

    #[test]
    fn mesh_map_averages() {
        let mut f = ScalarField::new("a", vec![1.0, 3.0, 10.0]);
        f.map_mesh(&MeshMap::coarsen(3, 2).unwrap(), 0.0).unwrap();
        assert_eq!(f.values(), &[2.0, 10.0]);

        let mut g = ScalarField::new("g", vec![4.0]);
        let map = MeshMap::new(1, vec![vec![(0, 1.0)], vec![]], vec![Some(0)]).unwrap();
        g.map_mesh(&map, 7.0).unwrap();
        assert_eq!(g.values(), &[4.0, 7.0]);
    }

    #[test]
    fn wrong_size_is_rejected() {
        let mut f = ScalarField::zeros("a", 2);
        let map = TopoChangeMap::refine(3, &[]).unwrap();
        assert!(matches!(
            f.map_topo(&map, 0.0),
            Err(MeshError::SizeMismatch { .. })
        ));
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn serial_distribution_permutes() {
        let mut f = ScalarField::new("a", vec![1.0, 2.0, 3.0]);
        let dests = vec![
            Destination { rank: 0, cell: 2 },
            Destination { rank: 0, cell: 0 },
            Destination { rank: 0, cell: 1 },
        ];
        let map = DistributionMap::new(dests, 3, Arc::new(LocalTransport)).unwrap();
        f.distribute(&map).unwrap();
        assert_eq!(f.values(), &[2.0, 3.0, 1.0]);
    }

    #[test]
    fn distribution_with_holes_fails() {
        let mut f = ScalarField::new("a", vec![1.0]);
        let map = DistributionMap::new(
            vec![Destination { rank: 0, cell: 0 }],
            2,
            Arc::new(LocalTransport),
        )
        .unwrap();
        assert!(f.distribute(&map).is_err());
    }

    #[test]
    fn min_max() {
        let f = ScalarField::new("a", vec![3.0, -1.0, 2.0]);
        assert_eq!(f.min(), Some(-1.0));
        assert_eq!(f.max(), Some(3.0));
        assert_eq!(ScalarField::zeros("e", 0).min(), None);
    }

    #[test]
    fn mean_fills_new_cells() {
        let f = ScalarField::new("a", vec![1.0, 2.0, 6.0]);
        assert_eq!(f.mean(), Some(3.0));
        assert_eq!(f.fill_value(), 3.0);
        assert_eq!(ScalarField::zeros("e", 0).fill_value(), 0.0);
    }
}
