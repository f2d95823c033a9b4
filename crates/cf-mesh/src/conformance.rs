//! Detects mesh objects that react to some adaptation events but not others.
//!
//! The checker drives an object through one event of each kind, chosen so
//! that every cell index moves, and compares what the object reports about
//! its cell-indexed state against where that state must have ended up.

use crate::adaptive::MeshAdaptive;
use crate::error::{MeshError, MeshResult};
use crate::maps::{Destination, DistributionMap, MeshMap, TopoChangeMap};
use crate::transport::LocalTransport;
use std::fmt;
use std::sync::Arc;

/// What a mesh object exposes so its adaptation can be checked.
pub trait AdaptationState: MeshAdaptive {
    /// Cell index of every point-like element the object owns.
    fn element_cells(&self) -> Vec<usize> {
        Vec::new()
    }

    /// Name and length of every cell-indexed field the object caches.
    fn field_lengths(&self) -> Vec<(String, usize)> {
        Vec::new()
    }
}

/// A mismatch observed after one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub event: &'static str,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.event, self.message)
    }
}

/// Run the three events in order against `object`, whose state is currently
/// sized for `n_cells` local cells, and list every inconsistency found.
///
/// 1. topology change doubling the mesh: old cell `j` becomes `j + n`, the
///    first `n` cells are new and empty
/// 2. mesh map rotating the doubled mesh by `n`
/// 3. serial redistribution rotating by one
///
/// An empty result means the object followed all three.
pub fn check_adaptation<T: AdaptationState>(
    object: &mut T,
    n_cells: usize,
) -> MeshResult<Vec<Violation>> {
    if n_cells == 0 {
        return Err(MeshError::InvalidMap {
            what: "conformance check needs at least one cell".to_string(),
        });
    }
    let n = n_cells;
    let doubled = 2 * n;
    let mut violations = Vec::new();

    check_fields(object, "initial", n, &mut violations);
    let mut expected = sorted(object.element_cells());

    let cell_map = (0..doubled)
        .map(|new| new.checked_sub(n))
        .collect();
    let topo = TopoChangeMap::new(n, cell_map)?;
    object.topo_change(&topo)?;
    expected = sorted(expected.into_iter().map(|c| c + n).collect());
    check_event(object, "topo_change", doubled, &expected, &mut violations);

    let weights = (0..doubled)
        .map(|new| vec![((new + n) % doubled, 1.0)])
        .collect();
    let relocation = (0..doubled).map(|old| Some((old + n) % doubled)).collect();
    let mesh_map = MeshMap::new(doubled, weights, relocation)?;
    object.map_mesh(&mesh_map)?;
    expected = sorted(expected.into_iter().map(|c| (c + n) % doubled).collect());
    check_event(object, "map_mesh", doubled, &expected, &mut violations);

    let destinations = (0..doubled)
        .map(|old| Destination {
            rank: 0,
            cell: (old + 1) % doubled,
        })
        .collect();
    let distribution = DistributionMap::new(destinations, doubled, Arc::new(LocalTransport))?;
    object.distribute(&distribution)?;
    expected = sorted(expected.into_iter().map(|c| (c + 1) % doubled).collect());
    check_event(object, "distribute", doubled, &expected, &mut violations);

    Ok(violations)
}

fn sorted(mut cells: Vec<usize>) -> Vec<usize> {
    cells.sort_unstable();
    cells
}

fn check_event<T: AdaptationState>(
    object: &T,
    event: &'static str,
    n_cells: usize,
    expected: &[usize],
    violations: &mut Vec<Violation>,
) {
    let actual = sorted(object.element_cells());
    if actual != expected {
        violations.push(Violation {
            event,
            message: format!("elements in cells {actual:?}, expected {expected:?}"),
        });
    }
    check_fields(object, event, n_cells, violations);
}

fn check_fields<T: AdaptationState>(
    object: &T,
    event: &'static str,
    n_cells: usize,
    violations: &mut Vec<Violation>,
) {
    for (name, len) in object.field_lengths() {
        if len != n_cells {
            violations.push(Violation {
                event,
                message: format!("field '{name}' has {len} values for {n_cells} cells"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ScalarField;

    /// Elements and a field, following every event.
    struct Complete {
        cells: Vec<usize>,
        field: ScalarField,
    }

    impl MeshAdaptive for Complete {
        fn topo_change(&mut self, map: &TopoChangeMap) -> MeshResult<()> {
            let reverse = map.reverse_cell_map();
            self.cells = self.cells.iter().filter_map(|&c| reverse[c]).collect();
            self.field.map_topo(map, 0.0)
        }

        fn map_mesh(&mut self, map: &MeshMap) -> MeshResult<()> {
            let relocation = map.cell_relocation();
            self.cells = self.cells.iter().filter_map(|&c| relocation[c]).collect();
            self.field.map_mesh(map, 0.0)
        }

        fn distribute(&mut self, map: &DistributionMap) -> MeshResult<()> {
            self.cells = self
                .cells
                .iter()
                .filter_map(|&c| map.destination(c).map(|d| d.cell))
                .collect();
            self.field.distribute(map)
        }
    }

    impl AdaptationState for Complete {
        fn element_cells(&self) -> Vec<usize> {
            self.cells.clone()
        }

        fn field_lengths(&self) -> Vec<(String, usize)> {
            vec![(self.field.name().to_string(), self.field.len())]
        }
    }

    /// Follows topology changes only.
    struct TopoOnly {
        cells: Vec<usize>,
    }

    impl MeshAdaptive for TopoOnly {
        fn topo_change(&mut self, map: &TopoChangeMap) -> MeshResult<()> {
            let reverse = map.reverse_cell_map();
            self.cells = self.cells.iter().filter_map(|&c| reverse[c]).collect();
            Ok(())
        }
    }

    impl AdaptationState for TopoOnly {
        fn element_cells(&self) -> Vec<usize> {
            self.cells.clone()
        }
    }

    struct Stateless;
    impl MeshAdaptive for Stateless {}
    impl AdaptationState for Stateless {}

    #[test]
    fn complete_object_passes() {
        let mut obj = Complete {
            cells: vec![0, 2, 2],
            field: ScalarField::zeros("T", 3),
        };
        assert!(check_adaptation(&mut obj, 3).unwrap().is_empty());
    }

    #[test]
    fn partial_object_is_caught() {
        let mut obj = TopoOnly { cells: vec![0, 1] };
        let violations = check_adaptation(&mut obj, 2).unwrap();
        let events: Vec<_> = violations.iter().map(|v| v.event).collect();
        assert_eq!(events, vec!["map_mesh", "distribute"]);
    }

    #[test]
    fn stateless_defaults_pass() {
        assert!(check_adaptation(&mut Stateless, 4).unwrap().is_empty());
        assert!(check_adaptation(&mut Stateless, 0).is_err());
    }
}
