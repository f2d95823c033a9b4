//! The bundled demo case run end to end: assembly, stepping, live
//! reconfiguration and all three mesh events.

use cf_app::{AppError, Case, Driver, parse_case, registered_models, validate_case};
use cf_heat::write_phases;
use cf_mesh::{
    ChannelTransport, Destination, DistributionMap, Mesh, MeshMap, TopoChangeMap, Transport,
};
use std::sync::Arc;
use std::thread;

const DEMO: &str = include_str!("../../../cases/boiling.yaml");
const BOILING: &str = "heatTransferModel.gas_liquid_inThe_liquid";
const GUNN: &str = "heatTransferModel.oil_liquid";
const SPRAY: &str = "lagrangian/sprayCloud";

fn demo() -> Case {
    let case = parse_case(DEMO).unwrap();
    validate_case(&case).unwrap();
    case
}

#[test]
fn built_in_variants_are_registered() {
    let entries = registered_models();
    let has = |family: &str, tag: &str| entries.iter().any(|e| e.family == family && e.tag == tag);
    assert!(has("XiModel", "uniformConstant"));
    assert!(has("heatTransferModel", "wallBoiling"));
    assert!(has("heatTransferModel", "spherical"));
    assert!(has("heatTransferModel", "Gunn"));
    assert!(has("partitioningModel", "Lavieville"));
    assert!(has("nucleationSiteModel", "LemmertChawla"));
    assert!(has("departureDiameterModel", "TolubinskiKostanchuk"));
    assert!(has("departureFrequencyModel", "Cole"));
}

#[test]
fn demo_case_assembles_in_order() {
    let driver = Driver::new(&demo()).unwrap();
    let names: Vec<_> = driver.objects().names().collect();
    assert_eq!(names, vec!["XiModel", BOILING, GUNN, SPRAY]);
    assert_eq!(driver.heat_model_names(), &[BOILING.to_string(), GUNN.to_string()]);
    assert_eq!(driver.cloud(SPRAY).unwrap().len(), 3);
    assert_eq!(driver.heat_model(BOILING).unwrap().type_name(), "wallBoiling");
}

#[test]
fn step_reports_every_interface() {
    let mut driver = Driver::new(&demo()).unwrap();
    let report = driver.step().unwrap();

    assert_eq!(report.step, 1);
    assert_eq!(report.n_cells, 8);
    assert_eq!(report.xi, Some((1.6, 1.6)));
    assert_eq!(report.parcels, 3);

    let boiling = &report.interfaces[0];
    assert_eq!(boiling.model, "wallBoiling");
    let (k_min, k_max) = boiling.k_range.unwrap();
    assert!(k_min > 0.0 && k_min <= k_max);
    let transfer = boiling.mass_transfer.unwrap();
    assert!(transfer.is_finite());

    let gunn = &report.interfaces[1];
    assert_eq!(gunn.model, "Gunn");
    assert!(gunn.k_range.unwrap().0 > 0.0);
    assert_eq!(gunn.mass_transfer, None);
}

#[test]
fn unchanged_state_gives_identical_steps() {
    let mut driver = Driver::new(&demo()).unwrap();
    let first = driver.step().unwrap();
    let second = driver.step().unwrap();
    assert_eq!(second.step, 2);
    assert_eq!(first.interfaces, second.interfaces);
}

#[test]
fn hotter_wall_boils_harder() {
    let mut driver = Driver::new(&demo()).unwrap();
    let cold = driver.step().unwrap().interfaces[0].k_range.unwrap().1;
    driver.ramp_wall_temperature(15.0).unwrap();
    let hot = driver.step().unwrap().interfaces[0].k_range.unwrap().1;
    assert!(hot > cold, "K {hot} should exceed {cold}");
}

#[test]
fn reconfigure_reports_changed_models() {
    let mut case = demo();
    let mut driver = Driver::new(&case).unwrap();
    driver.step().unwrap();

    assert!(driver.reconfigure(&case).unwrap().is_empty());

    case.heat_transfer[0].model.insert("relax", 0.3);
    assert_eq!(driver.reconfigure(&case).unwrap(), vec![BOILING.to_string()]);

    case.heat_transfer[1].model.insert("type", "spherical");
    assert!(matches!(driver.reconfigure(&case), Err(AppError::Validation(_))));
}

#[test]
fn rejected_reconfigure_leaves_every_model_as_it_was() {
    let mut case = demo();
    let mut driver = Driver::new(&case).unwrap();
    driver.step().unwrap();

    let combustion = case.combustion.as_mut().unwrap();
    combustion.xi_model.insert("Xi", 3.0);
    case.heat_transfer[0].model.insert("relax", 0.3);
    case.heat_transfer[1].model.insert("type", "spherical");
    assert!(matches!(driver.reconfigure(&case), Err(AppError::Validation(_))));

    let xi = driver.xi().unwrap().unwrap();
    assert_eq!(xi.max(), Some(1.6));

    // The relax edit was not applied, so it still counts as a change.
    let mut case = demo();
    case.heat_transfer[0].model.insert("relax", 0.3);
    assert_eq!(driver.reconfigure(&case).unwrap(), vec![BOILING.to_string()]);
}

#[test]
fn reconfigure_rejects_an_invalid_coefficient_before_applying_any() {
    let mut case = demo();
    let mut driver = Driver::new(&case).unwrap();

    case.combustion.as_mut().unwrap().xi_model.insert("Xi", 2.0);
    case.heat_transfer[0].model.insert("relax", 1.5);
    assert!(driver.reconfigure(&case).is_err());
    assert_eq!(driver.xi().unwrap().unwrap().max(), Some(1.6));
}

#[test]
fn reconfigure_rejects_removing_combustion() {
    let mut case = demo();
    let mut driver = Driver::new(&case).unwrap();
    case.combustion = None;
    assert!(matches!(driver.reconfigure(&case), Err(AppError::Validation(_))));
    assert!(driver.xi().unwrap().is_some());
}

#[test]
fn unknown_model_tag_is_a_config_error() {
    let mut case = demo();
    case.heat_transfer[1].model.insert("type", "Nusselt42");
    match Driver::new(&case) {
        Err(AppError::Config(message)) => assert!(message.contains("Nusselt42")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn refinement_reaches_every_owner() {
    let mut driver = Driver::new(&demo()).unwrap();
    driver.step().unwrap();

    driver
        .topo_change(&TopoChangeMap::refine(8, &[0, 7]).unwrap())
        .unwrap();
    assert_eq!(driver.mesh().n_cells(), 10);

    let report = driver.step().unwrap();
    assert_eq!(report.n_cells, 10);
    assert_eq!(report.parcels, 3);
    assert_eq!(driver.xi().unwrap().unwrap().len(), 10);
}

#[test]
fn coarsening_keeps_parcels_in_merged_cells() {
    let mut driver = Driver::new(&demo()).unwrap();
    driver.step().unwrap();

    driver.map_mesh(&MeshMap::coarsen(8, 2).unwrap()).unwrap();
    assert_eq!(driver.mesh().n_cells(), 4);

    let cells: Vec<_> = driver.cloud(SPRAY).unwrap().iter().map(|p| p.cell).collect();
    assert_eq!(cells, vec![0, 1, 3]);
    assert_eq!(driver.step().unwrap().n_cells, 4);
}

#[test]
fn wall_temperature_ramp_survives_refinement() {
    let mut driver = Driver::new(&demo()).unwrap();
    driver.ramp_wall_temperature(5.0).unwrap();
    driver
        .topo_change(&TopoChangeMap::refine(8, &[2]).unwrap())
        .unwrap();
    let phases = cf_heat::read_phases(driver.phases()).unwrap();
    assert!(phases.wall().temperature.values().iter().all(|&t| (t - 388.15).abs() < 1e-9));
}

#[test]
fn swapping_halves_between_two_ranks() {
    const N_RANKS: usize = 2;
    const LOCAL: usize = 4;

    let handles: Vec<_> = ChannelTransport::ranks(N_RANKS)
        .into_iter()
        .map(|transport| {
            let case = demo();
            thread::spawn(move || {
                let rank = transport.rank();
                let mesh = Mesh::partitioned(LOCAL, rank, N_RANKS).unwrap();
                let mut driver = Driver::on_mesh(&case, mesh).unwrap();
                // Distinguish the ranks so the swap is observable.
                write_phases(driver.phases())
                    .unwrap()
                    .wall_mut()
                    .temperature
                    .fill(380.0 + 10.0 * rank as f64);
                driver.step().unwrap();

                let destinations = (0..LOCAL)
                    .map(|cell| Destination {
                        rank: N_RANKS - 1 - rank,
                        cell,
                    })
                    .collect();
                let map = DistributionMap::new(destinations, LOCAL, Arc::new(transport)).unwrap();
                driver.distribute(&map).unwrap();

                let report = driver.step().unwrap();
                let wall = cf_heat::read_phases(driver.phases())
                    .unwrap()
                    .wall()
                    .temperature
                    .values()[0];
                let mut ids: Vec<_> = driver
                    .cloud(SPRAY)
                    .unwrap()
                    .iter()
                    .map(|p| (p.id.index(), p.cell))
                    .collect();
                ids.sort_unstable();
                (rank, wall, ids, report)
            })
        })
        .collect();

    for handle in handles {
        let (rank, wall, ids, report) = handle.join().unwrap();
        assert_eq!(report.n_cells, LOCAL);
        assert!(report.interfaces[0].mass_transfer.is_some());
        match rank {
            0 => {
                assert_eq!(wall, 390.0);
                assert_eq!(ids, vec![(2, 3)]);
            }
            _ => {
                assert_eq!(wall, 380.0);
                assert_eq!(ids, vec![(0, 0), (1, 3)]);
            }
        }
    }
}
