use trajsim::adb::AdbCatalog;
use trajsim::base::constants::{TOP_OF_CLIMB_PT, TOP_OF_DESCENT_PT};
use trajsim::config::{
    CatalogConfig, FlightConfig, MassCategoryConfig, SimulationConfig, load_catalog, load_flights,
};
use trajsim::flightplan::{
    CompileContext, CompileError, CompiledFlight, CompilerSettings, NavDatabase, TaxiPlanError,
    compile_flight,
};
use trajsim::simulation::{FlightPhase, InitialPosition, Simulation, initialize_phase};
use trajsim::waypoints::{FlightWaypoints, ListKind};

const GATE_TO_GATE: &str = r#"KSFO.<{"id":"Gate_A5"},{"id":"Txy_A_01"},{"id":"Txy_A_02"},{"id":"Rwy_01R_001"}>.RW01R.PORTE3.BSR.RZS.SADDE6.I24R.RW24R.<{"id":"Rwy_24R_001"},{"id":"Txy_B_01"},{"id":"Gate_32"}>.KLAX"#;

fn catalog() -> CatalogConfig {
    load_catalog("configs").expect("fixture catalog")
}

fn flight(route: &str) -> FlightConfig {
    FlightConfig {
        callsign: "TEST1".into(),
        actype: "B733".into(),
        departure_time_s: 0.0,
        latitude_deg: 37.6155,
        longitude_deg: -122.3860,
        altitude_ft: 13.0,
        tas_knots: 0.0,
        course_deg: 28.0,
        cruise_altitude_ft: 33_000.0,
        cruise_tas_knots: None,
        mass_category: MassCategoryConfig::Nominal,
        route: route.into(),
    }
}

fn compile(record: &FlightConfig) -> Result<CompiledFlight, CompileError> {
    let catalog = catalog();
    let navdata = NavDatabase::from_config(&catalog).expect("nav data");
    let adb = AdbCatalog::from_config(&catalog.adb_tables, &catalog.synonyms).expect("tables");
    let ctx = CompileContext {
        navdata: &navdata,
        adb: &adb,
        settings: CompilerSettings::default(),
    };
    compile_flight(record, &ctx)
}

#[test]
fn gate_to_gate_plan_places_toc_before_tod() {
    let compiled = compile(&flight(GATE_TO_GATE)).expect("compiles");
    let plan = &compiled.plan;
    assert_eq!(plan.origin_elevation_ft, 13.0);
    assert_eq!(plan.cruise_altitude_ft, 33_000.0);
    assert!(plan.climb_distance_ft > 0.0);
    assert!(plan.descent_distance_ft > 0.0);
    assert!(plan.route.len() <= trajsim::base::constants::MAX_FLIGHT_PLAN_LENGTH);

    let tocs = plan.route.iter().filter(|p| p.name == TOP_OF_CLIMB_PT).count();
    let tods = plan.route.iter().filter(|p| p.name == TOP_OF_DESCENT_PT).count();
    assert_eq!((tocs, tods), (1, 1));
    assert!(plan.toc_index.unwrap() < plan.tod_index.unwrap());
}

#[test]
fn airborne_start_above_cruise_has_no_toc() {
    let mut record = flight("KSFO./.BSR.RZS.SADDE6.I24R.KLAX");
    record.latitude_deg = 36.6;
    record.longitude_deg = -121.7;
    record.altitude_ft = 34_000.0;
    let compiled = compile(&record).expect("compiles");
    let plan = &compiled.plan;
    assert_eq!(plan.climb_distance_ft, 0.0);
    assert!(plan.toc_index.is_none());
    let tods = plan.route.iter().filter(|p| p.name == TOP_OF_DESCENT_PT).count();
    assert_eq!(tods, 1);
}

#[test]
fn waypoint_lists_terminate_within_their_length() {
    let compiled = compile(&flight(GATE_TO_GATE)).expect("compiles");
    let wps = FlightWaypoints::from_compiled(&compiled);
    for kind in [ListKind::Departing, ListKind::Airborne, ListKind::Landing] {
        let list = wps.list(kind);
        assert!(!list.is_empty(), "{kind:?}");
        assert_eq!(list.traverse_len().unwrap(), list.len(), "{kind:?}");
        assert_eq!(list.iter().count(), list.len());
    }
    assert_eq!(wps.departing.len(), 4);
    assert_eq!(wps.landing.len(), 3);
}

#[test]
fn malformed_taxi_plan_is_ignored_at_load() {
    let good = flight(GATE_TO_GATE);
    let mut bad = flight(
        r#"KSFO.<{"id":"Gate_A5"},{"id":"Txy_A_01",{"id":"Rwy_01R_001"}>.RW01R.PORTE3.BSR.RZS.SADDE6.I24R.KLAX"#,
    );
    bad.callsign = "BAD1".into();
    assert!(matches!(
        compile(&bad),
        Err(CompileError::Taxi(TaxiPlanError::MissingCloseBrace))
    ));

    let sim = Simulation::load(&catalog(), &[bad, good], SimulationConfig::default()).unwrap();
    assert_eq!(sim.num_flights(), 1);
    assert_eq!(sim.report().ignored, 1);
    assert_eq!(sim.callsign(0).unwrap(), "TEST1");
    assert!(sim.rejections().iter().any(|r| r.callsign == "BAD1"));
}

#[test]
fn flight_on_first_taxi_node_targets_the_second() {
    let record = flight(GATE_TO_GATE);
    let compiled = compile(&record).expect("compiles");
    let wps = FlightWaypoints::from_compiled(&compiled);
    let pos = InitialPosition {
        lat_deg: record.latitude_deg,
        lon_deg: record.longitude_deg,
        alt_ft: record.altitude_ft,
    };
    let first = initialize_phase(pos, &compiled.plan, &wps, 100.0).unwrap();
    let second = initialize_phase(pos, &compiled.plan, &wps, 100.0).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.list, ListKind::Departing);
    assert_eq!(first.index, 1);
    assert_eq!(first.phase, FlightPhase::OriginGate);
}

#[test]
fn sample_batch_runs_to_completion() {
    let flights = load_flights("configs/flights.yaml").unwrap();
    let mut sim = Simulation::load(&catalog(), &flights, SimulationConfig::default()).unwrap();
    let ticks = sim.run_to_end().unwrap();
    for i in 0..sim.num_flights() {
        let traj = sim.trajectory(i).unwrap();
        assert!(traj.len() <= ticks);
        // Samples are appended in tick order.
        assert!(traj.times().windows(2).all(|w| w[0] < w[1]));
        assert!(sim.state(i).unwrap().landed);
    }
}
