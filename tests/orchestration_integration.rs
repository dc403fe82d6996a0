// End-to-end runs of the orchestrator against a scripted predictor

use std::{
    collections::BTreeSet,
    sync::Arc,
    time::{Duration, Instant},
};

use pitwall::{
    GridPositions, Orchestrator, PredictionRecord, RaceConditions, SimulationInvoker,
    SimulationRequest, SimulationState,
    simulation::{InvokerConfig, MockPredictor, OrchestratorConfig, predictor::PredictorArg},
    track::catalog,
};
use tokio::runtime::Handle;

const QUALIFYING_HEADER: &str = "Position,DriverName,TeamName,Sector1Time,Sector2Time,Sector3Time,\
Sector1SpeedMin,Sector1SpeedMax,Sector1SpeedAvg,Sector1RPMAvg,Sector1ThrottleAvg,Sector1BrakeAvg,\
Sector2SpeedMin,Sector2SpeedMax,Sector2SpeedAvg,Sector2RPMAvg,Sector2ThrottleAvg,Sector2BrakeAvg,\
Sector3SpeedMin,Sector3SpeedMax,Sector3SpeedAvg,Sector3RPMAvg,Sector3ThrottleAvg,Sector3BrakeAvg,\
SpeedI1,SpeedI2,SpeedFL,SpeedST,LapTime";

const STRATEGY_HEADER: &str = "best_strategy,confidence,num_stops,alternative_1,confidence_1,\
alternative_2,confidence_2,alternative_3,confidence_3";

fn qualifying_row(position: u32, driver: &str, team: &str, lap_time: f64) -> Vec<String> {
    let mut fields = vec![position.to_string(), driver.to_string(), team.to_string()];
    fields.extend(["29.84", "38.91", "22.7"].iter().map(|s| s.to_string()));
    for sector in 0..3 {
        fields.extend(
            [
                95.0 + sector as f64,
                312.4,
                201.8,
                10_850.0,
                68.2,
                14.9,
            ]
            .iter()
            .map(f64::to_string),
        );
    }
    fields.extend(["288.5", "301.2", "279.9", "322.0"].iter().map(|s| s.to_string()));
    fields.push(lap_time.to_string());
    fields
}

fn invoker(predictor: MockPredictor, min_duration: Duration) -> Arc<SimulationInvoker> {
    Arc::new(SimulationInvoker::new(
        Arc::new(predictor),
        InvokerConfig {
            min_duration,
            call_timeout: Duration::from_secs(5),
        },
    ))
}

fn orchestrator(invoker: Arc<SimulationInvoker>) -> Orchestrator {
    Orchestrator::new(invoker, Handle::current(), OrchestratorConfig::default())
}

#[tokio::test]
async fn test_qualifying_with_one_short_row() {
    let predictor = MockPredictor::new().respond("qualifying", |args| {
        assert_eq!(args, [PredictorArg::Int(5)]);
        let mut short = qualifying_row(3, "Lando Norris", "McLaren", 91.9);
        short.pop();
        Ok([
            QUALIFYING_HEADER.to_string(),
            qualifying_row(1, "Max Verstappen", "Red Bull Racing", 89.708).join(","),
            qualifying_row(2, "Charles Leclerc", "Ferrari", 89.934).join(","),
            short.join(","),
        ]
        .join("\n"))
    });
    let orchestrator = orchestrator(invoker(predictor, Duration::ZERO));

    let bahrain = catalog::by_id(5).unwrap();
    assert_eq!(bahrain.name, "Bahrain");
    orchestrator.select_track(bahrain);
    orchestrator
        .enter_parameters(SimulationRequest::qualifying(bahrain))
        .unwrap();
    orchestrator.run().unwrap();

    match orchestrator.wait_for_outcome().await {
        SimulationState::Completed {
            records, rejected, ..
        } => {
            assert_eq!(records.len(), 2);
            assert_eq!(rejected, 1);
            let drivers: Vec<&str> = records
                .iter()
                .filter_map(|record| match record {
                    PredictionRecord::Qualifying(q) => Some(q.driver_name.as_str()),
                    PredictionRecord::Strategy(_) => None,
                })
                .collect();
            assert_eq!(drivers, vec!["Max Verstappen", "Charles Leclerc"]);
        }
        other => panic!("expected completion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_qualifying_error_message_fails_the_run() {
    let predictor =
        MockPredictor::new().respond("qualifying", |_| Ok("list index out of range".to_string()));
    let orchestrator = orchestrator(invoker(predictor, Duration::ZERO));
    let track = catalog::by_name("Monaco").unwrap();

    orchestrator.select_track(track);
    orchestrator
        .submit(SimulationRequest::qualifying(track))
        .unwrap();

    match orchestrator.wait_for_outcome().await {
        SimulationState::Failed { error, .. } => assert!(error.contains("list index out of range")),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_qualifying_respects_default_pacing_floor() {
    let predictor =
        MockPredictor::new().respond("qualifying", |_| Ok(format!("{}\n", QUALIFYING_HEADER)));
    let invoker = invoker(predictor, InvokerConfig::default().min_duration);
    let orchestrator = orchestrator(invoker);
    let track = catalog::by_name("Australia").unwrap();

    let started = Instant::now();
    orchestrator.select_track(track);
    orchestrator
        .submit(SimulationRequest::qualifying(track))
        .unwrap();
    let outcome = orchestrator.wait_for_outcome().await;

    assert!(started.elapsed() >= Duration::from_millis(1500));
    // a table with no data rows is a valid, empty result
    match outcome {
        SimulationState::Completed {
            records, rejected, ..
        } => {
            assert!(records.is_empty());
            assert_eq!(rejected, 0);
        }
        other => panic!("expected completion, got {:?}", other),
    }
}

fn strategy_predictor(failing: Option<i64>) -> MockPredictor {
    MockPredictor::new().respond("strategy", move |args| {
        let position = args[1].as_int().unwrap_or(0);
        assert_eq!(args[2].as_bool(), Some(false));
        assert_eq!(&args[3..], [PredictorArg::Int(26), PredictorArg::Int(26)]);
        if failing.is_none() || failing == Some(position) {
            return Err(format!("KeyError: {}", position));
        }
        Ok(format!(
            "{}\nM-H,0.6{},1,S-H,0.2,M-M-H,0.1,S-M-H,0.05\n",
            STRATEGY_HEADER,
            position % 10
        ))
    })
}

fn abu_dhabi_request() -> SimulationRequest {
    let track = catalog::by_id(1).unwrap();
    SimulationRequest::strategy(
        track,
        RaceConditions {
            air_temp_c: 26,
            track_temp_c: 26,
            is_wet: false,
        },
        GridPositions::full(),
    )
}

#[tokio::test]
async fn test_strategy_sweep_with_one_failing_position() {
    let orchestrator = orchestrator(invoker(strategy_predictor(Some(7)), Duration::ZERO));
    orchestrator.select_track(catalog::by_id(1).unwrap());
    orchestrator.submit(abu_dhabi_request()).unwrap();

    match orchestrator.wait_for_outcome().await {
        SimulationState::Completed {
            records, failures, ..
        } => {
            assert_eq!(records.len(), 19);
            assert_eq!(failures, BTreeSet::from([7]));
            let positions: Vec<u8> = records
                .iter()
                .filter_map(|record| match record {
                    PredictionRecord::Strategy(s) => Some(s.grid_position),
                    PredictionRecord::Qualifying(_) => None,
                })
                .collect();
            let expected: Vec<u8> = (1..=20).filter(|p| *p != 7).collect();
            assert_eq!(positions, expected);
        }
        other => panic!("expected completion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_strategy_sweep_with_every_position_failing() {
    let orchestrator = orchestrator(invoker(strategy_predictor(None), Duration::ZERO));
    orchestrator.select_track(catalog::by_id(1).unwrap());
    orchestrator.submit(abu_dhabi_request()).unwrap();

    assert!(matches!(
        orchestrator.wait_for_outcome().await,
        SimulationState::Failed { .. }
    ));
}

#[tokio::test]
async fn test_result_arriving_after_cancel_is_discarded() {
    let predictor = MockPredictor::new()
        .respond("qualifying", |_| {
            Ok(format!(
                "{}\n{}",
                QUALIFYING_HEADER,
                qualifying_row(1, "George Russell", "Mercedes", 92.1).join(",")
            ))
        })
        .with_call_delay(Duration::from_millis(200));
    let orchestrator = orchestrator(invoker(predictor, Duration::ZERO));
    let track = catalog::by_name("Great Britain").unwrap();

    orchestrator.select_track(track);
    orchestrator
        .submit(SimulationRequest::qualifying(track))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // user navigates back to the track screen
    orchestrator.select_track(track);
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(
        orchestrator.snapshot(),
        SimulationState::TrackSelected { track: track.id }
    );
}

#[tokio::test]
async fn test_strategy_sweep_with_four_alternatives_per_row() {
    // the strategy module appends a fourth alternative when it has one
    let predictor = MockPredictor::new().respond("strategy", |_| {
        Ok(format!(
            "{},alternative_4,confidence_4\nM-H,0.41,1,S-H,0.22,M-M-H,0.12,S-M-H,0.08,H-M,0.05\n",
            STRATEGY_HEADER
        ))
    });
    let orchestrator = orchestrator(invoker(predictor, Duration::ZERO));
    orchestrator.select_track(catalog::by_id(1).unwrap());
    orchestrator.submit(abu_dhabi_request()).unwrap();

    match orchestrator.wait_for_outcome().await {
        SimulationState::Completed {
            records,
            rejected,
            failures,
            ..
        } => {
            assert_eq!(records.len(), 20);
            assert_eq!(rejected, 0);
            assert!(failures.is_empty());
        }
        other => panic!("expected completion, got {:?}", other),
    }
}
