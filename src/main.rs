use std::{collections::BTreeSet, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use itertools::Itertools;
use log::{error, info, warn};
use pitwall::{
    AppConfig, GridPositions, Orchestrator, PitwallError, RaceConditions, SimulationInvoker,
    SimulationRequest, SimulationState,
    prediction::{
        ConfidenceBand, PredictionRecord, QualifyingPrediction, StrategyPrediction, TyreCompound,
        format_lap_time,
    },
    simulation::PythonPredictor,
    track::{Track, catalog, drivers},
    writer,
};
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Python interpreter, overrides the config file
    #[arg(long, global = true)]
    python: Option<String>,

    /// Directory holding the prediction modules, overrides the config file
    #[arg(long, global = true)]
    modules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the supported tracks
    Tracks,
    /// Predict the qualifying order at a track
    Qualifying {
        #[arg(short, long)]
        track: String,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the output file as CSV instead of JSON Lines
        #[arg(long)]
        csv: bool,
    },
    /// Predict the best race strategy for each starting position
    Strategy {
        #[arg(short, long)]
        track: String,

        /// Air temperature in Celsius, defaults to the track's recommended value
        #[arg(long)]
        air_temp: Option<i32>,

        /// Track temperature in Celsius, defaults to the track's recommended value
        #[arg(long)]
        track_temp: Option<i32>,

        #[arg(long)]
        wet: bool,

        /// Only predict for this grid position
        #[arg(short, long)]
        grid: Option<u8>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        csv: bool,
    },
    /// Print a results file written with --output
    Show {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print the effective settings
    Config {
        /// Also store them in the config file
        #[arg(long)]
        save: bool,
    },
}

fn load_config(cli: &Args) -> Result<AppConfig, PitwallError> {
    let mut config = AppConfig::from_local_file()?.unwrap_or_default();
    if let Some(python) = &cli.python {
        config.python = python.clone();
    }
    if let Some(modules) = &cli.modules {
        config.module_dir = modules.clone();
    }
    Ok(config)
}

fn tracks() {
    for track in catalog::all() {
        println!(
            "{:>2}  {:<14} {:<40} {:>2} laps  {:.3} km  {}, overtaking {}",
            track.id,
            track.name,
            track.circuit_name,
            track.laps,
            track.circuit_length_km,
            track.track_type,
            track.overtaking_difficulty
        );
    }
}

fn strategy_request(
    config: &AppConfig,
    track: &Track,
    air_temp: Option<i32>,
    track_temp: Option<i32>,
    wet: bool,
    grid: Option<u8>,
) -> Result<SimulationRequest, PitwallError> {
    let mut conditions = RaceConditions::recommended(track, wet);
    if let Some(air_temp) = air_temp {
        conditions.air_temp_c = air_temp;
    }
    if let Some(track_temp) = track_temp {
        conditions.track_temp_c = track_temp;
    }
    let grid = match grid {
        Some(position) => GridPositions::single(position)?,
        None => GridPositions::new(1, config.grid_size)?,
    };
    Ok(SimulationRequest::strategy(track, conditions, grid))
}

fn simulate(
    config: &AppConfig,
    track: &Track,
    request: SimulationRequest,
    output: Option<PathBuf>,
    csv: bool,
) -> Result<(), PitwallError> {
    let runtime = Runtime::new().map_err(|e| PitwallError::RuntimeInit {
        reason: format!("could not start async runtime: {}", e),
    })?;
    let predictor = Arc::new(PythonPredictor::new(
        config.python.clone(),
        config.module_dir.clone(),
    ));
    let invoker = Arc::new(SimulationInvoker::new(predictor, config.invoker_config()));
    let orchestrator = Arc::new(Orchestrator::new(
        invoker,
        runtime.handle().clone(),
        config.orchestrator_config(),
    ));

    let interrupted = Arc::clone(&orchestrator);
    if let Err(e) = ctrlc::set_handler(move || {
        interrupted.cancel();
        println!("Exiting...");
        std::process::exit(0);
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    orchestrator.select_track(track);
    orchestrator.submit(request)?;
    println!(
        "Simulating {} at {}...",
        match request.kind {
            pitwall::RequestKind::Qualifying => "qualifying",
            pitwall::RequestKind::Strategy { .. } => "race strategy",
        },
        track.circuit_name
    );

    match runtime.block_on(orchestrator.wait_for_outcome()) {
        SimulationState::Completed {
            records,
            rejected,
            failures,
            ..
        } => {
            render(&records);
            report_gaps(rejected, &failures);
            if let Some(output) = output {
                if csv {
                    writer::write_results_csv(&output, &records)?;
                } else {
                    writer::write_results_jsonl(&output, &records)?;
                }
                println!("Saved {} records to {}", records.len(), output.display());
            }
        }
        SimulationState::Failed { error, .. } => {
            error!("Simulation failed: {}", error);
            eprintln!("Simulation failed: {}", error);
            std::process::exit(1);
        }
        other => info!("Simulation ended while {}", other.name()),
    }
    Ok(())
}

fn report_gaps(rejected: usize, failures: &BTreeSet<u8>) {
    if rejected > 0 {
        println!("{} malformed rows were skipped", rejected);
    }
    if !failures.is_empty() {
        println!(
            "No prediction for grid positions {}",
            failures.iter().join(", ")
        );
    }
}

fn render(records: &[PredictionRecord]) {
    let (qualifying, strategies): (Vec<_>, Vec<_>) =
        records.iter().partition_map(|record| match record {
            PredictionRecord::Qualifying(q) => itertools::Either::Left(q),
            PredictionRecord::Strategy(s) => itertools::Either::Right(s),
        });

    if !qualifying.is_empty() {
        render_qualifying(&qualifying);
    }
    if !strategies.is_empty() {
        render_strategies(&strategies);
    }
    if records.is_empty() {
        println!("No predictions");
    }
}

fn render_qualifying(results: &[&QualifyingPrediction]) {
    println!(
        "{:>3}  {:<22} {:<18} {:>9} {:>9} {:>9} {:>9}  {:>6}",
        "Pos", "Driver", "Team", "S1", "S2", "S3", "Lap", "Trap"
    );
    for q in results.iter().sorted_by_key(|q| q.position) {
        println!(
            "{:>3}  {:<22} {:<18} {:>9.3} {:>9.3} {:>9.3} {:>9}  {:>6.1}",
            q.position,
            drivers::full_name(&q.driver_name).unwrap_or(q.driver_name.as_str()),
            q.team_name,
            q.sector_times_s[0],
            q.sector_times_s[1],
            q.sector_times_s[2],
            format_lap_time(q.lap_time_s),
            q.speed_traps.speed_trap
        );
    }
}

fn describe_strategy(strategy: &str) -> String {
    match TyreCompound::stints(strategy) {
        Some(stints) => stints.iter().join(" > "),
        None => strategy.to_string(),
    }
}

fn render_strategies(results: &[&StrategyPrediction]) {
    for s in results {
        println!(
            "P{:<2}  {} ({} stop{}): {:.1}% [{}]",
            s.grid_position,
            describe_strategy(&s.best_strategy),
            s.pit_stops,
            if s.pit_stops == 1 { "" } else { "s" },
            s.confidence * 100.,
            ConfidenceBand::of(s.confidence)
        );
        println!(
            "      alternatives: {}",
            s.alternatives
                .iter()
                .map(|a| format!("{} {:.1}%", a.strategy, a.confidence * 100.))
                .join(", ")
        );
    }
}

fn show(input: &PathBuf) -> Result<(), PitwallError> {
    let records = writer::load_results(input)?;
    render(&records);
    Ok(())
}

fn run(cli: Args) -> Result<(), PitwallError> {
    match &cli.command {
        Commands::Tracks => tracks(),
        Commands::Qualifying { track, output, csv } => {
            let config = load_config(&cli)?;
            let track = catalog::by_name(track)?;
            simulate(
                &config,
                track,
                SimulationRequest::qualifying(track),
                output.clone(),
                *csv,
            )?;
        }
        Commands::Strategy {
            track,
            air_temp,
            track_temp,
            wet,
            grid,
            output,
            csv,
        } => {
            let config = load_config(&cli)?;
            let track = catalog::by_name(track)?;
            let request = strategy_request(&config, track, *air_temp, *track_temp, *wet, *grid)?;
            simulate(&config, track, request, output.clone(), *csv)?;
        }
        Commands::Show { input } => show(input)?,
        Commands::Config { save } => {
            let config = load_config(&cli)?;
            println!("{:#?}", config);
            if *save {
                config.save()?;
                println!("Saved to {}", AppConfig::path()?.display());
            }
        }
    }
    Ok(())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
