// Simulation orchestration
// Requests, the prediction module boundary, invocation pacing, strategy sweeps and the
// observable state machine tying them together

pub mod invoker;
pub mod orchestrator;
pub mod predictor;
pub mod sweep;

use std::ops::RangeInclusive;

use crate::{
    PitwallError,
    prediction::PredictionKind,
    track::{Track, TrackId},
};
use predictor::PredictorArg;

pub use invoker::{InvokerConfig, SimulationInvoker};
pub use orchestrator::{Orchestrator, OrchestratorConfig, RunToken, SimulationState};
pub use predictor::{MockPredictor, Predictor, PythonPredictor};
pub use sweep::{SweepOutcome, run_sweep};

/// Lowest and highest starting grid positions
pub const GRID_POSITIONS: RangeInclusive<u8> = 1..=20;
/// Function every prediction module exposes
pub const ENTRY_POINT: &str = "main";

/// Weather inputs to the strategy model
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaceConditions {
    pub air_temp_c: i32,
    pub track_temp_c: i32,
    pub is_wet: bool,
}

impl RaceConditions {
    /// Use the track's recommended temperatures
    pub fn recommended(track: &Track, is_wet: bool) -> Self {
        Self {
            air_temp_c: track.recommended_temps_c.0,
            track_temp_c: track.recommended_temps_c.1,
            is_wet,
        }
    }
}

/// A contiguous range of starting positions to sweep, always inside [`GRID_POSITIONS`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridPositions {
    first: u8,
    last: u8,
}

impl GridPositions {
    pub fn new(first: u8, last: u8) -> Result<Self, PitwallError> {
        if !GRID_POSITIONS.contains(&first) || !GRID_POSITIONS.contains(&last) {
            return Err(PitwallError::InvalidRequest {
                field: "grid".to_string(),
                reason: format!(
                    "positions must be within {}..={}",
                    GRID_POSITIONS.start(),
                    GRID_POSITIONS.end()
                ),
            });
        }
        if first > last {
            return Err(PitwallError::InvalidRequest {
                field: "grid".to_string(),
                reason: format!("first position {} is after last position {}", first, last),
            });
        }
        Ok(Self { first, last })
    }

    pub fn single(position: u8) -> Result<Self, PitwallError> {
        Self::new(position, position)
    }

    /// The whole grid, 1 to 20
    pub fn full() -> Self {
        Self {
            first: *GRID_POSITIONS.start(),
            last: *GRID_POSITIONS.end(),
        }
    }

    pub fn positions(&self) -> RangeInclusive<u8> {
        self.first..=self.last
    }

    pub fn len(&self) -> usize {
        usize::from(self.last - self.first) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Qualifying,
    Strategy {
        conditions: RaceConditions,
        grid: GridPositions,
    },
}

/// What the user asked to simulate. Immutable once built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationRequest {
    pub track: TrackId,
    pub kind: RequestKind,
}

impl SimulationRequest {
    pub fn qualifying(track: &Track) -> Self {
        Self {
            track: track.id,
            kind: RequestKind::Qualifying,
        }
    }

    pub fn strategy(track: &Track, conditions: RaceConditions, grid: GridPositions) -> Self {
        Self {
            track: track.id,
            kind: RequestKind::Strategy { conditions, grid },
        }
    }

    /// Number of module calls needed to serve the request
    pub fn invocations(&self) -> usize {
        match self.kind {
            RequestKind::Qualifying => 1,
            RequestKind::Strategy { grid, .. } => grid.len(),
        }
    }
}

pub(crate) fn qualifying_args(track: TrackId) -> Vec<PredictorArg> {
    vec![PredictorArg::Int(i64::from(track.get()))]
}

pub(crate) fn strategy_args(
    track: TrackId,
    grid_position: u8,
    conditions: &RaceConditions,
) -> Vec<PredictorArg> {
    vec![
        PredictorArg::Int(i64::from(track.get())),
        PredictorArg::Int(i64::from(grid_position)),
        PredictorArg::Bool(conditions.is_wet),
        PredictorArg::Int(i64::from(conditions.air_temp_c)),
        PredictorArg::Int(i64::from(conditions.track_temp_c)),
    ]
}

pub(crate) fn strategy_kind(grid_position: u8) -> PredictionKind {
    PredictionKind::Strategy { grid_position }
}
