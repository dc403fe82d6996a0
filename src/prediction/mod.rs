pub mod decoder;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use decoder::{Decoded, RawResult, RowRejection, decode};

/// Number of columns in a qualifying result row
pub const QUALIFYING_ARITY: usize = 29;
/// Number of columns in a strategy result row that are decoded. The module may append further
/// (alternative, confidence) pairs, which are ignored.
pub const STRATEGY_ARITY: usize = 9;
/// Marker separating stints in a strategy string, e.g. `S-M-H`
pub const STOP_MARKER: char = '-';

/// Which prediction module produced a raw result, and the context needed to decode it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredictionKind {
    Qualifying,
    Strategy { grid_position: u8 },
}

impl PredictionKind {
    pub fn arity(&self) -> usize {
        match self {
            PredictionKind::Qualifying => QUALIFYING_ARITY,
            PredictionKind::Strategy { .. } => STRATEGY_ARITY,
        }
    }

    /// Whether a row of `width` columns has this kind's layout
    pub fn accepts_width(&self, width: usize) -> bool {
        match self {
            PredictionKind::Qualifying => width == QUALIFYING_ARITY,
            PredictionKind::Strategy { .. } => {
                width >= STRATEGY_ARITY && (width - STRATEGY_ARITY) % 2 == 0
            }
        }
    }

    /// Name of the external module that serves this kind of prediction
    pub fn module(&self) -> &'static str {
        match self {
            PredictionKind::Qualifying => "qualifying",
            PredictionKind::Strategy { .. } => "strategy",
        }
    }
}

/// Telemetry averages predicted for a single sector
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SectorTelemetry {
    pub speed_min: f64,
    pub speed_max: f64,
    pub speed_avg: f64,
    pub rpm_avg: f64,
    pub throttle_avg: f64,
    pub brake_avg: f64,
}

/// Speed trap readings: intermediate 1, intermediate 2, finish line and speed trap
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SpeedTraps {
    pub i1: f64,
    pub i2: f64,
    pub finish_line: f64,
    pub speed_trap: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct QualifyingPrediction {
    pub position: u32,
    pub driver_name: String,
    pub team_name: String,
    pub sector_times_s: [f64; 3],
    pub sectors: [SectorTelemetry; 3],
    pub speed_traps: SpeedTraps,
    pub lap_time_s: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AlternativeStrategy {
    pub strategy: String,
    pub confidence: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StrategyPrediction {
    /// Starting grid position the prediction was requested for
    pub grid_position: u8,
    pub best_strategy: String,
    pub confidence: f64,
    pub pit_stops: u32,
    pub alternatives: [AlternativeStrategy; 3],
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind")]
pub enum PredictionRecord {
    Qualifying(QualifyingPrediction),
    Strategy(StrategyPrediction),
}

impl PredictionRecord {
    /// Encode the record back into the column layout used by the prediction modules.
    ///
    /// Floats use Rust's shortest round-trip representation, so decoding the output
    /// yields the same values.
    pub fn to_fields(&self) -> Vec<String> {
        match self {
            PredictionRecord::Qualifying(q) => {
                let mut fields = Vec::with_capacity(QUALIFYING_ARITY);
                fields.push(q.position.to_string());
                fields.push(q.driver_name.clone());
                fields.push(q.team_name.clone());
                fields.extend(q.sector_times_s.iter().map(f64::to_string));
                for sector in &q.sectors {
                    fields.extend(
                        [
                            sector.speed_min,
                            sector.speed_max,
                            sector.speed_avg,
                            sector.rpm_avg,
                            sector.throttle_avg,
                            sector.brake_avg,
                        ]
                        .iter()
                        .map(f64::to_string),
                    );
                }
                let traps = &q.speed_traps;
                fields.extend(
                    [traps.i1, traps.i2, traps.finish_line, traps.speed_trap]
                        .iter()
                        .map(f64::to_string),
                );
                fields.push(q.lap_time_s.to_string());
                fields
            }
            PredictionRecord::Strategy(s) => {
                let mut fields = Vec::with_capacity(STRATEGY_ARITY);
                fields.push(s.best_strategy.clone());
                fields.push(s.confidence.to_string());
                fields.push(s.pit_stops.to_string());
                for alternative in &s.alternatives {
                    fields.push(alternative.strategy.clone());
                    fields.push(alternative.confidence.to_string());
                }
                fields
            }
        }
    }
}

/// Number of pit stops encoded in a strategy string
pub fn pit_stops_in(strategy: &str) -> u32 {
    strategy.chars().filter(|c| *c == STOP_MARKER).count() as u32
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TyreCompound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
}

impl TyreCompound {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "S" => Some(TyreCompound::Soft),
            "M" => Some(TyreCompound::Medium),
            "H" => Some(TyreCompound::Hard),
            "I" => Some(TyreCompound::Intermediate),
            "W" => Some(TyreCompound::Wet),
            _ => None,
        }
    }

    /// Split a strategy string into its stints. Returns `None` if a stint uses an unknown compound.
    pub fn stints(strategy: &str) -> Option<Vec<Self>> {
        strategy.split(STOP_MARKER).map(Self::from_code).collect()
    }
}

impl fmt::Display for TyreCompound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TyreCompound::Soft => "Soft",
            TyreCompound::Medium => "Medium",
            TyreCompound::Hard => "Hard",
            TyreCompound::Intermediate => "Intermediate",
            TyreCompound::Wet => "Wet",
        };
        write!(f, "{}", name)
    }
}

/// Coarse bucket for a strategy confidence score
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

impl ConfidenceBand {
    pub fn of(confidence: f64) -> Self {
        if confidence < 0.1 {
            ConfidenceBand::Low
        } else if confidence < 0.3 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::High
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceBand::Low => write!(f, "Low"),
            ConfidenceBand::Medium => write!(f, "Medium"),
            ConfidenceBand::High => write!(f, "High"),
        }
    }
}

/// Format a lap time in seconds as `m:ss.sss`, independently of the host locale
pub fn format_lap_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.) * 1000.).round() as u64;
    let minutes = total_ms / 60_000;
    let rem_ms = total_ms % 60_000;
    format!("{}:{:02}.{:03}", minutes, rem_ms / 1000, rem_ms % 1000)
}
