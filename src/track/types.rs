// Core data structures for the track reference catalog

use std::fmt;

/// Stable track identifier, also used as the prediction module's track selector.
///
/// Ids are only handed out by the catalog, so holding one proves the track exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub(super) u8);

impl TrackId {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A lap record and the driver (and season) holding it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LapRecord {
    pub time: &'static str,
    pub holder: &'static str,
}

/// Track layout classification used by the strategy model
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackType {
    HighSpeed,
    MediumSpeed,
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackType::HighSpeed => write!(f, "high speed"),
            TrackType::MediumSpeed => write!(f, "medium speed"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OvertakingDifficulty {
    Low,
    Medium,
    High,
}

impl fmt::Display for OvertakingDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OvertakingDifficulty::Low => write!(f, "low"),
            OvertakingDifficulty::Medium => write!(f, "medium"),
            OvertakingDifficulty::High => write!(f, "high"),
        }
    }
}

/// Immutable reference data for a Grand Prix circuit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Track {
    pub id: TrackId,
    /// Display name used to pick the track (e.g. "Great Britain")
    pub name: &'static str,
    /// Official circuit name (e.g. "Silverstone Circuit")
    pub circuit_name: &'static str,
    pub first_grand_prix: u16,
    pub laps: u32,
    pub circuit_length_km: f64,
    pub race_distance_km: f64,
    /// Share of the lap spent at full throttle, in percent
    pub full_throttle_pct: u8,
    pub longest_flat_out_m: u32,
    pub lap_record: LapRecord,
    pub qualifying_lap_record: LapRecord,
    /// Recommended (air, track) temperatures in Celsius
    pub recommended_temps_c: (i32, i32),
    pub average_speed_kph: f64,
    pub track_type: TrackType,
    pub overtaking_difficulty: OvertakingDifficulty,
}
