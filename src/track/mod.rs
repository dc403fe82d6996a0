// Track reference data
// Immutable, process-wide tables describing every circuit and driver the prediction modules support

pub mod catalog;
pub mod drivers;
pub mod types;

pub use types::{LapRecord, OvertakingDifficulty, Track, TrackId, TrackType};
