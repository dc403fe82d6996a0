// Library interface for pitwall
// This allows integration tests and benches to access internal modules

pub mod config;
pub mod errors;
pub mod prediction;
pub mod simulation;
pub mod track;
pub mod writer;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::PitwallError;
pub use prediction::{Decoded, PredictionKind, PredictionRecord, RawResult, decode};
pub use simulation::{
    GridPositions, Orchestrator, RaceConditions, RequestKind, SimulationInvoker,
    SimulationRequest, SimulationState,
};
pub use track::{Track, TrackId};
