// Error types for pitwall

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum PitwallError {
    // Errors for the prediction runtime
    #[snafu(display("Prediction runtime could not be started: {reason}"))]
    RuntimeInit { reason: String },
    #[snafu(display("Prediction module {module} failed: {reason}"))]
    Invocation { module: String, reason: String },
    #[snafu(display("Prediction module {module} did not answer within {timeout_ms}ms"))]
    InvocationTimeout { module: String, timeout_ms: u64 },
    #[snafu(display("Prediction module {module} returned a message instead of results: {message}"))]
    ModuleReported { module: String, message: String },

    // Request building errors
    #[snafu(display("Unknown track: {name}"))]
    UnknownTrack { name: String },
    #[snafu(display("Invalid request: {field} - {reason}"))]
    InvalidRequest { field: String, reason: String },
    #[snafu(display("Cannot {action} while {from}"))]
    InvalidTransition { from: String, action: String },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Errors for the results writer and loader
    #[snafu(display("Error writing results file"))]
    WriterError { source: io::Error },
    #[snafu(display("Error writing CSV results"))]
    CsvWriterError { source: csv::Error },
    #[snafu(display("Invalid results file: {path}"))]
    InvalidResultsFile { path: String },
    #[snafu(display("Error loading results file"))]
    ResultsLoaderError { source: io::Error },
}
