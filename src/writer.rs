use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use log::info;

use crate::{
    PitwallError,
    prediction::{PredictionRecord, QUALIFYING_ARITY},
};

const QUALIFYING_COLUMNS: [&str; QUALIFYING_ARITY] = [
    "Position",
    "DriverName",
    "TeamName",
    "Sector1Time",
    "Sector2Time",
    "Sector3Time",
    "Sector1SpeedMin",
    "Sector1SpeedMax",
    "Sector1SpeedAvg",
    "Sector1RPMAvg",
    "Sector1ThrottleAvg",
    "Sector1BrakeAvg",
    "Sector2SpeedMin",
    "Sector2SpeedMax",
    "Sector2SpeedAvg",
    "Sector2RPMAvg",
    "Sector2ThrottleAvg",
    "Sector2BrakeAvg",
    "Sector3SpeedMin",
    "Sector3SpeedMax",
    "Sector3SpeedAvg",
    "Sector3RPMAvg",
    "Sector3ThrottleAvg",
    "Sector3BrakeAvg",
    "SpeedI1",
    "SpeedI2",
    "SpeedFL",
    "SpeedST",
    "LapTime",
];

// Strategy rows are prefixed with the grid position they were predicted for
const STRATEGY_COLUMNS: [&str; 10] = [
    "grid_position",
    "best_strategy",
    "confidence",
    "num_stops",
    "alternative_1",
    "confidence_1",
    "alternative_2",
    "confidence_2",
    "alternative_3",
    "confidence_3",
];

/// Write one JSON object per line
pub fn write_results_jsonl(file: &Path, records: &[PredictionRecord]) -> Result<(), PitwallError> {
    let results_file = File::create(file).map_err(|e| PitwallError::WriterError { source: e })?;
    let mut results_file_writer = BufWriter::new(results_file);
    for record in records {
        serde_json::to_writer(&mut results_file_writer, record).map_err(|e| {
            PitwallError::WriterError {
                source: e.into(),
            }
        })?;
        writeln!(results_file_writer).map_err(|e| PitwallError::WriterError { source: e })?;
    }
    results_file_writer
        .flush()
        .map_err(|e| PitwallError::WriterError { source: e })?;
    info!("Wrote {} records to {:?}", records.len(), file);
    Ok(())
}

/// Write records in the prediction modules' own column layout, with a header.
///
/// The header follows the first record; a mixed list is written as is. Qualifying files can be
/// decoded again like module output. Strategy files are for export: the leading
/// `grid_position` column has no place in the module layout, so only the remaining columns of
/// each row decode. Use [`write_results_jsonl`] for files meant to be loaded back.
pub fn write_results_csv(file: &Path, records: &[PredictionRecord]) -> Result<(), PitwallError> {
    let mut writer =
        csv::Writer::from_path(file).map_err(|e| PitwallError::CsvWriterError { source: e })?;

    match records.first() {
        Some(PredictionRecord::Qualifying(_)) => writer.write_record(QUALIFYING_COLUMNS),
        Some(PredictionRecord::Strategy(_)) => writer.write_record(STRATEGY_COLUMNS),
        None => Ok(()),
    }
    .map_err(|e| PitwallError::CsvWriterError { source: e })?;

    for record in records {
        let mut fields = record.to_fields();
        if let PredictionRecord::Strategy(strategy) = record {
            fields.insert(0, strategy.grid_position.to_string());
        }
        writer
            .write_record(&fields)
            .map_err(|e| PitwallError::CsvWriterError { source: e })?;
    }
    writer
        .flush()
        .map_err(|e| PitwallError::WriterError { source: e })?;
    info!("Wrote {} records to {:?}", records.len(), file);
    Ok(())
}

/// Read back a file written by [`write_results_jsonl`]
pub fn load_results(file: &Path) -> Result<Vec<PredictionRecord>, PitwallError> {
    if !file.exists() {
        return Err(PitwallError::InvalidResultsFile {
            path: format!("{:?}", file),
        });
    }
    serde_jsonlines::json_lines(file)
        .map_err(|e| PitwallError::ResultsLoaderError { source: e })?
        .collect::<Result<Vec<PredictionRecord>, std::io::Error>>()
        .map_err(|e| PitwallError::ResultsLoaderError { source: e })
}
