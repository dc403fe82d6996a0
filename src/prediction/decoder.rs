// Decoder for the delimited-text tables returned by the prediction modules
//
// Rows are untrusted: any row with the wrong number of columns or a column that fails to
// parse is dropped and counted, the rest of the table is unaffected.

use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;
use snafu::Snafu;

use super::{
    AlternativeStrategy, PredictionKind, PredictionRecord, QualifyingPrediction, SectorTelemetry,
    SpeedTraps, StrategyPrediction, pit_stops_in,
};

/// Why a single data row was dropped
#[derive(Debug, Snafu, Clone, PartialEq)]
pub enum RowRejection {
    #[snafu(display("expected {expected} columns, found {found}"))]
    WrongArity { expected: usize, found: usize },
    #[snafu(display("column {column}: '{value}' is not an integer"))]
    InvalidInteger { column: usize, value: String },
    #[snafu(display("column {column}: '{value}' is not a finite number"))]
    InvalidFloat { column: usize, value: String },
    #[snafu(display("column {column}: {value} is outside {min}..={max}"))]
    OutOfRange {
        column: usize,
        value: f64,
        min: f64,
        max: f64,
    },
    #[snafu(display("declared {declared} pit stops but strategy '{strategy}' has {derived}"))]
    PitStopMismatch {
        strategy: String,
        declared: u32,
        derived: u32,
    },
}

/// A table as returned by a prediction module: header row first, then data rows
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawResult {
    rows: Vec<Vec<String>>,
}

impl RawResult {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Split module output into rows using standard CSV quoting.
    ///
    /// Rows may have any length here; arity is checked per row by [`decode`].
    pub fn parse(text: &str) -> Result<Self, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record: StringRecord = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { rows })
    }

    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// When a module fails it may hand back an error message instead of a table. That shows up
    /// as a lone "header" whose shape does not match the expected layout.
    pub fn reported_message(&self, kind: PredictionKind) -> Option<String> {
        let header = self.header()?;
        if self.data_rows().is_empty() && !kind.accepts_width(header.len()) {
            Some(header.join(","))
        } else {
            None
        }
    }
}

/// Outcome of decoding a table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Decoded {
    pub records: Vec<PredictionRecord>,
    pub rejected: usize,
}

pub fn decode(raw: &RawResult, kind: PredictionKind) -> Decoded {
    let mut decoded = Decoded::default();
    for (row_no, row) in raw.data_rows().iter().enumerate() {
        match decode_row(row, kind) {
            Ok(record) => decoded.records.push(record),
            Err(rejection) => {
                debug!("{}: rejected row {}: {}", kind.module(), row_no + 1, rejection);
                decoded.rejected += 1;
            }
        }
    }
    decoded
}

fn decode_row(row: &[String], kind: PredictionKind) -> Result<PredictionRecord, RowRejection> {
    if !kind.accepts_width(row.len()) {
        return Err(RowRejection::WrongArity {
            expected: kind.arity(),
            found: row.len(),
        });
    }
    match kind {
        PredictionKind::Qualifying => decode_qualifying(row).map(PredictionRecord::Qualifying),
        PredictionKind::Strategy { grid_position } => {
            decode_strategy(row, grid_position).map(PredictionRecord::Strategy)
        }
    }
}

fn decode_qualifying(row: &[String]) -> Result<QualifyingPrediction, RowRejection> {
    let sector = |start: usize| -> Result<SectorTelemetry, RowRejection> {
        Ok(SectorTelemetry {
            speed_min: float(row, start)?,
            speed_max: float(row, start + 1)?,
            speed_avg: float(row, start + 2)?,
            rpm_avg: float(row, start + 3)?,
            throttle_avg: float(row, start + 4)?,
            brake_avg: float(row, start + 5)?,
        })
    };

    Ok(QualifyingPrediction {
        position: integer(row, 0)?,
        driver_name: row[1].clone(),
        team_name: row[2].clone(),
        sector_times_s: [float(row, 3)?, float(row, 4)?, float(row, 5)?],
        sectors: [sector(6)?, sector(12)?, sector(18)?],
        speed_traps: SpeedTraps {
            i1: float(row, 24)?,
            i2: float(row, 25)?,
            finish_line: float(row, 26)?,
            speed_trap: float(row, 27)?,
        },
        lap_time_s: float(row, 28)?,
    })
}

fn decode_strategy(row: &[String], grid_position: u8) -> Result<StrategyPrediction, RowRejection> {
    let best_strategy = row[0].clone();
    let declared = integer(row, 2)?;
    let derived = pit_stops_in(&best_strategy);
    if declared != derived {
        return Err(RowRejection::PitStopMismatch {
            strategy: best_strategy,
            declared,
            derived,
        });
    }

    let alternative = |column: usize| -> Result<AlternativeStrategy, RowRejection> {
        Ok(AlternativeStrategy {
            strategy: row[column].clone(),
            confidence: confidence(row, column + 1)?,
        })
    };

    Ok(StrategyPrediction {
        grid_position,
        confidence: confidence(row, 1)?,
        pit_stops: derived,
        alternatives: [alternative(3)?, alternative(5)?, alternative(7)?],
        best_strategy,
    })
}

// str::parse never consults the host locale: '.' is always the decimal separator
fn float(row: &[String], column: usize) -> Result<f64, RowRejection> {
    let value = &row[column];
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(RowRejection::InvalidFloat {
            column,
            value: value.clone(),
        }),
    }
}

fn integer(row: &[String], column: usize) -> Result<u32, RowRejection> {
    row[column]
        .parse::<u32>()
        .map_err(|_| RowRejection::InvalidInteger {
            column,
            value: row[column].clone(),
        })
}

fn confidence(row: &[String], column: usize) -> Result<f64, RowRejection> {
    let value = float(row, column)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(RowRejection::OutOfRange {
            column,
            value,
            min: 0.,
            max: 1.,
        });
    }
    Ok(value)
}
