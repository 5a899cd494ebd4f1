//! Error types for ingesting station observations
use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ingestion. Any of these aborts the run.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Failed to read an input file
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be split into the expected fields
    #[error("Malformed row {line} in {origin}: {reason}")]
    MalformedRow {
        origin: String,
        line: usize,
        reason: String,
    },

    /// Year/month/day/hour do not form a valid timestamp
    #[error("Invalid timestamp for station {station}: {year:04}-{month:02}-{day:02} hour {hour}")]
    InvalidTimestamp {
        station: String,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
    },

    /// Two rows for the same station and hour
    #[error("Duplicate observation for station {station} at {timestamp}")]
    DuplicateHour {
        station: String,
        timestamp: NaiveDateTime,
    },

    /// Rows from more than one station were handed to a single ingest
    #[error("Observations from more than one station: {first} and {second}")]
    MixedStations { first: String, second: String },

    /// Nothing to ingest
    #[error("No observations to ingest")]
    EmptyInput,
}

/// Type alias for Results using IngestError
pub type Result<T> = std::result::Result<T, IngestError>;
