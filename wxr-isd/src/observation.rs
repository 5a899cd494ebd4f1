use crate::error::{IngestError, Result};
use flate2::read::GzDecoder;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

/// ISD-Lite marker for a missing sensor value.
pub const MISSING_VALUE: i32 = -9999;

/// Minimum number of whitespace separated fields in an ISD-Lite row:
/// year, month, day, hour, air temperature. Dew point, pressure, wind,
/// sky cover and precipitation follow but are not used.
pub const MIN_FIELDS: usize = 5;

/// Air temperature is reported in tenths of a degree Celsius.
pub const TEMPERATURE_SCALE: f64 = 10.0;

/// One hourly row as delivered by the ingestion side, before any calendar
/// derivation or validation of the timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawObservation {
    pub station_id: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    /// Air temperature in tenths of a degree Celsius, None if missing.
    pub temperature_tenths: Option<i32>,
}

impl RawObservation {
    /// Temperature in degrees Celsius.
    pub fn temperature_celsius(&self) -> Option<f64> {
        self.temperature_tenths
            .map(|tenths| f64::from(tenths) / TEMPERATURE_SCALE)
    }

    /// Parse one ISD-Lite row, e.g.
    /// `1956 01 01 00   -11   -33 10213   220    41     0 -9999 -9999`.
    ///
    /// `origin` and `line` are only used for error reporting.
    pub fn parse_isd_lite_line(
        station_id: &str,
        origin: &str,
        line: usize,
        row: &str,
    ) -> Result<RawObservation> {
        let malformed = |reason: String| IngestError::MalformedRow {
            origin: origin.to_string(),
            line,
            reason,
        };
        let fields: Vec<&str> = row.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            return Err(malformed(format!(
                "expected at least {} fields, found {}",
                MIN_FIELDS,
                fields.len()
            )));
        }
        let year = fields[0]
            .parse::<i32>()
            .map_err(|_| malformed(format!("bad year '{}'", fields[0])))?;
        let month = fields[1]
            .parse::<u32>()
            .map_err(|_| malformed(format!("bad month '{}'", fields[1])))?;
        let day = fields[2]
            .parse::<u32>()
            .map_err(|_| malformed(format!("bad day '{}'", fields[2])))?;
        let hour = fields[3]
            .parse::<u32>()
            .map_err(|_| malformed(format!("bad hour '{}'", fields[3])))?;
        let temperature = fields[4]
            .parse::<i32>()
            .map_err(|_| malformed(format!("bad air temperature '{}'", fields[4])))?;
        Ok(RawObservation {
            station_id: station_id.to_string(),
            year,
            month,
            day,
            hour,
            temperature_tenths: (temperature != MISSING_VALUE).then_some(temperature),
        })
    }

    /// Parse every non-blank line of an ISD-Lite yearly file.
    pub fn parse_isd_lite(
        station_id: &str,
        origin: &str,
        reader: impl BufRead,
    ) -> Result<Vec<RawObservation>> {
        let mut observations = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| IngestError::Io {
                path: origin.into(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            observations.push(Self::parse_isd_lite_line(
                station_id,
                origin,
                index + 1,
                &line,
            )?);
        }
        Ok(observations)
    }
}

/// Station identifier from an ISD-Lite file name:
/// `062400-99999-1987.gz` -> `062400-99999`. Names that do not follow the
/// `USAF-WBAN-YEAR` pattern are used whole, minus extensions.
pub fn station_id_from_file_name(file_name: &str) -> String {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let parts: Vec<&str> = stem.split('-').collect();
    if parts.len() == 3 {
        format!("{}-{}", parts[0], parts[1])
    } else {
        stem.to_string()
    }
}

/// Read one ISD-Lite yearly file. `.gz` files are decompressed on the fly.
pub fn read_isd_lite(path: &Path) -> Result<Vec<RawObservation>> {
    let io_error = |source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let station_id = station_id_from_file_name(file_name);
    let file = File::open(path).map_err(io_error)?;
    let reader: Box<dyn Read> = if file_name.ends_with(".gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let origin = path.display().to_string();
    let observations =
        RawObservation::parse_isd_lite(&station_id, &origin, BufReader::new(reader))?;
    debug!("{}: {} rows", origin, observations.len());
    Ok(observations)
}

/// Read every yearly file in a directory, in file name order.
/// Hidden files are skipped.
pub fn read_isd_lite_dir(dir: &Path) -> Result<Vec<RawObservation>> {
    let io_error = |source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.'));
        if path.is_file() && !hidden {
            paths.push(path);
        }
    }
    paths.sort();
    if paths.is_empty() {
        warn!("No ISD-Lite files found in {}", dir.display());
    }

    let mut observations = Vec::new();
    for path in &paths {
        observations.extend(read_isd_lite(path)?);
    }
    info!(
        "Read {} rows from {} files in {}",
        observations.len(),
        paths.len(),
        dir.display()
    );
    Ok(observations)
}
