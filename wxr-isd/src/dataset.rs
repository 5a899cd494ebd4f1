//! Ingested, calendar-indexed observations for a single station.
//!
//! `ingest` is the only way to build a [`Dataset`]; after that the
//! observations are read-only and every index is computed from the same
//! snapshot.

use crate::{
    calendar::{CalendarKey, Month},
    error::{IngestError, Result},
    observation::RawObservation,
};
use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

/// One hourly temperature reading with its calendar keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    /// Degrees Celsius, None when the sensor reported nothing.
    pub temperature: Option<f64>,
    pub calendar: CalendarKey,
}

impl Observation {
    pub fn year(&self) -> i32 {
        self.calendar.year
    }

    pub fn day_of_year(&self) -> u32 {
        self.calendar.day_of_year
    }
}

/// Per-day statistics over the valid hourly readings of that day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub day_of_year: u32,
    pub year: i32,
    pub month: Month,
    pub daily_high: Option<f64>,
    pub daily_low: Option<f64>,
    pub daily_mean: Option<f64>,
    /// Number of valid readings that went into the statistics.
    pub readings: usize,
}

/// The full, immutable observation history of one station.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    station_id: String,
    observations: Vec<Observation>,
}

/// Validate raw rows and derive their calendar keys.
///
/// Rows may come in any order; they are sorted by timestamp. Fails on the
/// first unparsable timestamp, duplicate station-hour or foreign station,
/// so no partial dataset is ever returned.
pub fn ingest(raw: Vec<RawObservation>) -> Result<Dataset> {
    let station_id = match raw.first() {
        Some(first) => first.station_id.clone(),
        None => return Err(IngestError::EmptyInput),
    };

    let mut observations = Vec::with_capacity(raw.len());
    for row in raw {
        if row.station_id != station_id {
            return Err(IngestError::MixedStations {
                first: station_id,
                second: row.station_id,
            });
        }
        let timestamp = NaiveDate::from_ymd_opt(row.year, row.month, row.day)
            .and_then(|date| date.and_hms_opt(row.hour, 0, 0))
            .ok_or_else(|| IngestError::InvalidTimestamp {
                station: row.station_id.clone(),
                year: row.year,
                month: row.month,
                day: row.day,
                hour: row.hour,
            })?;
        observations.push(Observation {
            timestamp,
            temperature: row.temperature_celsius(),
            calendar: timestamp.date().into(),
        });
    }

    observations.sort_by_key(|observation| observation.timestamp);
    if let Some(pair) = observations
        .windows(2)
        .find(|pair| pair[0].timestamp == pair[1].timestamp)
    {
        return Err(IngestError::DuplicateHour {
            station: station_id,
            timestamp: pair[1].timestamp,
        });
    }

    info!(
        "Ingested {} observations for station {}",
        observations.len(),
        station_id
    );
    Ok(Dataset {
        station_id,
        observations,
    })
}

impl Dataset {
    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    /// Observations in strictly increasing timestamp order.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// First and last calendar year present.
    pub fn year_span(&self) -> (i32, i32) {
        let first = self.observations.first().map_or(0, Observation::year);
        let last = self.observations.last().map_or(0, Observation::year);
        (first, last)
    }

    /// Group observations by (year, day-of-year) and reduce each day to its
    /// high, low and mean. Days whose readings are all missing are kept with
    /// None statistics.
    pub fn daily_aggregates(&self) -> Vec<DailyAggregate> {
        let mut days: BTreeMap<(i32, u32), DailyAggregate> = BTreeMap::new();
        let mut sums: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for observation in &self.observations {
            let key = (observation.year(), observation.day_of_year());
            let day = days.entry(key).or_insert_with(|| DailyAggregate {
                date: observation.calendar.date,
                day_of_year: observation.calendar.day_of_year,
                year: observation.calendar.year,
                month: observation.calendar.month,
                daily_high: None,
                daily_low: None,
                daily_mean: None,
                readings: 0,
            });
            if let Some(temperature) = observation.temperature {
                day.daily_high = Some(day.daily_high.map_or(temperature, |t| t.max(temperature)));
                day.daily_low = Some(day.daily_low.map_or(temperature, |t| t.min(temperature)));
                day.readings += 1;
                *sums.entry(key).or_default() += temperature;
            }
        }
        for (key, sum) in sums {
            if let Some(day) = days.get_mut(&key) {
                day.daily_mean = Some(sum / day.readings as f64);
            }
        }
        days.into_values().collect()
    }
}
