//! Record tracking tables.

use crate::load::{load_dataset, reference_year_or_last};
use clap::ValueEnum;
use log::info;
use serde::Serialize;
use std::{collections::BTreeMap, path::Path};
use wxr_indices::{RecordAgeHistogram, RecordEntry, RecordEvolution, RecordKind, RecordTracker};
use wxr_isd::DailyAggregate;
use wxr_utils::dates::format_date;

/// Which daily extreme to track.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    High,
    Low,
}

impl From<KindArg> for RecordKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::High => RecordKind::High,
            KindArg::Low => RecordKind::Low,
        }
    }
}

/// Optional record tables besides the evolution itself.
#[derive(Debug, Default, Clone)]
pub struct RecordOutputs {
    pub histogram_csv: Option<String>,
    pub by_month: bool,
    pub table_csv: Option<String>,
    pub per_year_csv: Option<String>,
}

/// Output format (with headers): `kind,day_of_year,rank,year,date,temperature`
#[derive(Debug, Serialize)]
struct RecordRow {
    kind: String,
    day_of_year: u32,
    rank: usize,
    year: i32,
    date: String,
    temperature: f64,
}

/// Output format (with headers): `kind,day_of_year,year,date,temperature`
#[derive(Debug, Serialize)]
struct CurrentRecordRow {
    kind: String,
    day_of_year: u32,
    year: i32,
    date: String,
    temperature: f64,
}

/// Output format (with headers): `reference_year,kind,month,age,days`.
/// `month` is empty unless the histogram is split by month.
#[derive(Debug, Serialize)]
struct HistogramRow<'a> {
    reference_year: i32,
    kind: &'a str,
    month: &'a str,
    age: u32,
    days: usize,
}

/// Output format (with headers): `year,records_set`
#[derive(Debug, Serialize)]
struct PerYearRow {
    year: i32,
    records_set: usize,
}

fn record_row(entry: &RecordEntry, rank: usize) -> RecordRow {
    RecordRow {
        kind: entry.kind.to_string(),
        day_of_year: entry.day_of_year,
        rank,
        year: entry.year,
        date: format_date(&entry.date),
        temperature: entry.temperature,
    }
}

pub fn write_evolution_csv(evolutions: &[RecordEvolution], path: &Path) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for evolution in evolutions {
        for (rank, entry) in evolution.entries.iter().enumerate() {
            wtr.serialize(record_row(entry, rank))?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Current records as of the reference year, one row per day of year.
pub fn write_record_table_csv(table: &[RecordEntry], path: &Path) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for entry in table {
        wtr.serialize(CurrentRecordRow {
            kind: entry.kind.to_string(),
            day_of_year: entry.day_of_year,
            year: entry.year,
            date: format_date(&entry.date),
            temperature: entry.temperature,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_histogram_csv(
    histogram: &RecordAgeHistogram,
    by_month: bool,
    path: &Path,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let kind = histogram.kind.to_string();
    if by_month {
        for (month, age, days) in histogram.month_rows() {
            wtr.serialize(HistogramRow {
                reference_year: histogram.reference_year,
                kind: &kind,
                month: month.name(),
                age,
                days,
            })?;
        }
    } else {
        for (age, days) in &histogram.by_age {
            wtr.serialize(HistogramRow {
                reference_year: histogram.reference_year,
                kind: &kind,
                month: "",
                age: *age,
                days: *days,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_per_year_csv(per_year: &BTreeMap<i32, usize>, path: &Path) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for (year, records_set) in per_year {
        wtr.serialize(PerYearRow {
            year: *year,
            records_set: *records_set,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Track records of one kind and write every requested table.
pub fn write_records(
    days: &[DailyAggregate],
    kind: RecordKind,
    reference_year: i32,
    output_csv: &Path,
    outputs: &RecordOutputs,
) -> anyhow::Result<()> {
    let tracker = RecordTracker::new(days, kind);
    let evolutions = tracker.evolutions();
    write_evolution_csv(&evolutions, output_csv)?;
    info!(
        "{} record chains ({}) written to {}",
        evolutions.len(),
        kind,
        output_csv.display()
    );

    if let Some(histogram_csv) = &outputs.histogram_csv {
        let histogram = tracker.age_histogram(reference_year);
        write_histogram_csv(&histogram, outputs.by_month, Path::new(histogram_csv))?;
        info!(
            "Record age histogram as of {} ({} days) written to {}",
            reference_year,
            histogram.days(),
            histogram_csv
        );
    }
    if let Some(table_csv) = &outputs.table_csv {
        write_record_table_csv(&tracker.record_table(reference_year), Path::new(table_csv))?;
    }
    if let Some(per_year_csv) = &outputs.per_year_csv {
        write_per_year_csv(&tracker.records_set_per_year(), Path::new(per_year_csv))?;
    }
    Ok(())
}

pub async fn run_records(
    input_dir: &str,
    output_csv: &str,
    kind: RecordKind,
    reference_year: Option<i32>,
    outputs: &RecordOutputs,
) -> anyhow::Result<()> {
    let dataset = load_dataset(input_dir).await?;
    let reference_year = reference_year_or_last(&dataset, reference_year);
    write_records(
        &dataset.daily_aggregates(),
        kind,
        reference_year,
        Path::new(output_csv),
        outputs,
    )
}
