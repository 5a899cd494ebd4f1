//! Winter severity tables.

use crate::load::load_dataset;
use log::info;
use serde::Serialize;
use std::path::Path;
use wxr_indices::{compute_winter_severity, WinterPeriod};
use wxr_utils::dates::format_date;

/// One frost day on a winter curve. Output format (with headers):
/// `winter_year,date,day_of_winter,daily_mean,cumulative_severity`
#[derive(Debug, Serialize)]
struct WinterRow {
    winter_year: i32,
    date: String,
    day_of_winter: u32,
    daily_mean: f64,
    cumulative_severity: f64,
}

/// Output format (with headers):
/// `winter_year,days_observed,frost_days,score,class`
#[derive(Debug, Serialize)]
struct WinterSummaryRow {
    winter_year: i32,
    days_observed: usize,
    frost_days: usize,
    score: f64,
    class: &'static str,
}

pub fn write_winter_csv(periods: &[WinterPeriod], path: &Path) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for period in periods {
        for point in &period.points {
            wtr.serialize(WinterRow {
                winter_year: period.winter_year,
                date: format_date(&point.date),
                day_of_winter: point.day_of_winter,
                daily_mean: point.daily_mean,
                cumulative_severity: point.cumulative_severity,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_winter_summary_csv(periods: &[WinterPeriod], path: &Path) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for period in periods {
        wtr.serialize(WinterSummaryRow {
            winter_year: period.winter_year,
            days_observed: period.days_observed,
            frost_days: period.points.len(),
            score: period.score(),
            class: period.class().label(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Compute the severity curves for a station and write them out.
pub async fn run_winter(
    input_dir: &str,
    output_csv: &str,
    summary_csv: Option<&str>,
) -> anyhow::Result<()> {
    let dataset = load_dataset(input_dir).await?;
    let periods = compute_winter_severity(&dataset.daily_aggregates());
    write_winter_csv(&periods, Path::new(output_csv))?;
    if let Some(summary_csv) = summary_csv {
        write_winter_summary_csv(&periods, Path::new(summary_csv))?;
        info!("Winter summary written to {}", summary_csv);
    }
    info!("{} winters written to {}", periods.len(), output_csv);
    Ok(())
}
