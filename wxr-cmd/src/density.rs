//! Windowed density output.

use crate::load::load_dataset;
use clap::{Args, ValueEnum};
use log::info;
use serde::Serialize;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use wxr_indices::{BandwidthRule, DensityConfig, DensityWindow, WindowedDensityEstimator};
use wxr_isd::Dataset;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BandwidthArg {
    Silverman,
    Scott,
}

impl From<BandwidthArg> for BandwidthRule {
    fn from(value: BandwidthArg) -> Self {
        match value {
            BandwidthArg::Silverman => BandwidthRule::Silverman,
            BandwidthArg::Scott => BandwidthRule::Scott,
        }
    }
}

/// Density estimation settings shared by the `density` and `analyze` commands.
#[derive(Args, Clone, Debug)]
pub struct DensityArgs {
    /// Number of years in each window
    #[arg(long, default_value_t = 10)]
    pub window: u32,

    /// Lowest temperature on the evaluation grid (°C)
    #[arg(long, default_value_t = -20.0, allow_negative_numbers = true)]
    pub grid_min: f64,

    /// Highest temperature on the evaluation grid (°C)
    #[arg(long, default_value_t = 35.0, allow_negative_numbers = true)]
    pub grid_max: f64,

    /// Number of grid points, both ends included
    #[arg(long, default_value_t = 221)]
    pub grid_points: usize,

    /// Bandwidth rule of thumb
    #[arg(long, value_enum, default_value_t = BandwidthArg::Silverman)]
    pub bandwidth: BandwidthArg,
}

impl From<&DensityArgs> for DensityConfig {
    fn from(args: &DensityArgs) -> Self {
        DensityConfig {
            window_years: args.window,
            grid_min: args.grid_min,
            grid_max: args.grid_max,
            grid_points: args.grid_points,
            bandwidth: args.bandwidth.into(),
        }
    }
}

/// JSON document handed to the renderer.
#[derive(Debug, Serialize)]
struct DensityReport<'a> {
    station_id: &'a str,
    config: &'a DensityConfig,
    windows: Vec<DensityWindow>,
}

/// Estimate every window and write them, in order, as one JSON document.
pub fn write_density_json(
    dataset: &Dataset,
    config: &DensityConfig,
    path: &Path,
) -> anyhow::Result<usize> {
    let estimator = WindowedDensityEstimator::new(dataset.observations(), config.clone())?;
    info!(
        "Estimating {} windows of {} years for {}",
        estimator.len(),
        config.window_years,
        dataset.station_id()
    );
    let report = DensityReport {
        station_id: dataset.station_id(),
        config,
        windows: estimator.windows().collect(),
    };
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writer.flush()?;
    Ok(report.windows.len())
}

pub async fn run_density(
    input_dir: &str,
    output_json: &str,
    density: &DensityArgs,
) -> anyhow::Result<()> {
    let config = DensityConfig::from(density);
    config.validate()?;
    let dataset = load_dataset(input_dir).await?;
    let written = write_density_json(&dataset, &config, Path::new(output_json))?;
    info!("{} density windows written to {}", written, output_json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::write_density_json;
    use wxr_indices::DensityConfig;
    use wxr_isd::{ingest, RawObservation};

    #[test]
    fn test_write_density_json() {
        let mut rows = Vec::new();
        for year in 2000..=2006 {
            for (hour, tenths) in [(0, -15), (6, 20), (12, 85), (18, 40)] {
                rows.push(RawObservation {
                    station_id: "062400-99999".to_string(),
                    year,
                    month: 3,
                    day: 1,
                    hour,
                    temperature_tenths: Some(tenths + year - 2000),
                });
            }
        }
        let dataset = ingest(rows).unwrap();
        let config = DensityConfig {
            window_years: 3,
            grid_points: 56,
            ..DensityConfig::default()
        };
        let dir = std::env::temp_dir().join(format!("wxr-cmd-density-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("density.json");

        let written = write_density_json(&dataset, &config, &path).unwrap();
        assert_eq!(written, 3);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["station_id"], "062400-99999");
        assert_eq!(json["config"]["window_years"], 3);
        let windows = json["windows"].as_array().unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0]["start_year"], 2001);
        assert_eq!(windows[0]["end_year"], 2003);
        assert_eq!(windows[0]["sample_size"], 12);
        assert_eq!(windows[0]["curve"].as_array().unwrap().len(), 56);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
