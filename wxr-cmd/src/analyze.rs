//! Run every index over one snapshot.
//!
//! The dataset is loaded once and shared read-only; winter severity, both
//! record passes and the density windows run side by side on the blocking
//! pool and each writes its own files.

use crate::{
    density::{write_density_json, DensityArgs},
    load::{load_dataset, reference_year_or_last},
    records::{write_records, RecordOutputs},
    winter::{write_winter_csv, write_winter_summary_csv},
};
use log::info;
use std::{path::PathBuf, sync::Arc};
use tokio::task::JoinSet;
use wxr_indices::{compute_winter_severity, DensityConfig, RecordKind};

pub async fn run_analyze(
    input_dir: &str,
    output_dir: &str,
    reference_year: Option<i32>,
    density: &DensityArgs,
) -> anyhow::Result<()> {
    let config = DensityConfig::from(density);
    config.validate()?;
    let out = PathBuf::from(output_dir);
    tokio::fs::create_dir_all(&out).await?;

    let dataset = load_dataset(input_dir).await?;
    let days = Arc::new(dataset.daily_aggregates());
    let reference_year = reference_year_or_last(&dataset, reference_year);

    let mut tasks: JoinSet<anyhow::Result<()>> = JoinSet::new();
    {
        let days = Arc::clone(&days);
        let out = out.clone();
        tasks.spawn_blocking(move || {
            let periods = compute_winter_severity(&days);
            write_winter_csv(&periods, &out.join("winter.csv"))?;
            write_winter_summary_csv(&periods, &out.join("winter_summary.csv"))
        });
    }
    for kind in [RecordKind::High, RecordKind::Low] {
        let days = Arc::clone(&days);
        let out = out.clone();
        tasks.spawn_blocking(move || {
            let outputs = RecordOutputs {
                histogram_csv: Some(path_string(&out, &format!("record_{}_ages.csv", kind))),
                by_month: true,
                table_csv: Some(path_string(&out, &format!("record_{}_table.csv", kind))),
                per_year_csv: Some(path_string(&out, &format!("record_{}_per_year.csv", kind))),
            };
            let output_csv = out.join(format!("record_{}.csv", kind));
            write_records(&days, kind, reference_year, &output_csv, &outputs)
        });
    }
    {
        let dataset = Arc::clone(&dataset);
        let out = out.clone();
        tasks.spawn_blocking(move || {
            write_density_json(&dataset, &config, &out.join("density.json")).map(|_| ())
        });
    }

    while let Some(result) = tasks.join_next().await {
        result??;
    }
    info!("Analysis for {} written to {}", dataset.station_id(), output_dir);
    Ok(())
}

fn path_string(dir: &std::path::Path, file_name: &str) -> String {
    dir.join(file_name).display().to_string()
}
