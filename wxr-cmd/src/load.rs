//! Loading a station's yearly files into an ingested dataset.

use anyhow::Context;
use log::info;
use std::{path::PathBuf, sync::Arc};
use wxr_isd::{ingest, read_isd_lite_dir, Dataset};

/// Read every ISD-Lite file in `input_dir` and ingest them as one station.
///
/// File reading and validation run on the blocking pool; any malformed row
/// or duplicate hour fails the whole load.
pub async fn load_dataset(input_dir: &str) -> anyhow::Result<Arc<Dataset>> {
    let dir = PathBuf::from(input_dir);
    let dataset = tokio::task::spawn_blocking(move || -> anyhow::Result<Dataset> {
        let raw = read_isd_lite_dir(&dir)?;
        Ok(ingest(raw)?)
    })
    .await?
    .with_context(|| format!("Failed to load observations from {}", input_dir))?;

    let (first_year, last_year) = dataset.year_span();
    info!(
        "Station {}: {} observations, {} to {}",
        dataset.station_id(),
        dataset.observations().len(),
        first_year,
        last_year
    );
    Ok(Arc::new(dataset))
}

/// The reference year to age records against: the requested one, or the
/// last year in the data.
pub fn reference_year_or_last(dataset: &Dataset, reference_year: Option<i32>) -> i32 {
    reference_year.unwrap_or_else(|| dataset.year_span().1)
}
