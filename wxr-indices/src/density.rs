//! Kernel density estimates of hourly temperature over a sliding window of
//! years.
//!
//! The first and last year of the record are left out (they are usually
//! partial), then a window of `window_years` slides forward one year at a
//! time. Each position yields one [`DensityWindow`]; what to overlay and
//! how is up to whoever draws them.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use wxr_isd::Observation;

/// Errors in the density configuration.
#[derive(Error, Debug, PartialEq)]
pub enum DensityError {
    #[error("Window size must be between 1 and {} years", i32::MAX)]
    InvalidWindow,

    #[error("Invalid grid: [{min}, {max}] with {points} points")]
    InvalidGrid { min: f64, max: f64, points: usize },
}

/// Rule of thumb used to pick the Gaussian kernel bandwidth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandwidthRule {
    /// `0.9 * min(sd, IQR / 1.34) * n^(-1/5)`
    #[default]
    Silverman,
    /// `1.06 * sd * n^(-1/5)`
    Scott,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityConfig {
    pub window_years: u32,
    pub grid_min: f64,
    pub grid_max: f64,
    pub grid_points: usize,
    pub bandwidth: BandwidthRule,
}

impl Default for DensityConfig {
    fn default() -> Self {
        DensityConfig {
            window_years: 10,
            grid_min: -20.0,
            grid_max: 35.0,
            grid_points: 221,
            bandwidth: BandwidthRule::Silverman,
        }
    }
}

impl DensityConfig {
    pub fn validate(&self) -> Result<(), DensityError> {
        self.window_span()?;
        let finite = self.grid_min.is_finite() && self.grid_max.is_finite();
        if !finite || self.grid_min >= self.grid_max || self.grid_points < 2 {
            return Err(DensityError::InvalidGrid {
                min: self.grid_min,
                max: self.grid_max,
                points: self.grid_points,
            });
        }
        Ok(())
    }

    /// Window size as a year offset.
    fn window_span(&self) -> Result<i32, DensityError> {
        match i32::try_from(self.window_years) {
            Ok(span) if span > 0 => Ok(span),
            _ => Err(DensityError::InvalidWindow),
        }
    }

    /// Evenly spaced evaluation points, both ends included.
    pub fn grid(&self) -> Vec<f64> {
        let step = (self.grid_max - self.grid_min) / (self.grid_points - 1) as f64;
        (0..self.grid_points)
            .map(|i| self.grid_min + step * i as f64)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityPoint {
    pub temperature: f64,
    pub density: f64,
}

/// Density estimate for the years `start_year..=end_year`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityWindow {
    pub start_year: i32,
    pub end_year: i32,
    /// Valid hourly readings in the window.
    pub sample_size: usize,
    pub bandwidth: Option<f64>,
    /// None when the window holds fewer than two readings.
    pub curve: Option<Vec<DensityPoint>>,
}

/// Temperatures per year, ready to be windowed.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedDensityEstimator {
    config: DensityConfig,
    window_span: i32,
    grid: Vec<f64>,
    samples: BTreeMap<i32, Vec<f64>>,
    first_position: i32,
    last_position: i32,
}

impl WindowedDensityEstimator {
    pub fn new(
        observations: &[Observation],
        config: DensityConfig,
    ) -> Result<WindowedDensityEstimator, DensityError> {
        config.validate()?;
        let window_span = config.window_span()?;
        let mut samples: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
        let mut span: Option<(i32, i32)> = None;
        for observation in observations {
            let year = observation.year();
            span = Some(span.map_or((year, year), |(min, max)| (min.min(year), max.max(year))));
            if let Some(temperature) = observation.temperature {
                samples.entry(year).or_default().push(temperature);
            }
        }

        // empty data gives an empty range of positions
        let (first_position, last_position) = match span {
            Some((min_year, max_year)) => {
                let start_year = min_year + 1;
                let final_year = max_year - 1;
                (start_year, final_year - window_span + 1)
            }
            None => (1, 0),
        };
        Ok(WindowedDensityEstimator {
            grid: config.grid(),
            config,
            window_span,
            samples,
            first_position,
            last_position,
        })
    }

    pub fn config(&self) -> &DensityConfig {
        &self.config
    }

    /// Number of slide positions.
    pub fn len(&self) -> usize {
        (self.last_position - self.first_position + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the windows in order. The iterator is `Clone`, and calling
    /// this again starts over from the first position.
    pub fn windows(&self) -> DensityWindows<'_> {
        DensityWindows {
            estimator: self,
            position: self.first_position,
        }
    }

    /// Estimate the window starting at `start_year`.
    pub fn window_at(&self, start_year: i32) -> DensityWindow {
        let end_year = start_year.saturating_add(self.window_span - 1);
        let mut sample: Vec<f64> = self
            .samples
            .range(start_year..=end_year)
            .flat_map(|(_, temperatures)| temperatures.iter().copied())
            .collect();
        sample.sort_by(f64::total_cmp);

        let sample_size = sample.len();
        if sample_size < 2 {
            debug!(
                "Window {}-{}: {} readings, no estimate",
                start_year, end_year, sample_size
            );
            return DensityWindow {
                start_year,
                end_year,
                sample_size,
                bandwidth: None,
                curve: None,
            };
        }

        let bandwidth = bandwidth(&sample, self.config.bandwidth);
        let centres = pool(&sample);
        let curve = self
            .grid
            .iter()
            .map(|&temperature| DensityPoint {
                temperature,
                density: gaussian_kde(&centres, sample_size, bandwidth, temperature),
            })
            .collect();
        DensityWindow {
            start_year,
            end_year,
            sample_size,
            bandwidth: Some(bandwidth),
            curve: Some(curve),
        }
    }
}

/// Ordered, finite iterator over the slide positions of an estimator.
#[derive(Debug, Clone)]
pub struct DensityWindows<'a> {
    estimator: &'a WindowedDensityEstimator,
    position: i32,
}

impl Iterator for DensityWindows<'_> {
    type Item = DensityWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position > self.estimator.last_position {
            return None;
        }
        let window = self.estimator.window_at(self.position);
        self.position += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.estimator.last_position - self.position + 1).max(0) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DensityWindows<'_> {}

/// All windows for the observations, in slide order.
pub fn compute_windowed_density(
    observations: &[Observation],
    config: &DensityConfig,
) -> Result<Vec<DensityWindow>, DensityError> {
    let estimator = WindowedDensityEstimator::new(observations, config.clone())?;
    info!(
        "Estimating {} density windows of {} years",
        estimator.len(),
        config.window_years
    );
    Ok(estimator.windows().collect())
}

/// Collapse a sorted sample into `(value, count)` kernel centres.
fn pool(sorted: &[f64]) -> Vec<(f64, usize)> {
    let mut centres: Vec<(f64, usize)> = Vec::new();
    for &value in sorted {
        if let Some((centre, count)) = centres.last_mut() {
            if *centre == value {
                *count += 1;
                continue;
            }
        }
        centres.push((value, 1));
    }
    centres
}

fn gaussian_kde(centres: &[(f64, usize)], n: usize, bandwidth: f64, x: f64) -> f64 {
    let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * bandwidth * n as f64);
    let sum: f64 = centres
        .iter()
        .map(|&(centre, count)| {
            let u = (x - centre) / bandwidth;
            count as f64 * (-0.5 * u * u).exp()
        })
        .sum();
    norm * sum
}

/// Kernel bandwidth for a sorted sample of at least two values.
fn bandwidth(sorted: &[f64], rule: BandwidthRule) -> f64 {
    let n = sorted.len() as f64;
    let sd = standard_deviation(sorted);
    let scale = match rule {
        BandwidthRule::Silverman => {
            let iqr = quantile_type7(sorted, 0.75) - quantile_type7(sorted, 0.25);
            let spread = iqr / 1.34;
            0.9 * if sd > 0.0 && spread > 0.0 {
                sd.min(spread)
            } else {
                sd.max(spread)
            }
        }
        BandwidthRule::Scott => 1.06 * sd,
    };
    // a constant sample has no spread; fall back to a unit scale
    let scale = if scale > 0.0 { scale } else { 1.0 };
    scale * n.powf(-0.2)
}

/// Sample standard deviation with N-1 denominator.
fn standard_deviation(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Linear interpolation between order statistics (R type 7). Expects sorted input.
fn quantile_type7(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - h.floor()) * (sorted[hi] - sorted[lo])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn observation(year: i32, ordinal: u32, hour: u32, temperature: Option<f64>) -> Observation {
        let date = NaiveDate::from_yo_opt(year, ordinal).unwrap();
        Observation {
            timestamp: date.and_hms_opt(hour, 0, 0).unwrap(),
            temperature,
            calendar: date.into(),
        }
    }

    fn yearly_observations(first: i32, last: i32) -> Vec<Observation> {
        let mut observations = Vec::new();
        for year in first..=last {
            for (i, ordinal) in [15, 120, 200, 330].into_iter().enumerate() {
                let temperature = (year % 7) as f64 + 5.0 * i as f64 - 4.0;
                observations.push(observation(year, ordinal, 12, Some(temperature)));
            }
        }
        observations
    }

    #[test]
    fn test_window_count_and_spans() {
        let observations = yearly_observations(1956, 2015);
        let config = DensityConfig::default();
        let windows = compute_windowed_density(&observations, &config).unwrap();
        let expected = ((2015 - 1 - 10 + 1) - (1956 + 1) + 1) as usize;
        assert_eq!(windows.len(), expected);
        assert_eq!(windows.len(), 49);
        assert_eq!(windows[0].start_year, 1957);
        assert_eq!(windows.last().unwrap().end_year, 2014);
        for pair in windows.windows(2) {
            assert_eq!(pair[1].start_year, pair[0].start_year + 1);
        }
        for window in &windows {
            assert_eq!(window.end_year - window.start_year + 1, 10);
            assert_eq!(window.sample_size, 40);
            let curve = window.curve.as_ref().unwrap();
            assert_eq!(curve.len(), 221);
            assert!(curve.iter().all(|p| p.density.is_finite() && p.density >= 0.0));
        }
    }

    #[test]
    fn test_span_too_short_gives_no_windows() {
        let observations = yearly_observations(2000, 2008);
        let estimator =
            WindowedDensityEstimator::new(&observations, DensityConfig::default()).unwrap();
        assert!(estimator.is_empty());
        assert_eq!(estimator.windows().count(), 0);

        let estimator = WindowedDensityEstimator::new(&[], DensityConfig::default()).unwrap();
        assert!(estimator.is_empty());
    }

    #[test]
    fn test_windows_are_restartable() {
        let observations = yearly_observations(1990, 2005);
        let config = DensityConfig {
            window_years: 5,
            ..DensityConfig::default()
        };
        let estimator = WindowedDensityEstimator::new(&observations, config).unwrap();
        let mut windows = estimator.windows();
        assert_eq!(windows.len(), 10);
        let _ = windows.next();
        let replay = windows.clone();
        assert_eq!(windows.collect::<Vec<_>>(), replay.collect::<Vec<_>>());
        assert_eq!(
            estimator.windows().collect::<Vec<_>>(),
            estimator.windows().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_density_integrates_to_one() {
        let observations = yearly_observations(1980, 1992);
        let config = DensityConfig {
            window_years: 3,
            grid_min: -80.0,
            grid_max: 80.0,
            grid_points: 1601,
            bandwidth: BandwidthRule::Scott,
        };
        let windows = compute_windowed_density(&observations, &config).unwrap();
        for window in windows {
            let curve = window.curve.unwrap();
            let area: f64 = curve
                .windows(2)
                .map(|pair| {
                    (pair[1].temperature - pair[0].temperature)
                        * (pair[0].density + pair[1].density)
                        / 2.0
                })
                .sum();
            assert!((area - 1.0).abs() < 1e-3, "area {area}");
        }
    }

    #[test]
    fn test_missing_readings_leave_a_gap() {
        let mut observations = Vec::new();
        for year in 1970..=1975 {
            observations.push(observation(year, 10, 0, None));
        }
        observations.push(observation(1972, 11, 0, Some(3.0)));
        let config = DensityConfig {
            window_years: 2,
            ..DensityConfig::default()
        };
        let windows = compute_windowed_density(&observations, &config).unwrap();
        assert_eq!(windows.len(), 3);
        assert!(windows.iter().all(|w| w.curve.is_none() && w.bandwidth.is_none()));
        assert_eq!(windows[0].sample_size, 1);
        assert_eq!(windows[2].sample_size, 0);
    }

    #[test]
    fn test_pooled_centres_match_one_kernel_per_reading() {
        let sample = vec![-1.5, 0.0, 0.0, 0.0, 2.5, 2.5, 7.0];
        let h = bandwidth(&sample, BandwidthRule::Silverman);
        let centres = pool(&sample);
        assert_eq!(centres, vec![(-1.5, 1), (0.0, 3), (2.5, 2), (7.0, 1)]);
        for x in [-3.0, 0.0, 1.2, 6.0] {
            let direct: f64 = sample
                .iter()
                .map(|c| {
                    let u = (x - c) / h;
                    (-0.5 * u * u).exp() / (2.0 * std::f64::consts::PI).sqrt()
                })
                .sum::<f64>()
                / (sample.len() as f64 * h);
            let pooled = gaussian_kde(&centres, sample.len(), h, x);
            assert!((direct - pooled).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bandwidth_rules() {
        let sample = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sd = 2.5f64.sqrt();
        let spread = 2.0 / 1.34;
        let silverman = 0.9 * sd.min(spread) * 5f64.powf(-0.2);
        let scott = 1.06 * sd * 5f64.powf(-0.2);
        assert!((bandwidth(&sample, BandwidthRule::Silverman) - silverman).abs() < 1e-12);
        assert!((bandwidth(&sample, BandwidthRule::Scott) - scott).abs() < 1e-12);
        // constant sample
        assert!((bandwidth(&[4.0, 4.0, 4.0], BandwidthRule::Silverman) - 3f64.powf(-0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_config() {
        let config = DensityConfig {
            window_years: 0,
            ..DensityConfig::default()
        };
        assert_eq!(config.validate(), Err(DensityError::InvalidWindow));
        let config = DensityConfig {
            window_years: 3_000_000_000,
            ..DensityConfig::default()
        };
        assert_eq!(config.validate(), Err(DensityError::InvalidWindow));
        let observations = yearly_observations(1990, 2000);
        assert_eq!(
            WindowedDensityEstimator::new(&observations, config),
            Err(DensityError::InvalidWindow)
        );
        let config = DensityConfig {
            window_years: i32::MAX as u32,
            ..DensityConfig::default()
        };
        let estimator = WindowedDensityEstimator::new(&observations, config).unwrap();
        assert!(estimator.is_empty());
        assert_eq!(estimator.window_at(1991).sample_size, 40);
        let config = DensityConfig {
            grid_min: 10.0,
            grid_max: -10.0,
            ..DensityConfig::default()
        };
        assert!(matches!(
            compute_windowed_density(&[], &config),
            Err(DensityError::InvalidGrid { .. })
        ));
    }

    #[test]
    fn test_default_grid() {
        let grid = DensityConfig::default().grid();
        assert_eq!(grid.len(), 221);
        assert_eq!(grid[0], -20.0);
        assert!((grid[220] - 35.0).abs() < 1e-12);
        assert!((grid[1] - grid[0] - 0.25).abs() < 1e-12);
    }
}
