//! Hellmann winter severity index ("Hellmann Wintergetal").
//!
//! A winter runs from day-of-year 305 of one year through day 90 of the
//! next and is named after the year it starts in. The index is the running
//! sum of |mean temperature| over the days whose mean is below zero.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use wxr_isd::DailyAggregate;
use wxr_utils::dates::{day_of_winter, winter_year_for};

/// Severity class for a final winter score.
///
/// Cut points follow the classic table: >300 Strong, >160 Very cold,
/// >100 Cold, 40–100 Normal, <40 Gentle, <20 Very gentle, <10 Extremely
/// gentle. Normal is closed on both ends, so 100 is Normal and 40 is Normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SeverityClass {
    ExtremelyGentle,
    VeryGentle,
    Gentle,
    Normal,
    Cold,
    VeryCold,
    Strong,
}

impl SeverityClass {
    pub fn from_score(score: f64) -> SeverityClass {
        if score > 300.0 {
            SeverityClass::Strong
        } else if score > 160.0 {
            SeverityClass::VeryCold
        } else if score > 100.0 {
            SeverityClass::Cold
        } else if score >= 40.0 {
            SeverityClass::Normal
        } else if score >= 20.0 {
            SeverityClass::Gentle
        } else if score >= 10.0 {
            SeverityClass::VeryGentle
        } else {
            SeverityClass::ExtremelyGentle
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SeverityClass::ExtremelyGentle => "Extremely gentle",
            SeverityClass::VeryGentle => "Very gentle",
            SeverityClass::Gentle => "Gentle",
            SeverityClass::Normal => "Normal",
            SeverityClass::Cold => "Cold",
            SeverityClass::VeryCold => "Very cold",
            SeverityClass::Strong => "Strong",
        }
    }
}

impl fmt::Display for SeverityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One frost day on a winter's severity curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityPoint {
    pub date: NaiveDate,
    /// 0 for day-of-year 305, 62 for January 1st.
    pub day_of_winter: u32,
    pub daily_mean: f64,
    pub cumulative_severity: f64,
}

/// The severity curve of one winter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinterPeriod {
    pub winter_year: i32,
    /// Winter days with a daily mean, frozen or not.
    pub days_observed: usize,
    /// Frost days only, in date order.
    pub points: Vec<SeverityPoint>,
}

impl WinterPeriod {
    /// Final score: the largest cumulative severity, 0 for a winter without frost days.
    pub fn score(&self) -> f64 {
        self.points
            .iter()
            .map(|point| point.cumulative_severity)
            .fold(0.0, f64::max)
    }

    pub fn class(&self) -> SeverityClass {
        SeverityClass::from_score(self.score())
    }
}

/// Accumulator step: a day adds |mean| when its mean is below zero.
fn severity_step(severity: f64, daily_mean: f64) -> f64 {
    if daily_mean < 0.0 {
        severity - daily_mean
    } else {
        severity
    }
}

/// Running severity after each day of a sequence of daily means.
pub fn severity_fold(daily_means: &[f64]) -> Vec<f64> {
    daily_means
        .iter()
        .scan(0.0, |severity, &mean| {
            *severity = severity_step(*severity, mean);
            Some(*severity)
        })
        .collect()
}

/// Build one severity curve per winter present in the data.
///
/// Days outside the winter window or without a daily mean are ignored.
/// A winter that has data but no frost day is returned with an empty curve
/// and a score of 0.
pub fn compute_winter_severity(days: &[DailyAggregate]) -> Vec<WinterPeriod> {
    let mut winters: BTreeMap<i32, Vec<(&DailyAggregate, f64)>> = BTreeMap::new();
    for day in days {
        let Some(mean) = day.daily_mean else {
            continue;
        };
        if let Some(winter_year) = winter_year_for(day.year, day.day_of_year) {
            winters.entry(winter_year).or_default().push((day, mean));
        }
    }

    winters
        .into_iter()
        .map(|(winter_year, mut winter_days)| {
            winter_days.sort_by_key(|(day, _)| day.date);
            let days_observed = winter_days.len();
            let mut severity = 0.0;
            let points = winter_days
                .into_iter()
                .filter(|(_, mean)| *mean < 0.0)
                .filter_map(|(day, mean)| {
                    severity = severity_step(severity, mean);
                    day_of_winter(day.day_of_year).map(|day_of_winter| SeverityPoint {
                        date: day.date,
                        day_of_winter,
                        daily_mean: mean,
                        cumulative_severity: severity,
                    })
                })
                .collect::<Vec<_>>();
            let period = WinterPeriod {
                winter_year,
                days_observed,
                points,
            };
            debug!(
                "Winter {}: {} frost days, score {:.1} ({})",
                winter_year,
                period.points.len(),
                period.score(),
                period.class()
            );
            period
        })
        .collect()
}
