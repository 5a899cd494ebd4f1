//! Per calendar day temperature records.
//!
//! Days are grouped by day-of-year, so day 366 only ever holds leap-year
//! data and is never merged with day 365. Within a group the years are
//! scanned in ascending order and only strict improvements become records,
//! which makes the earliest year win every tie.

use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use wxr_isd::{DailyAggregate, Month, MONTHS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    High,
    Low,
}

impl RecordKind {
    /// The daily value this kind of record is kept for.
    fn value(self, day: &DailyAggregate) -> Option<f64> {
        match self {
            RecordKind::High => day.daily_high,
            RecordKind::Low => day.daily_low,
        }
    }

    /// Strictly better: greater for High, less for Low.
    pub fn improves(self, candidate: f64, current: f64) -> bool {
        match self {
            RecordKind::High => candidate > current,
            RecordKind::Low => candidate < current,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::High => f.write_str("high"),
            RecordKind::Low => f.write_str("low"),
        }
    }
}

/// A record set on a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordEntry {
    pub day_of_year: u32,
    pub year: i32,
    /// The actual date the record was set on.
    pub date: NaiveDate,
    pub temperature: f64,
    pub kind: RecordKind,
}

/// The chain of records for one day-of-year, oldest first. Every entry
/// strictly beats the one before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordEvolution {
    pub day_of_year: u32,
    pub kind: RecordKind,
    pub entries: Vec<RecordEntry>,
}

/// Number of days per record age, as of a reference year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordAgeHistogram {
    pub reference_year: i32,
    pub kind: RecordKind,
    pub by_age: BTreeMap<u32, usize>,
    /// Same counts split by the month the record was set in.
    pub by_month: BTreeMap<Month, BTreeMap<u32, usize>>,
}

impl RecordAgeHistogram {
    /// Total number of days counted.
    pub fn days(&self) -> usize {
        self.by_age.values().sum()
    }

    /// `(month, age, count)` rows in month display order, then age.
    pub fn month_rows(&self) -> Vec<(Month, u32, usize)> {
        MONTHS
            .iter()
            .filter_map(|month| self.by_month.get(month).map(|ages| (*month, ages)))
            .flat_map(|(month, ages)| ages.iter().map(move |(age, count)| (month, *age, *count)))
            .collect()
    }
}

/// Record chains for every day-of-year with data, for one kind of record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTracker {
    kind: RecordKind,
    evolutions: BTreeMap<u32, Vec<RecordEntry>>,
}

impl RecordTracker {
    pub fn new(days: &[DailyAggregate], kind: RecordKind) -> RecordTracker {
        let mut groups: BTreeMap<u32, Vec<RecordEntry>> = BTreeMap::new();
        for day in days {
            if let Some(temperature) = kind.value(day) {
                groups.entry(day.day_of_year).or_default().push(RecordEntry {
                    day_of_year: day.day_of_year,
                    year: day.year,
                    date: day.date,
                    temperature,
                    kind,
                });
            }
        }

        let evolutions = groups
            .into_iter()
            .map(|(day_of_year, mut candidates)| {
                candidates.sort_by_key(|entry| entry.year);
                let mut entries: Vec<RecordEntry> = Vec::new();
                for candidate in candidates {
                    let is_record = entries
                        .last()
                        .map_or(true, |best| kind.improves(candidate.temperature, best.temperature));
                    if is_record {
                        entries.push(candidate);
                    }
                }
                (day_of_year, entries)
            })
            .collect::<BTreeMap<_, _>>();
        debug!(
            "Tracked {} records over {} days of year",
            kind,
            evolutions.len()
        );
        RecordTracker { kind, evolutions }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Days of year that have at least one valid value.
    pub fn days_of_year(&self) -> impl Iterator<Item = u32> + '_ {
        self.evolutions.keys().copied()
    }

    pub fn evolution(&self, day_of_year: u32) -> Option<RecordEvolution> {
        self.evolutions
            .get(&day_of_year)
            .map(|entries| RecordEvolution {
                day_of_year,
                kind: self.kind,
                entries: entries.clone(),
            })
    }

    /// Record chains for all days of year, in day-of-year order.
    pub fn evolutions(&self) -> Vec<RecordEvolution> {
        self.days_of_year()
            .filter_map(|day_of_year| self.evolution(day_of_year))
            .collect()
    }

    /// The record in force for a day-of-year as of `year`, i.e. the best
    /// value seen in any year up to and including it.
    pub fn current_record(&self, day_of_year: u32, year: i32) -> Option<&RecordEntry> {
        self.evolutions
            .get(&day_of_year)?
            .iter()
            .take_while(|entry| entry.year <= year)
            .last()
    }

    /// Years since the current record was set, as of `reference_year`.
    /// None when the day has no data up to that year.
    pub fn record_age(&self, day_of_year: u32, reference_year: i32) -> Option<u32> {
        self.current_record(day_of_year, reference_year)
            .map(|record| (reference_year - record.year).unsigned_abs())
    }

    /// Current record for every day of year as of `reference_year`.
    pub fn record_table(&self, reference_year: i32) -> Vec<RecordEntry> {
        self.days_of_year()
            .filter_map(|day_of_year| self.current_record(day_of_year, reference_year))
            .cloned()
            .collect()
    }

    pub fn age_histogram(&self, reference_year: i32) -> RecordAgeHistogram {
        let mut by_age: BTreeMap<u32, usize> = BTreeMap::new();
        let mut by_month: BTreeMap<Month, BTreeMap<u32, usize>> = BTreeMap::new();
        for record in self.record_table(reference_year) {
            let age = (reference_year - record.year).unsigned_abs();
            *by_age.entry(age).or_default() += 1;
            let month = MONTHS[record.date.month0() as usize];
            *by_month.entry(month).or_default().entry(age).or_default() += 1;
        }
        RecordAgeHistogram {
            reference_year,
            kind: self.kind,
            by_age,
            by_month,
        }
    }

    /// How many records were broken in each year. A day's first entry is
    /// only the first year with data and does not count.
    pub fn records_set_per_year(&self) -> BTreeMap<i32, usize> {
        let mut per_year: BTreeMap<i32, usize> = BTreeMap::new();
        for entries in self.evolutions.values() {
            for entry in entries.iter().skip(1) {
                *per_year.entry(entry.year).or_default() += 1;
            }
        }
        per_year
    }
}

/// Record chains for every day of year plus the record age histogram as of
/// `reference_year`.
pub fn compute_record_tracking(
    days: &[DailyAggregate],
    kind: RecordKind,
    reference_year: i32,
) -> (Vec<RecordEvolution>, RecordAgeHistogram) {
    let tracker = RecordTracker::new(days, kind);
    (tracker.evolutions(), tracker.age_histogram(reference_year))
}

#[cfg(test)]
mod tests {
    use super::{compute_record_tracking, RecordKind, RecordTracker};
    use chrono::{Datelike, NaiveDate};
    use wxr_isd::{DailyAggregate, Month, MONTHS};

    fn day(year: i32, month: u32, day: u32, high: Option<f64>, low: Option<f64>) -> DailyAggregate {
        aggregate(NaiveDate::from_ymd_opt(year, month, day).unwrap(), high, low)
    }

    fn on_ordinal(year: i32, ordinal: u32, high: Option<f64>, low: Option<f64>) -> DailyAggregate {
        aggregate(NaiveDate::from_yo_opt(year, ordinal).unwrap(), high, low)
    }

    fn aggregate(date: NaiveDate, high: Option<f64>, low: Option<f64>) -> DailyAggregate {
        DailyAggregate {
            date,
            day_of_year: date.ordinal(),
            year: date.year(),
            month: MONTHS[date.month0() as usize],
            daily_high: high,
            daily_low: low,
            daily_mean: None,
            readings: 0,
        }
    }

    /// One value per year, all on day of year 182.
    fn one_day_of_year(series: &[(i32, f64)]) -> Vec<DailyAggregate> {
        series
            .iter()
            .map(|(year, value)| on_ordinal(*year, 182, Some(*value), Some(*value)))
            .collect()
    }

    #[test]
    fn test_high_evolution_is_strictly_increasing() {
        let days = one_day_of_year(&[
            (1960, 24.0),
            (1961, 22.0),
            (1962, 24.0),
            (1963, 27.5),
            (1964, 27.5),
            (1965, 26.0),
            (1966, 31.2),
        ]);
        let tracker = RecordTracker::new(&days, RecordKind::High);
        let day_of_year = days[0].day_of_year;
        let evolution = tracker.evolution(day_of_year).unwrap();
        let years: Vec<i32> = evolution.entries.iter().map(|e| e.year).collect();
        assert_eq!(years, vec![1960, 1963, 1966]);
        assert!(evolution
            .entries
            .windows(2)
            .all(|pair| pair[0].temperature < pair[1].temperature && pair[0].year < pair[1].year));
    }

    #[test]
    fn test_low_evolution_is_strictly_decreasing() {
        let days = one_day_of_year(&[(1960, 12.0), (1961, 9.0), (1962, 9.0), (1963, 10.0), (1964, 7.5)]);
        let tracker = RecordTracker::new(&days, RecordKind::Low);
        let evolution = tracker.evolution(days[0].day_of_year).unwrap();
        let chain: Vec<(i32, f64)> = evolution
            .entries
            .iter()
            .map(|e| (e.year, e.temperature))
            .collect();
        assert_eq!(chain, vec![(1960, 12.0), (1961, 9.0), (1964, 7.5)]);
        assert!(evolution.entries.iter().all(|e| e.kind == RecordKind::Low));
    }

    #[test]
    fn test_unsorted_input_and_missing_values() {
        let mut days = one_day_of_year(&[(1975, 30.0), (1971, 28.0), (1973, 29.0)]);
        days.push(on_ordinal(1972, 182, None, None));
        let tracker = RecordTracker::new(&days, RecordKind::High);
        let evolution = tracker.evolution(days[0].day_of_year).unwrap();
        let years: Vec<i32> = evolution.entries.iter().map(|e| e.year).collect();
        assert_eq!(years, vec![1971, 1973, 1975]);
    }

    #[test]
    fn test_current_record_and_age_ties_go_to_earliest_year() {
        let days = one_day_of_year(&[(1980, 25.0), (1985, 29.0), (1990, 29.0), (1995, 28.0)]);
        let tracker = RecordTracker::new(&days, RecordKind::High);
        let d = days[0].day_of_year;

        assert_eq!(tracker.current_record(d, 1979), None);
        assert_eq!(tracker.record_age(d, 1979), None);
        assert_eq!(tracker.current_record(d, 1984).unwrap().year, 1980);
        assert_eq!(tracker.record_age(d, 1984), Some(4));
        // the record resets to age 0 the year it is broken
        assert_eq!(tracker.record_age(d, 1985), Some(0));
        // 1990 only ties 1985
        assert_eq!(tracker.current_record(d, 2000).unwrap().year, 1985);
        assert_eq!(tracker.record_age(d, 2000), Some(15));
    }

    #[test]
    fn test_day_366_only_from_leap_years() {
        let days = vec![
            day(1987, 12, 31, Some(5.0), Some(1.0)),
            day(1988, 12, 31, Some(4.0), Some(-2.0)),
            day(1989, 12, 31, Some(9.0), Some(2.0)),
        ];
        let tracker = RecordTracker::new(&days, RecordKind::High);
        let evolution_366 = tracker.evolution(366).unwrap();
        assert!(evolution_366.entries.iter().all(|e| e.year == 1988));
        let evolution_365 = tracker.evolution(365).unwrap();
        let years: Vec<i32> = evolution_365.entries.iter().map(|e| e.year).collect();
        assert_eq!(years, vec![1987, 1989]);
        assert_eq!(tracker.days_of_year().collect::<Vec<_>>(), vec![365, 366]);
    }

    #[test]
    fn test_groups_follow_day_of_year_not_calendar_date() {
        // July 1 of a leap year and July 2 of a common year are both day 183
        let days = vec![
            day(1991, 7, 1, Some(20.0), None),
            day(1991, 7, 2, Some(21.0), None),
            day(1992, 7, 1, Some(24.0), None),
            day(1993, 7, 2, Some(23.0), None),
        ];
        let tracker = RecordTracker::new(&days, RecordKind::High);
        assert_eq!(tracker.days_of_year().collect::<Vec<_>>(), vec![182, 183]);

        let evolution = tracker.evolution(183).unwrap();
        let dates: Vec<NaiveDate> = evolution.entries.iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(1991, 7, 2).unwrap(),
                NaiveDate::from_ymd_opt(1992, 7, 1).unwrap(),
            ]
        );
        assert_eq!(tracker.current_record(183, 1993).unwrap().temperature, 24.0);

        let evolution = tracker.evolution(182).unwrap();
        assert_eq!(evolution.entries.len(), 1);
        assert_eq!(evolution.entries[0].year, 1991);
    }

    #[test]
    fn test_age_histogram() {
        let days = vec![
            day(2001, 1, 10, Some(10.0), None),
            day(2011, 1, 10, Some(12.0), None),
            day(2001, 6, 5, Some(20.0), None),
            day(2011, 6, 5, Some(18.0), None),
            day(2001, 6, 6, Some(20.0), None),
            // no data up to the reference year: skipped
            day(2017, 6, 7, Some(20.0), None),
        ];
        let (evolutions, histogram) = compute_record_tracking(&days, RecordKind::High, 2016);
        assert_eq!(evolutions.len(), 4);
        assert_eq!(histogram.reference_year, 2016);
        assert_eq!(histogram.days(), 3);
        assert_eq!(histogram.by_age.get(&5), Some(&1));
        assert_eq!(histogram.by_age.get(&15), Some(&2));
        assert_eq!(
            histogram.month_rows(),
            vec![(Month::January, 5, 1), (Month::June, 15, 2)]
        );
    }

    #[test]
    fn test_records_set_per_year() {
        let mut days = one_day_of_year(&[(1990, 20.0), (1991, 21.0), (1992, 22.0)]);
        days.push(on_ordinal(1990, 183, Some(25.0), None));
        days.push(on_ordinal(1992, 183, Some(26.0), None));
        let tracker = RecordTracker::new(&days, RecordKind::High);
        let per_year = tracker.records_set_per_year();
        assert_eq!(per_year.get(&1990), None);
        assert_eq!(per_year.get(&1991), Some(&1));
        assert_eq!(per_year.get(&1992), Some(&2));
    }

    #[test]
    fn test_record_table() {
        let days = vec![
            day(2001, 3, 1, None, Some(-4.0)),
            day(2002, 3, 1, None, Some(-6.0)),
            day(2003, 3, 2, None, Some(-1.0)),
        ];
        let tracker = RecordTracker::new(&days, RecordKind::Low);
        let table = tracker.record_table(2002);
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].temperature, -6.0);
        let table = tracker.record_table(2003);
        assert_eq!(table.len(), 2);
    }
}
