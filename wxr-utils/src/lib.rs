//! Shared utility functions for WXR crates.

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate};

    /// First day-of-year that belongs to a winter period (Nov 1 in a common year).
    pub const WINTER_START_ORDINAL: u32 = 305;

    /// Last day-of-year of the autumn half of a winter period.
    pub const WINTER_AUTUMN_END_ORDINAL: u32 = 365;

    /// Last day-of-year of the spring half of a winter period (Mar 31 in a common year).
    pub const WINTER_END_ORDINAL: u32 = 90;

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Decade a year falls in, e.g. 1987 -> 1980. Floors towards negative infinity.
    pub fn decade(year: i32) -> i32 {
        year.div_euclid(10) * 10
    }

    /// Whether a day-of-year lies inside the winter window:
    /// `[305, 365]` of one year or `[1, 90]` of the next.
    ///
    /// The window is defined on ordinals, not on month/day, so in leap years
    /// it starts on Oct 31, ends on Mar 30 and leaves out Dec 31 (day 366).
    pub fn is_winter_ordinal(ordinal: u32) -> bool {
        (WINTER_START_ORDINAL..=WINTER_AUTUMN_END_ORDINAL).contains(&ordinal)
            || (1..=WINTER_END_ORDINAL).contains(&ordinal)
    }

    /// Get the winter year for a calendar year and day-of-year.
    /// A winter is named after the year it starts in: day 320 of 1962 and
    /// day 20 of 1963 both belong to winter 1962.
    ///
    /// Returns None for days outside the winter window.
    pub fn winter_year_for(year: i32, ordinal: u32) -> Option<i32> {
        if !is_winter_ordinal(ordinal) {
            return None;
        }
        if ordinal >= WINTER_START_ORDINAL {
            Some(year)
        } else {
            Some(year - 1)
        }
    }

    /// Get the winter year for a given date.
    pub fn winter_year_for_date(date: &NaiveDate) -> Option<i32> {
        winter_year_for(date.year(), date.ordinal())
    }

    /// Get the day-of-winter for a day-of-year inside the winter window.
    /// Day 305 = 0, day 365 = 60, day 1 = 62, day 90 = 151.
    ///
    /// Returns None for days outside the winter window.
    pub fn day_of_winter(ordinal: u32) -> Option<u32> {
        if !is_winter_ordinal(ordinal) {
            return None;
        }
        if ordinal >= WINTER_START_ORDINAL {
            Some(ordinal - WINTER_START_ORDINAL)
        } else {
            Some(ordinal + 61)
        }
    }

}
