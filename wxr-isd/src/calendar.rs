use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use wxr_utils::dates::decade;

/// Calendar month. `MONTHS` is the display order used by every table and
/// histogram that is split by month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

/// Months in calendar order.
pub const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

impl Month {
    /// Month for a 1-based month number.
    pub fn from_number(number: u32) -> Option<Month> {
        MONTHS.get(number.checked_sub(1)? as usize).copied()
    }

    /// 1-based month number.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn short_name(self) -> &'static str {
        &self.name()[..3]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Calendar keys derived for an observation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CalendarKey {
    pub date: NaiveDate,
    pub year: i32,
    /// 1-based ordinal; leap years reach 366.
    pub day_of_year: u32,
    pub month: Month,
    pub decade: i32,
}

impl From<NaiveDate> for CalendarKey {
    fn from(date: NaiveDate) -> Self {
        CalendarKey {
            date,
            year: date.year(),
            day_of_year: date.ordinal(),
            month: MONTHS[date.month0() as usize],
            decade: decade(date.year()),
        }
    }
}
