//! Calendar primitives shared by every stage: years, calendar months and
//! inclusive year ranges.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Year(pub i32);
impl Year {
    pub fn get(self) -> i32 {
        self.0
    }
}

impl Display for Year {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// A calendar month, January = 1 through December = 12.
///
/// Construction through [`CalendarMonth::new`] is checked, so any value of this type
/// is a valid month and can be used directly as an index via [`CalendarMonth::index`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CalendarMonth(u32);

impl CalendarMonth {
    pub const JANUARY: CalendarMonth = CalendarMonth(1);
    pub const DECEMBER: CalendarMonth = CalendarMonth(12);

    /// Returns `None` when `month` is outside `1..=12`.
    pub fn new(month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self(month))
    }

    pub fn number(self) -> u32 {
        self.0
    }

    /// Zero-based position, for indexing twelve-slot arrays.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// All twelve months in calendar order.
    pub fn all() -> impl Iterator<Item = CalendarMonth> {
        (1..=12).map(CalendarMonth)
    }
}

impl TryFrom<u32> for CalendarMonth {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        CalendarMonth::new(value).ok_or_else(|| format!("month {value} is outside 1..=12"))
    }
}

impl From<CalendarMonth> for u32 {
    fn from(month: CalendarMonth) -> u32 {
        month.0
    }
}

impl Display for CalendarMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// A specific month of a specific year. Orders chronologically.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: Year,
    pub month: CalendarMonth,
}

impl YearMonth {
    pub fn new(year: Year, month: CalendarMonth) -> Self {
        Self { year, month }
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}

/// An inclusive range of years, e.g. the 1951-1980 reference period.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }

    /// `true` when `start > end`; such a range contains no years.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn years(&self) -> impl Iterator<Item = Year> {
        (self.start..=self.end).map(Year)
    }

    pub fn as_range(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }
}

impl Display for YearRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_month_rejects_out_of_range() {
        assert!(CalendarMonth::new(0).is_none());
        assert!(CalendarMonth::new(13).is_none());
        assert_eq!(CalendarMonth::new(12), Some(CalendarMonth::DECEMBER));
    }

    #[test]
    fn calendar_month_index_is_zero_based() {
        let months: Vec<usize> = CalendarMonth::all().map(CalendarMonth::index).collect();
        assert_eq!(months, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn year_month_orders_chronologically() {
        let dec_1950 = YearMonth::new(Year(1950), CalendarMonth::DECEMBER);
        let jan_1951 = YearMonth::new(Year(1951), CalendarMonth::JANUARY);
        assert!(dec_1950 < jan_1951);
        assert_eq!(jan_1951.to_string(), "1951-01");
    }

    #[test]
    fn year_range_is_inclusive() {
        let range = YearRange::new(1951, 1980);
        assert!(range.contains(1951));
        assert!(range.contains(1980));
        assert!(!range.contains(1950));
        assert!(!range.contains(1981));
        assert_eq!(range.years().count(), 30);
        assert!(YearRange::new(1980, 1951).is_inverted());
    }
}
