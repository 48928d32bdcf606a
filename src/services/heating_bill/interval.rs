use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Closed date range, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateInterval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Interval for a tenancy, with an open end capped at `cap`.
    pub fn open_ended(start: NaiveDate, end: Option<NaiveDate>, cap: NaiveDate) -> Option<Self> {
        Self::new(start, end.map_or(cap, |end| end.min(cap)))
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn intersect(&self, other: &DateInterval) -> Option<DateInterval> {
        DateInterval::new(self.start.max(other.start), self.end.min(other.end))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

pub fn overlap_days(a: &DateInterval, b: &DateInterval) -> i64 {
    a.intersect(b).map(|overlap| overlap.days()).unwrap_or(0)
}

/// Calendar months between the overlap bounds, counted inclusively
/// (a tenancy from 15 Jan to 14 Mar counts as 2, from 1 Jan to 31 Mar as 3).
pub fn overlap_months(a: &DateInterval, b: &DateInterval) -> i64 {
    let Some(overlap) = a.intersect(b) else {
        return 0;
    };
    let mut months = (overlap.end.year() - overlap.start.year()) as i64 * 12
        + overlap.end.month() as i64
        - overlap.start.month() as i64;
    if overlap.end.day() < overlap.start.day() {
        months -= 1;
    }
    (months + 1).max(0)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{overlap_days, overlap_months, DateInterval};

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
    }

    fn interval(start: &str, end: &str) -> DateInterval {
        DateInterval::new(date(start), date(end)).expect("ordered interval")
    }

    #[test]
    fn rejects_reversed_bounds() {
        assert!(DateInterval::new(date("2025-02-01"), date("2025-01-01")).is_none());
    }

    #[test]
    fn counts_inclusive_days() {
        assert_eq!(interval("2025-01-01", "2025-12-31").days(), 365);
        assert_eq!(interval("2024-01-01", "2024-12-31").days(), 366);
        assert_eq!(interval("2025-03-05", "2025-03-05").days(), 1);
    }

    #[test]
    fn overlap_clamps_to_zero() {
        let period = interval("2025-01-01", "2025-12-31");
        assert_eq!(overlap_days(&period, &interval("2026-01-01", "2026-06-30")), 0);
        assert_eq!(overlap_days(&period, &interval("2024-06-01", "2024-12-31")), 0);
        assert_eq!(overlap_days(&period, &interval("2024-12-31", "2025-01-01")), 1);
        assert_eq!(overlap_days(&period, &interval("2025-07-01", "2025-07-31")), 31);
    }

    #[test]
    fn overlap_is_capped_by_the_period() {
        let period = interval("2025-01-01", "2025-12-31");
        assert_eq!(overlap_days(&period, &period), period.days());
        let longer = interval("2020-01-01", "2030-12-31");
        assert_eq!(overlap_days(&longer, &period), period.days());
        let outside = interval("2026-01-01", "2026-12-31");
        assert_eq!(overlap_days(&outside, &period), 0);
    }

    #[test]
    fn open_ended_tenancy_is_capped() {
        let period = interval("2025-01-01", "2025-12-31");
        let tenancy =
            DateInterval::open_ended(date("2023-04-01"), None, period.end).expect("valid tenancy");
        assert_eq!(tenancy.end, period.end);
        assert_eq!(overlap_days(&tenancy, &period), 365);
    }

    #[test]
    fn counts_overlap_months() {
        let period = interval("2025-01-01", "2025-12-31");
        assert_eq!(overlap_months(&period, &period), 12);
        assert_eq!(overlap_months(&interval("2025-01-15", "2025-03-14"), &period), 2);
        assert_eq!(overlap_months(&interval("2025-10-01", "2026-05-31"), &period), 3);
        assert_eq!(overlap_months(&interval("2026-01-01", "2026-05-31"), &period), 0);
    }
}
