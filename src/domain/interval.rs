use serde::{Deserialize, Serialize};

use super::month::Month;

/// Inclusive window of months. A missing `end` means the window is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthInterval {
    pub start: Month,
    pub end: Option<Month>,
}

impl MonthInterval {
    pub fn new(start: Month, end: Option<Month>) -> Self {
        Self { start, end }
    }

    pub fn single(month: Month) -> Self {
        Self {
            start: month,
            end: Some(month),
        }
    }

    pub fn open(start: Month) -> Self {
        Self { start, end: None }
    }

    pub fn contains(&self, month: Month) -> bool {
        month >= self.start && self.end.map_or(true, |end| month <= end)
    }

    /// `max(start_a, start_b) <= min(end_a, end_b)` with an absent end as +∞.
    pub fn intersects(&self, other: &MonthInterval) -> bool {
        let start = self.start.max(other.start);
        match (self.end, other.end) {
            (None, None) => true,
            (Some(end), None) | (None, Some(end)) => start <= end,
            (Some(a), Some(b)) => start <= a.min(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(value: &str) -> Month {
        Month::parse(value).unwrap()
    }

    #[test]
    fn contains_respects_both_bounds() {
        let window = MonthInterval::new(m("2024-01"), Some(m("2024-03")));
        assert!(window.contains(m("2024-01")));
        assert!(window.contains(m("2024-03")));
        assert!(!window.contains(m("2023-12")));
        assert!(!window.contains(m("2024-04")));
        assert!(MonthInterval::open(m("2024-01")).contains(m("2090-01")));
    }

    #[test]
    fn intersects_handles_open_and_closed_windows() {
        let a = MonthInterval::new(m("2023-01"), Some(m("2023-02")));
        let b = MonthInterval::open(m("2023-03"));
        let c = MonthInterval::open(m("2023-01"));
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
        assert!(c.intersects(&a));
        assert!(c.intersects(&b));
        assert!(b.intersects(&c));
        assert!(MonthInterval::single(m("2023-02")).intersects(&a));
        assert!(!MonthInterval::single(m("2022-12")).intersects(&c));
    }
}
