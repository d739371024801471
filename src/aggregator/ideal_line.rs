use crate::model::MilestoneWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Straight line from the full issue count at the window start to zero at its end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealBurndown {
    pub start: (NaiveDate, usize),
    pub end: (NaiveDate, usize),
}

impl IdealBurndown {
    pub fn new(window: &MilestoneWindow, total_issues: usize) -> Self {
        Self {
            start: (window.start_date, total_issues),
            end: (window.end_date, 0),
        }
    }

    pub fn value_at(&self, day: NaiveDate) -> f64 {
        let (start_day, start_value) = self.start;
        let (end_day, end_value) = self.end;
        let span = (end_day - start_day).num_days();
        if span <= 0 || day >= end_day {
            return end_value as f64;
        }
        if day <= start_day {
            return start_value as f64;
        }

        let elapsed = (day - start_day).num_days() as f64 / span as f64;
        start_value as f64 + (end_value as f64 - start_value as f64) * elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::date;
    use pretty_assertions::assert_eq;

    #[test]
    fn endpoints_span_the_window() {
        let window = MilestoneWindow::new(date(2023, 1, 1), date(2023, 1, 5)).unwrap();
        let ideal = IdealBurndown::new(&window, 8);
        assert_eq!(ideal.start, (date(2023, 1, 1), 8));
        assert_eq!(ideal.end, (date(2023, 1, 5), 0));
    }

    #[test]
    fn interpolates_linearly() {
        let window = MilestoneWindow::new(date(2023, 1, 1), date(2023, 1, 5)).unwrap();
        let ideal = IdealBurndown::new(&window, 8);
        assert_eq!(ideal.value_at(date(2023, 1, 1)), 8.0);
        assert_eq!(ideal.value_at(date(2023, 1, 2)), 6.0);
        assert_eq!(ideal.value_at(date(2023, 1, 3)), 4.0);
        assert_eq!(ideal.value_at(date(2023, 1, 5)), 0.0);
        assert_eq!(ideal.value_at(date(2023, 2, 1)), 0.0);
    }

    #[test]
    fn single_day_window_is_already_done() {
        let window = MilestoneWindow::new(date(2023, 1, 1), date(2023, 1, 1)).unwrap();
        let ideal = IdealBurndown::new(&window, 3);
        assert_eq!(ideal.value_at(date(2023, 1, 1)), 0.0);
    }
}
