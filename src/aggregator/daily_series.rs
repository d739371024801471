use crate::error::Result;
use crate::model::{Commit, DailyStats, Issue, MilestoneWindow};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

/// Computes one [`DailyStats`] row per calendar day of `window`.
///
/// An issue counts toward `total_open` on day `d` when it was created on or
/// before `d` and is not closed by `d`; an issue closed on `d` is already
/// excluded that day. Issues dated outside the window still contribute when
/// they straddle it. Commits outside the window are ignored.
///
/// Runs as a sweep over sorted creation and closing dates, so the cost is
/// linear in the window length plus the sort of the issue dates.
pub fn aggregate(
    issues: &[Issue],
    commits: &[Commit],
    window: &MilestoneWindow,
) -> Result<Vec<DailyStats>> {
    window.validate()?;
    for issue in issues {
        issue.validate()?;
    }

    let mut created: Vec<NaiveDate> = issues.iter().map(|i| i.created_at).collect();
    let mut closed: Vec<NaiveDate> = issues.iter().filter_map(|i| i.closed_at).collect();
    created.sort_unstable();
    closed.sort_unstable();

    let mut commits_per_day: HashMap<NaiveDate, usize> = HashMap::new();
    for commit in commits.iter().filter(|c| window.contains(c.created_at)) {
        *commits_per_day.entry(commit.created_at).or_insert(0) += 1;
    }

    let mut created_cursor = DayCursor::new(&created);
    let mut closed_cursor = DayCursor::new(&closed);

    let series: Vec<DailyStats> = window
        .days()
        .map(|day| {
            let opened = created_cursor.advance_to(day);
            let closed = closed_cursor.advance_to(day);
            // closed_at >= created_at, so every issue closed by `day` was also created by it
            let total_open = created_cursor.passed - closed_cursor.passed;

            DailyStats {
                day,
                total_open,
                opened,
                closed,
                commits: commits_per_day.get(&day).copied().unwrap_or(0),
            }
        })
        .collect();

    debug!(
        days = series.len(),
        issues = issues.len(),
        commits = commits.len(),
        "aggregated daily series"
    );

    Ok(series)
}

/// Walks a sorted date list, tracking how many entries fall on or before the current day.
struct DayCursor<'a> {
    dates: &'a [NaiveDate],
    passed: usize,
}

impl<'a> DayCursor<'a> {
    fn new(dates: &'a [NaiveDate]) -> Self {
        Self { dates, passed: 0 }
    }

    /// Advances past every date `<= day` and returns how many were exactly `day`.
    fn advance_to(&mut self, day: NaiveDate) -> usize {
        let mut on_day = 0;
        while let Some(&next) = self.dates.get(self.passed) {
            if next > day {
                break;
            }
            if next == day {
                on_day += 1;
            }
            self.passed += 1;
        }
        on_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BurndownError;
    use crate::model::date;
    use pretty_assertions::assert_eq;

    /// Day-by-day scan over every issue, used to cross-check the sweep.
    fn aggregate_naive(
        issues: &[Issue],
        commits: &[Commit],
        window: &MilestoneWindow,
    ) -> Vec<DailyStats> {
        window
            .days()
            .map(|day| DailyStats {
                day,
                total_open: issues.iter().filter(|i| i.is_open_on(day)).count(),
                opened: issues.iter().filter(|i| i.created_at == day).count(),
                closed: issues.iter().filter(|i| i.closed_at == Some(day)).count(),
                commits: commits.iter().filter(|c| c.created_at == day).count(),
            })
            .collect()
    }

    fn window(start: NaiveDate, end: NaiveDate) -> MilestoneWindow {
        MilestoneWindow::new(start, end).unwrap()
    }

    fn commit(id: &str, day: NaiveDate) -> Commit {
        Commit {
            id: id.to_string(),
            created_at: day,
        }
    }

    fn mixed_issues() -> Vec<Issue> {
        vec![
            Issue::closed("before window", date(2022, 12, 20), date(2023, 1, 4)),
            Issue::open("still open", date(2023, 1, 2)),
            Issue::closed("same day", date(2023, 1, 3), date(2023, 1, 3)),
            Issue::closed("spans end", date(2023, 1, 5), date(2023, 1, 20)),
            Issue::open("created after", date(2023, 1, 15)),
            Issue::closed("closed early", date(2022, 11, 1), date(2022, 11, 5)),
            Issue::closed("two a", date(2023, 1, 6), date(2023, 1, 8)),
            Issue::closed("two b", date(2023, 1, 6), date(2023, 1, 8)),
        ]
    }

    #[test]
    fn single_issue_scenario() {
        let issues = vec![Issue::closed("one", date(2023, 1, 1), date(2023, 1, 3))];
        let series = aggregate(&issues, &[], &window(date(2023, 1, 1), date(2023, 1, 5))).unwrap();

        let total_open: Vec<usize> = series.iter().map(|s| s.total_open).collect();
        let opened: Vec<usize> = series.iter().map(|s| s.opened).collect();
        let closed: Vec<usize> = series.iter().map(|s| s.closed).collect();
        assert_eq!(total_open, vec![1, 1, 0, 0, 0]);
        assert_eq!(opened, vec![1, 0, 0, 0, 0]);
        assert_eq!(closed, vec![0, 0, 1, 0, 0]);
    }

    #[test]
    fn empty_input_yields_zero_rows_for_every_day() {
        let w = window(date(2023, 3, 1), date(2023, 3, 3));
        let series = aggregate(&[], &[], &w).unwrap();
        assert_eq!(
            series,
            w.days().map(DailyStats::empty).collect::<Vec<_>>()
        );
    }

    #[test]
    fn inverted_window_fails() {
        let w = MilestoneWindow {
            start_date: date(2023, 1, 5),
            end_date: date(2023, 1, 1),
        };
        let err = aggregate(&[], &[], &w).unwrap_err();
        assert!(matches!(err, BurndownError::InvalidWindow { .. }));
    }

    #[test]
    fn issue_closed_before_created_fails() {
        let issues = vec![Issue::closed("bad", date(2023, 1, 4), date(2023, 1, 2))];
        let err = aggregate(&issues, &[], &window(date(2023, 1, 1), date(2023, 1, 5))).unwrap_err();
        assert!(matches!(err, BurndownError::InvalidIssue { ref title, .. } if title == "bad"));
    }

    #[test]
    fn one_row_per_day_in_ascending_order() {
        let w = window(date(2023, 2, 25), date(2023, 3, 4));
        let series = aggregate(&mixed_issues(), &[], &w).unwrap();
        assert_eq!(series.len(), 8);
        assert_eq!(series.first().map(|s| s.day), Some(w.start_date));
        assert_eq!(series.last().map(|s| s.day), Some(w.end_date));
        assert!(series.windows(2).all(|pair| pair[0].day < pair[1].day));
    }

    #[test]
    fn closed_issue_counts_until_its_close_day() {
        let issues = vec![Issue::closed("x", date(2023, 1, 3), date(2023, 1, 6))];
        let series = aggregate(&issues, &[], &window(date(2023, 1, 1), date(2023, 1, 8))).unwrap();
        for row in &series {
            let expected = usize::from(row.day >= date(2023, 1, 3) && row.day < date(2023, 1, 6));
            assert_eq!(row.total_open, expected, "day {}", row.day);
        }
    }

    #[test]
    fn open_issue_counts_through_window_end() {
        let issues = vec![Issue::open("x", date(2023, 1, 2))];
        let series = aggregate(&issues, &[], &window(date(2023, 1, 1), date(2023, 1, 4))).unwrap();
        let total_open: Vec<usize> = series.iter().map(|s| s.total_open).collect();
        assert_eq!(total_open, vec![0, 1, 1, 1]);
    }

    #[test]
    fn opened_and_closed_sums_match_in_window_issues() {
        let w = window(date(2023, 1, 1), date(2023, 1, 10));
        let issues = mixed_issues();
        let series = aggregate(&issues, &[], &w).unwrap();

        let opened: usize = series.iter().map(|s| s.opened).sum();
        let closed: usize = series.iter().map(|s| s.closed).sum();
        let created_in_window = issues.iter().filter(|i| w.contains(i.created_at)).count();
        let closed_in_window = issues
            .iter()
            .filter(|i| i.closed_at.is_some_and(|d| w.contains(d)))
            .count();

        assert_eq!(opened, created_in_window);
        assert_eq!(closed, closed_in_window);
    }

    #[test]
    fn straddling_issue_counts_from_window_start() {
        let issues = vec![Issue::closed("old", date(2022, 12, 1), date(2023, 1, 3))];
        let series = aggregate(&issues, &[], &window(date(2023, 1, 1), date(2023, 1, 4))).unwrap();
        let total_open: Vec<usize> = series.iter().map(|s| s.total_open).collect();
        assert_eq!(total_open, vec![1, 1, 0, 0]);
        assert_eq!(series.iter().map(|s| s.opened).sum::<usize>(), 0);
    }

    #[test]
    fn commits_are_bucketed_by_day() {
        let commits = vec![
            commit("a", date(2023, 1, 1)),
            commit("b", date(2023, 1, 1)),
            commit("c", date(2023, 1, 3)),
            commit("outside", date(2023, 1, 9)),
        ];
        let series = aggregate(&[], &commits, &window(date(2023, 1, 1), date(2023, 1, 4))).unwrap();
        let per_day: Vec<usize> = series.iter().map(|s| s.commits).collect();
        assert_eq!(per_day, vec![2, 0, 1, 0]);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let w = window(date(2023, 1, 1), date(2023, 1, 10));
        let commits = vec![commit("a", date(2023, 1, 2))];
        let first = aggregate(&mixed_issues(), &commits, &w).unwrap();
        let second = aggregate(&mixed_issues(), &commits, &w).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sweep_matches_naive_scan() {
        let issues = mixed_issues();
        let commits = vec![
            commit("a", date(2023, 1, 2)),
            commit("b", date(2023, 1, 6)),
            commit("c", date(2023, 1, 6)),
        ];
        let windows = [
            window(date(2023, 1, 1), date(2023, 1, 10)),
            window(date(2022, 10, 25), date(2023, 1, 31)),
            window(date(2023, 1, 3), date(2023, 1, 3)),
            window(date(2023, 1, 21), date(2023, 2, 2)),
        ];
        for w in &windows {
            assert_eq!(
                aggregate(&issues, &commits, w).unwrap(),
                aggregate_naive(&issues, &commits, w),
                "window {:?}",
                w
            );
        }
    }
}
