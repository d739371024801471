use crate::error::{BurndownError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// A milestone issue reduced to the dates the burndown cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub title: String,
    pub state: IssueState,
    pub created_at: NaiveDate,
    pub closed_at: Option<NaiveDate>,
    pub updated_at: NaiveDate,
}

#[cfg(test)]
impl Issue {
    pub fn open(title: impl Into<String>, created_at: NaiveDate) -> Self {
        Self {
            title: title.into(),
            state: IssueState::Open,
            created_at,
            closed_at: None,
            updated_at: created_at,
        }
    }

    pub fn closed(title: impl Into<String>, created_at: NaiveDate, closed_at: NaiveDate) -> Self {
        Self {
            title: title.into(),
            state: IssueState::Closed,
            created_at,
            closed_at: Some(closed_at),
            updated_at: closed_at,
        }
    }

    /// Open as of the end of `day`: created on or before it and not closed by then.
    pub fn is_open_on(&self, day: NaiveDate) -> bool {
        self.created_at <= day && self.closed_at.map_or(true, |closed| day < closed)
    }
}

impl Issue {
    /// Checks the state/closed_at invariant and the created/closed ordering.
    pub fn validate(&self) -> Result<()> {
        match (self.state, self.closed_at) {
            (IssueState::Open, Some(_)) => Err(self.invalid("open issue has a close date")),
            (IssueState::Closed, None) => Err(self.invalid("closed issue has no close date")),
            (_, Some(closed)) if closed < self.created_at => Err(self.invalid(&format!(
                "closed on {} before it was created on {}",
                closed, self.created_at
            ))),
            _ => Ok(()),
        }
    }

    fn invalid(&self, reason: &str) -> BurndownError {
        BurndownError::InvalidIssue {
            title: self.title.clone(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub created_at: NaiveDate,
}

/// Inclusive date range a burndown is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl MilestoneWindow {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        let window = Self { start_date, end_date };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_date > self.end_date {
            return Err(BurndownError::InvalidWindow {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    pub fn len_days(&self) -> usize {
        usize::try_from((self.end_date - self.start_date).num_days() + 1).unwrap_or(0)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start_date.iter_days().take(self.len_days())
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub day: NaiveDate,
    pub total_open: usize,
    pub opened: usize,
    pub closed: usize,
    pub commits: usize,
}

#[cfg(test)]
impl DailyStats {
    pub fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            total_open: 0,
            opened: 0,
            closed: 0,
            commits: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub window: MilestoneWindow,
}

#[cfg(test)]
pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn window_counts_days_inclusively() {
        let window = MilestoneWindow::new(date(2023, 1, 30), date(2023, 2, 2)).unwrap();
        assert_eq!(window.len_days(), 4);
        assert_eq!(
            window.days().collect::<Vec<_>>(),
            vec![date(2023, 1, 30), date(2023, 1, 31), date(2023, 2, 1), date(2023, 2, 2)]
        );
        assert!(window.contains(date(2023, 2, 2)));
        assert!(!window.contains(date(2023, 2, 3)));
    }

    #[test]
    fn single_day_window_is_valid() {
        let window = MilestoneWindow::new(date(2023, 1, 1), date(2023, 1, 1)).unwrap();
        assert_eq!(window.len_days(), 1);
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = MilestoneWindow::new(date(2023, 1, 5), date(2023, 1, 1)).unwrap_err();
        assert!(matches!(err, BurndownError::InvalidWindow { .. }));
    }

    #[test]
    fn issue_closed_same_day_is_not_open_that_day() {
        let issue = Issue::closed("a", date(2023, 1, 1), date(2023, 1, 3));
        assert!(issue.is_open_on(date(2023, 1, 2)));
        assert!(!issue.is_open_on(date(2023, 1, 3)));
        assert!(!issue.is_open_on(date(2022, 12, 31)));
    }

    #[test]
    fn validate_flags_malformed_issues() {
        let backwards = Issue::closed("backwards", date(2023, 1, 3), date(2023, 1, 1));
        assert!(matches!(backwards.validate(), Err(BurndownError::InvalidIssue { .. })));

        let mut no_close_date = Issue::closed("dangling", date(2023, 1, 1), date(2023, 1, 2));
        no_close_date.closed_at = None;
        assert!(no_close_date.validate().is_err());

        let mut open_with_close = Issue::open("reopened", date(2023, 1, 1));
        open_with_close.closed_at = Some(date(2023, 1, 2));
        assert!(open_with_close.validate().is_err());

        assert!(Issue::closed("same day", date(2023, 1, 1), date(2023, 1, 1))
            .validate()
            .is_ok());
    }
}
