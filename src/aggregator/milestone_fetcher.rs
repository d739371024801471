use crate::error::{BurndownError, Result};
use crate::github::client::GitHubClient;
use crate::github::types::{CommitRecord, IssueRecord, MilestoneRecord};
use crate::model::{Commit, DailyStats, Issue, IssueState, Milestone, MilestoneWindow};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use super::daily_series::aggregate;
use super::ideal_line::IdealBurndown;

#[derive(Debug)]
pub struct CollectorConfig {
    pub include_commits: bool,
}

/// Everything the renderer needs for one milestone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurndownReport {
    pub project: String,
    pub milestone: Milestone,
    pub series: Vec<DailyStats>,
    pub ideal: IdealBurndown,
    pub total_issues: usize,
    pub total_commits: usize,
    pub commits_included: bool,
    pub generated_at: DateTime<Utc>,
}

pub struct BurndownCollector {
    client: GitHubClient,
    config: CollectorConfig,
}

impl BurndownCollector {
    pub fn new(client: GitHubClient, config: CollectorConfig) -> Self {
        Self { client, config }
    }

    pub async fn milestone(&self, number: u64) -> Result<Milestone> {
        let record = self.client.get_milestone(number).await?;
        milestone_from_record(record)
    }

    pub async fn collect(&self, number: u64) -> Result<BurndownReport> {
        let milestone = self.milestone(number).await?;
        let window = milestone.window;
        info!(
            milestone = number,
            start = %window.start_date,
            end = %window.end_date,
            "collecting burndown"
        );

        let issues = self
            .client
            .list_milestone_issues(number)
            .await?
            .into_iter()
            .map(issue_from_record)
            .collect::<Result<Vec<_>>>()?;

        let commits = if self.config.include_commits {
            let (since, until) = window_bounds(&window);
            let records = self.client.list_commits(since, until).await?;
            commits_in_window(records, &window)
        } else {
            Vec::new()
        };

        let series = aggregate(&issues, &commits, &window)?;
        let ideal = IdealBurndown::new(&window, issues.len());

        Ok(BurndownReport {
            project: self.client.project().to_string(),
            milestone,
            series,
            ideal,
            total_issues: issues.len(),
            total_commits: commits.len(),
            commits_included: self.config.include_commits,
            generated_at: Utc::now(),
        })
    }
}

/// Window runs from the milestone's creation day to its due day.
pub fn milestone_from_record(record: MilestoneRecord) -> Result<Milestone> {
    let due_on = record.due_on.ok_or(BurndownError::MissingDueDate {
        milestone: record.number,
    })?;
    let window = MilestoneWindow::new(record.created_at.date_naive(), due_on.date_naive())?;

    Ok(Milestone {
        number: record.number,
        title: record.title,
        state: record.state,
        window,
    })
}

pub fn issue_from_record(record: IssueRecord) -> Result<Issue> {
    let state = if record.state.eq_ignore_ascii_case("closed") {
        IssueState::Closed
    } else {
        IssueState::Open
    };
    // a reopened issue may still carry its old close timestamp
    let closed_at = match state {
        IssueState::Closed => record.closed_at.map(|d| d.date_naive()),
        IssueState::Open => None,
    };

    let issue = Issue {
        title: record.title,
        state,
        created_at: record.created_at.date_naive(),
        closed_at,
        updated_at: record.updated_at.date_naive(),
    };
    issue.validate()?;
    Ok(issue)
}

/// Keeps commits whose author date falls inside the window.
pub fn commits_in_window(records: Vec<CommitRecord>, window: &MilestoneWindow) -> Vec<Commit> {
    let mut undated = 0usize;
    let commits: Vec<Commit> = records
        .into_iter()
        .filter_map(|record| match record.authored_at() {
            Some(at) => Some(Commit {
                id: record.sha,
                created_at: at.date_naive(),
            }),
            None => {
                undated += 1;
                None
            }
        })
        .filter(|commit| window.contains(commit.created_at))
        .collect();

    if undated > 0 {
        warn!(undated, "skipped commits without an author date");
    }
    commits
}

fn window_bounds(window: &MilestoneWindow) -> (DateTime<Utc>, DateTime<Utc>) {
    let since = window.start_date.and_time(NaiveTime::MIN).and_utc();
    let until = window
        .end_date
        .and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| window.end_date.and_time(NaiveTime::MIN))
        .and_utc();
    (since, until)
}
