use crate::error::{BurndownError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use octocrab::{Octocrab, Page};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use super::project::ProjectId;
use super::types::{CommitRecord, IssueRecord, MilestoneRecord, MilestoneState};

const PER_PAGE: u8 = 100;
const DEFAULT_MAX_PAGES: u32 = 100;

/// How requests are authenticated.
#[derive(Clone)]
pub enum Credentials {
    /// HTTP basic auth with a username and personal access token.
    Basic { username: String, token: String },
    Token(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("token", &"<redacted>")
                .finish(),
            Credentials::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
        }
    }
}

#[derive(Serialize, Default)]
struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    until: Option<String>,
    per_page: u8,
}

pub struct GitHubClient {
    client: Octocrab,
    project: ProjectId,
    max_pages: u32,
}

impl GitHubClient {
    pub fn new(
        credentials: Credentials,
        project: ProjectId,
        base_uri: Option<&str>,
    ) -> Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(uri) = base_uri {
            builder = builder.base_uri(uri)?;
        }
        builder = match credentials {
            Credentials::Basic { username, token } => builder.basic_auth(username, token),
            Credentials::Token(token) => builder.personal_token(token),
        };

        Ok(Self {
            client: builder.build()?,
            project,
            max_pages: DEFAULT_MAX_PAGES,
        })
    }

    /// Caps how many pages a single listing follows.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub async fn get_milestone(&self, number: u64) -> Result<MilestoneRecord> {
        let route = format!("{}/milestones/{}", self.repo_route(), number);
        let result: octocrab::Result<MilestoneRecord> = self.client.get(route, None::<&()>).await;

        match result {
            Ok(milestone) => Ok(milestone),
            Err(octocrab::Error::GitHub { source, .. }) if source.message.contains("Not Found") => {
                Err(BurndownError::MilestoneNotFound { milestone: number })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_milestones(&self, state: MilestoneState) -> Result<Vec<MilestoneRecord>> {
        let route = format!("{}/milestones", self.repo_route());
        let query = ListQuery {
            state: Some(state.as_str()),
            per_page: PER_PAGE,
            ..Default::default()
        };
        self.get_all_pages(&route, &query).await
    }

    /// Every issue attached to the milestone, open and closed.
    pub async fn list_milestone_issues(&self, milestone: u64) -> Result<Vec<IssueRecord>> {
        let route = format!("{}/issues", self.repo_route());
        let query = ListQuery {
            state: Some("all"),
            milestone: Some(milestone),
            per_page: PER_PAGE,
            ..Default::default()
        };
        let issues = self.get_all_pages(&route, &query).await?;

        info!(
            project = %self.project,
            milestone,
            count = issues.len(),
            "fetched milestone issues"
        );
        Ok(issues)
    }

    /// Commits on the default branch, narrowed server-side to `[since, until]`.
    pub async fn list_commits(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>> {
        let route = format!("{}/commits", self.repo_route());
        let query = ListQuery {
            since: Some(since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            until: Some(until.to_rfc3339_opts(SecondsFormat::Secs, true)),
            per_page: PER_PAGE,
            ..Default::default()
        };
        let commits = self.get_all_pages(&route, &query).await?;

        info!(project = %self.project, count = commits.len(), "fetched commits");
        Ok(commits)
    }

    fn repo_route(&self) -> String {
        format!("/repos/{}/{}", self.project.owner, self.project.repo)
    }

    /// Follows the `next` links of a paginated listing, up to `max_pages` pages.
    async fn get_all_pages<T>(&self, route: &str, query: &ListQuery) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut page: Page<T> = self.client.get(route, Some(query)).await?;
        let mut items = page.take_items();
        let mut fetched = 1;
        debug!(route, page = fetched, total = items.len(), "fetched page");

        while page.next.is_some() {
            if fetched >= self.max_pages {
                warn!(
                    route,
                    pages = fetched,
                    "page limit reached, remaining results are not included"
                );
                break;
            }
            match self.client.get_page::<T>(&page.next).await? {
                Some(mut next) => {
                    items.extend(next.take_items());
                    page = next;
                    fetched += 1;
                    debug!(route, page = fetched, total = items.len(), "fetched page");
                }
                None => break,
            }
        }

        Ok(items)
    }
}
