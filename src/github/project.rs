use crate::error::BurndownError;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

static PROJECT_PATTERN: OnceLock<Regex> = OnceLock::new();

/// A repository identifier in `owner/repo` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectId {
    pub owner: String,
    pub repo: String,
}

impl FromStr for ProjectId {
    type Err = BurndownError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = PROJECT_PATTERN.get_or_init(|| {
            Regex::new(r"^([A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)/([A-Za-z0-9._-]+)$")
                .expect("project pattern is valid")
        });

        let trimmed = s.trim().trim_end_matches(".git");
        let caps = re
            .captures(trimmed)
            .ok_or_else(|| BurndownError::InvalidProject(s.to_string()))?;

        Ok(Self {
            owner: caps[1].to_string(),
            repo: caps[2].to_string(),
        })
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
