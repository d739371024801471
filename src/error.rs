use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BurndownError>;

#[derive(Error, Debug)]
pub enum BurndownError {
    #[error("Invalid milestone window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
    #[error("Invalid issue \"{title}\": {reason}")]
    InvalidIssue { title: String, reason: String },
    #[error("Milestone {milestone} has no due date")]
    MissingDueDate { milestone: u64 },
    #[error("Milestone {milestone} not found")]
    MilestoneNotFound { milestone: u64 },
    #[error("Invalid project identifier: {0} (expected owner/repo)")]
    InvalidProject(String),
    #[error("GitHub API error: {0}")]
    GitHub(#[from] octocrab::Error),
    #[error("Template error: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),
    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<handlebars::TemplateError> for BurndownError {
    fn from(err: handlebars::TemplateError) -> Self {
        BurndownError::Template(Box::new(err))
    }
}
