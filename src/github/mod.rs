pub mod client;
pub mod project;
pub mod types;

pub use client::{Credentials, GitHubClient};
pub use project::ProjectId;
