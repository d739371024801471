use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GithubConfig,
    pub chart: ChartConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub project: Option<String>,
    pub username: Option<String>,
    pub api_url: Option<String>,
    pub max_pages: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub title: Option<String>,
    pub width: u32,
    pub height: u32,
    pub include_commits: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: Option<String>,
    pub path: Option<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            title: None,
            width: 960,
            height: 540,
            include_commits: true,
        }
    }
}
