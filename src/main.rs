use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod aggregator;
mod config;
mod error;
mod github;
mod model;

use aggregator::milestone_fetcher::milestone_from_record;
use aggregator::{BurndownCollector, ChartGenerator, ChartOptions, CollectorConfig, OutputFormat};
use error::BurndownError;
use github::types::{MilestoneRecord, MilestoneState};
use github::{Credentials, GitHubClient, ProjectId};

#[derive(Parser)]
#[command(name = "milestone-burndown")]
#[command(about = "Render a burndown chart for a GitHub milestone")]
struct Cli {
    /// GitHub personal access token (can also be set via GITHUB_TOKEN env var)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// GitHub username; when set, requests use basic auth with the token
    #[arg(short, long, env = "GITHUB_USER")]
    username: Option<String>,

    /// Repository as owner/repo
    #[arg(short, long, env = "GITHUB_PROJECT")]
    project: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API base URL (defaults to https://api.github.com)
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a burndown chart for a milestone
    Generate {
        /// Milestone number
        #[arg(short, long)]
        milestone: u64,

        /// Output file path (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: svg, html, markdown or json
        #[arg(short = 'f', long)]
        format: Option<OutputFormat>,

        /// Chart title
        #[arg(long)]
        title: Option<String>,

        /// Skip fetching commits and leave the commits series out
        #[arg(long)]
        no_commits: bool,
    },

    /// Check that a milestone exists and has a usable date range
    Check {
        #[arg(short, long)]
        milestone: u64,
    },

    /// List milestones and their date ranges
    List {
        #[arg(long, value_enum, default_value = "open")]
        state: MilestoneState,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => config::Config::default(),
    };

    let project: ProjectId = cli
        .project
        .clone()
        .or(settings.github.project.clone())
        .ok_or_else(|| {
            anyhow!("no project given; pass --project owner/repo or set it in the config file")
        })?
        .parse()?;

    let credentials = match cli.username.clone().or(settings.github.username.clone()) {
        Some(username) => Credentials::Basic {
            username,
            token: cli.token.clone(),
        },
        None => Credentials::Token(cli.token.clone()),
    };

    let api_url = cli.api_url.clone().or(settings.github.api_url.clone());
    let mut github_client = GitHubClient::new(credentials, project, api_url.as_deref())?;
    if let Some(max_pages) = settings.github.max_pages {
        github_client = github_client.with_max_pages(max_pages);
    }

    match cli.command {
        Commands::Generate {
            milestone,
            output,
            format,
            title,
            no_commits,
        } => {
            let format = match (format, settings.output.format.as_deref()) {
                (Some(format), _) => format,
                (None, Some(configured)) => configured.parse().map_err(|e: String| anyhow!(e))?,
                (None, None) => OutputFormat::Svg,
            };
            let output = output.or(settings.output.path.map(PathBuf::from));

            let collector = BurndownCollector::new(
                github_client,
                CollectorConfig {
                    include_commits: settings.chart.include_commits && !no_commits,
                },
            );
            let report = collector.collect(milestone).await?;

            let options = ChartOptions {
                width: settings.chart.width,
                height: settings.chart.height,
                title: title.or(settings.chart.title),
            };
            let generator = ChartGenerator::new(format, options)?;
            let content = generator.generate(&report)?;

            if let Some(output_path) = output {
                std::fs::write(&output_path, content)?;
                println!("Burndown chart written to {}", output_path.display());
            } else {
                println!("{}", content);
            }
        }
        Commands::Check { milestone } => {
            let project = github_client.project().to_string();
            let collector = BurndownCollector::new(
                github_client,
                CollectorConfig {
                    include_commits: false,
                },
            );

            match collector.milestone(milestone).await {
                Ok(found) => {
                    println!(
                        "✓ {} milestone #{} \"{}\": {} to {} ({} days)",
                        project,
                        found.number,
                        found.title,
                        found.window.start_date,
                        found.window.end_date,
                        found.window.len_days()
                    );
                }
                Err(
                    e @ (BurndownError::MilestoneNotFound { .. }
                    | BurndownError::MissingDueDate { .. }
                    | BurndownError::InvalidWindow { .. }),
                ) => {
                    println!("✗ {} milestone #{}: {}", project, milestone, e);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::List { state } => {
            println!("Milestones in {} ({}):", github_client.project(), state.as_str());
            println!();

            let milestones = github_client.list_milestones(state).await?;
            if milestones.is_empty() {
                println!("  No milestones found");
            }

            for record in milestones {
                println!("  {}", milestone_line(record));
            }
        }
    }

    Ok(())
}

/// One `list` entry: number, title, date range (or why there is none) and issue counts.
fn milestone_line(record: MilestoneRecord) -> String {
    let counts = format!("{} open, {} closed", record.open_issues, record.closed_issues);
    let number = record.number;
    let title = record.title.clone();
    match milestone_from_record(record) {
        Ok(found) => format!(
            "#{} {}: {} to {} ({})",
            number, title, found.window.start_date, found.window.end_date, counts
        ),
        Err(e) => format!("#{} {}: {} ({})", number, title, e, counts),
    }
}
