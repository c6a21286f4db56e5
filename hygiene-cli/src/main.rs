#![deny(missing_docs)]
//! Repository hygiene command-line interface.
//!
//! Scores exported repository activity against the configured rule set.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use hygiene_core::{
    FileConfigSource, FleetReport, RepoScoreReport, RepositoryActivity, ScoringConfig,
    assess_repository, load_scoring_config, parse_activities, render_json, render_markdown,
    render_text,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "hygiene", version, about = "Repository hygiene scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
struct RulesArgs {
    /// JSON rule configuration; built-in defaults apply when absent or unreadable.
    #[arg(long, env = "HYGIENE_RULES")]
    rules: Option<PathBuf>,
    /// Override the configured base score.
    #[arg(long = "base-score", env = "HYGIENE_BASE_SCORE")]
    base_score: Option<i32>,
}

#[derive(Args, Clone, Debug)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Score repositories from an exported activity document.
    Score {
        /// JSON array of repository activity records.
        #[arg(short, long)]
        input: PathBuf,
        /// Only score these repositories (repeatable or comma-separated).
        #[arg(long, value_delimiter = ',')]
        repos: Vec<String>,
        /// Maximum number of repositories scored concurrently.
        #[arg(short = 'j', long, env = "HYGIENE_CONCURRENCY", default_value_t = 5)]
        concurrency: usize,
        #[command(flatten)]
        rules: RulesArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Print the effective rule configuration as JSON.
    Rules {
        #[command(flatten)]
        rules: RulesArgs,
    },
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            input,
            repos,
            concurrency,
            rules,
            report,
        } => {
            let config = resolve_config(&rules);
            run_score(&input, &repos, concurrency, config, Utc::now(), report).await?
        }
        Commands::Rules { rules } => {
            let config = resolve_config(&rules);
            println!("{}", render_json(&config)?);
        }
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

fn resolve_config(args: &RulesArgs) -> ScoringConfig {
    let mut config = match &args.rules {
        Some(path) => load_scoring_config(&FileConfigSource::new(path)),
        None => {
            log::info!("no rule configuration given; using built-in defaults");
            ScoringConfig::default()
        }
    };
    if let Some(base_score) = args.base_score {
        config.base_score = base_score;
    }
    config
}

async fn run_score(
    input: &Path,
    repo_filter: &[String],
    concurrency: usize,
    config: ScoringConfig,
    now: DateTime<Utc>,
    report: OutputArgs,
) -> CliResult<()> {
    let activities = load_activities(input).await?;
    let activities = filter_repositories(activities, repo_filter);
    if activities.is_empty() {
        println!("No repositories found to score.");
        return Ok(());
    }

    let reports = score_repositories(activities, Arc::new(config), concurrency, now).await?;
    emit_reports(&reports, &report).await
}

async fn load_activities(path: &Path) -> CliResult<Vec<RepositoryActivity>> {
    let contents = tokio::fs::read_to_string(path).await?;
    let activities = parse_activities(&contents)?;
    log::info!(
        "loaded {} repositories from {}",
        activities.len(),
        path.display()
    );
    Ok(activities)
}

fn filter_repositories(
    activities: Vec<RepositoryActivity>,
    repo_filter: &[String],
) -> Vec<RepositoryActivity> {
    let wanted: Vec<String> = repo_filter
        .iter()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect();
    if wanted.is_empty() {
        return activities;
    }

    let total = activities.len();
    let filtered: Vec<RepositoryActivity> = activities
        .into_iter()
        .filter(|activity| wanted.contains(&activity.name.to_lowercase()))
        .collect();
    log::info!(
        "filtered {total} repositories to {} with --repos",
        filtered.len()
    );

    let missing: Vec<&str> = wanted
        .iter()
        .filter(|name| {
            !filtered
                .iter()
                .any(|activity| activity.name.to_lowercase() == **name)
        })
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        log::warn!("repository names not found: {}", missing.join(", "));
    }

    filtered
}

async fn score_repositories(
    activities: Vec<RepositoryActivity>,
    config: Arc<ScoringConfig>,
    concurrency: usize,
    now: DateTime<Utc>,
) -> CliResult<Vec<RepoScoreReport>> {
    let concurrency = if concurrency == 0 { 1 } else { concurrency };
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();

    for activity in activities {
        let permit = semaphore.clone().acquire_owned().await?;
        let config = config.clone();
        tasks.spawn(async move {
            let _permit = permit;
            log::info!("scoring repository {}", activity.name);
            assess_repository(&activity, &config, now)
        });
    }

    let mut reports = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(report) => reports.push(report),
            Err(err) => reports.push(report_from_task_error(err)),
        }
    }
    reports.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(reports)
}

fn report_from_task_error(error: tokio::task::JoinError) -> RepoScoreReport {
    RepoScoreReport::failed("unknown".to_string(), error.to_string())
}

async fn emit_reports(reports: &[RepoScoreReport], output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_text(reports),
        OutputFormat::Markdown => render_markdown(reports),
        OutputFormat::Json => render_json(&FleetReport::new(reports.to_vec()))?,
    };
    emit_output(output, contents).await
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}
