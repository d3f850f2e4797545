//! Skillforge - Skill Verification & Scoring CLI
//!
//! The `skillforge` command drives the verification pipeline from a shell.
//!
//! ## Commands
//!
//! - `init`: create a skill profile row
//! - `analyze`: run evidence analysis for one or both sources
//! - `show`: print a profile as JSON
//!
//! Real collaborators (GitHub, LeetCode, Gemini, SurrealDB) are built from
//! environment variables; see each client's `from_env`.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use profile_state::{ProfileId, ProfileStore, SkillProfile, SourceId, SurrealProfileStore};
use skillforge_core::evidence::{GithubRepoFetcher, LeetcodeSubmissionFetcher};
use skillforge_core::oracle::GeminiOracle;
use skillforge_core::telemetry::init_tracing;
use skillforge_core::{AnalysisPipeline, RunReport};

#[derive(Parser)]
#[command(name = "skillforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Skill verification and scoring pipeline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Evidence source selector for `analyze`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    /// Repository evidence (GitHub)
    Github,
    /// Submission evidence (LeetCode)
    Leetcode,
    /// Both sources, run concurrently
    All,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new skill profile
    Init {
        /// Profile id to create (random UUID if omitted)
        #[arg(long)]
        profile: Option<String>,
    },

    /// Run the analysis pipeline for a profile
    Analyze {
        /// Profile id to update
        #[arg(long)]
        profile: String,

        /// Platform username to analyze
        #[arg(long)]
        handle: String,

        /// Which evidence source to run
        #[arg(long, value_enum, default_value = "all")]
        source: SourceArg,
    },

    /// Print a skill profile as JSON
    Show {
        /// Profile id to display
        #[arg(long)]
        profile: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Init { profile } => cmd_init(profile).await,
        Commands::Analyze {
            profile,
            handle,
            source,
        } => cmd_analyze(profile, handle, source).await,
        Commands::Show { profile } => cmd_show(profile).await,
    }
}

async fn cmd_init(profile: Option<String>) -> Result<()> {
    let store = SurrealProfileStore::from_env()
        .await
        .context("connecting to profile store")?;

    let profile_id = profile.map(ProfileId).unwrap_or_default();
    store
        .create_profile(SkillProfile::new(profile_id.clone()))
        .await
        .context("creating profile")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "profile_id": profile_id,
            "created": true,
        }))?
    );
    Ok(())
}

async fn cmd_analyze(profile: String, handle: String, source: SourceArg) -> Result<()> {
    let pipeline = Arc::new(build_pipeline().await?);
    let profile_id = ProfileId(profile);

    let reports: Vec<RunReport> = match source {
        SourceArg::Github => {
            vec![
                pipeline
                    .trigger_analysis(profile_id, handle, SourceId::Repositories)
                    .await,
            ]
        }
        SourceArg::Leetcode => {
            vec![
                pipeline
                    .trigger_analysis(profile_id, handle, SourceId::Submissions)
                    .await,
            ]
        }
        SourceArg::All => {
            // The two runs are independent; the field-scoped merge makes
            // their interleaving irrelevant to the final profile.
            let (repos, subs) = tokio::join!(
                pipeline.clone().trigger_analysis(
                    profile_id.clone(),
                    handle.clone(),
                    SourceId::Repositories
                ),
                pipeline
                    .clone()
                    .trigger_analysis(profile_id, handle, SourceId::Submissions),
            );
            vec![repos, subs]
        }
    };

    println!("{}", serde_json::to_string_pretty(&reports)?);

    let failures: Vec<&RunReport> = reports.iter().filter(|r| !r.success).collect();
    if !failures.is_empty() {
        let reasons: Vec<String> = failures
            .iter()
            .map(|r| format!("{}: {}", r.source, r.detail))
            .collect();
        bail!("analysis failed: {}", reasons.join("; "));
    }
    Ok(())
}

async fn cmd_show(profile: String) -> Result<()> {
    let store = SurrealProfileStore::from_env()
        .await
        .context("connecting to profile store")?;
    let record = store
        .get_profile(&ProfileId(profile))
        .await
        .context("loading profile")?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn build_pipeline() -> Result<AnalysisPipeline> {
    let repositories =
        Arc::new(GithubRepoFetcher::from_env().context("building github client")?);
    let submissions =
        Arc::new(LeetcodeSubmissionFetcher::from_env().context("building leetcode client")?);
    let oracle = Arc::new(GeminiOracle::from_env().context("building gemini client")?);
    let store = Arc::new(
        SurrealProfileStore::from_env()
            .await
            .context("connecting to profile store")?,
    );

    Ok(AnalysisPipeline::new(repositories, submissions, oracle, store))
}
