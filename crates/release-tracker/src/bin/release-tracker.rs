//! CLI for marking submodule releases on a parent project.
//!
//! Run `release-tracker --help` for usage information.

// CLI binaries legitimately need println! for user output
#![allow(clippy::disallowed_macros)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gitlab_api::ProjectRef;
use release_tracker::{
    pom, AnyRelease, ConfigOverrides, FailurePolicy, IssueLocator, MalformedPolicy, MarkOutcome,
    ParentMarker, PluginNameSelector, ReleaseEvent, ReleaseSelector, TrackerConfig,
    VersionMapCodec,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "release-tracker")]
#[command(about = "Track submodule releases on a GitLab parent project")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    gitlab: GitLabArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GitLabArgs {
    /// GitLab URL (defaults to GL_URL, GITLAB_URL or the CI environment)
    #[arg(long, global = true)]
    gitlab_url: Option<String>,

    /// API path prefix appended to the GitLab URL
    #[arg(long, global = true)]
    api_path_prefix: Option<String>,

    /// Parent project id or path (defaults to CI_PARENT_ID_OR_PATH)
    #[arg(long, global = true)]
    parent: Option<String>,

    /// Label identifying the tracking issue
    #[arg(long, global = true)]
    label: Option<String>,

    /// Retries for transient GitLab failures
    #[arg(long, global = true)]
    retry_limit: Option<u32>,

    /// Per-request GitLab timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a release on the parent tracking issue and post its notes
    Mark {
        /// JSON array of release events; `-` reads stdin
        #[arg(short, long)]
        releases: PathBuf,

        /// Module name (defaults to the pom artifactId or the project path)
        #[arg(short, long)]
        module: Option<String>,

        /// Path to pom.xml (defaults to CI_POM_PATH or pom.xml)
        #[arg(long)]
        pom_path: Option<PathBuf>,

        /// Project path used when no pom is available
        #[arg(long, env = "CI_PROJECT_PATH")]
        project_path: Option<String>,

        /// Only consider releases published by this plugin
        #[arg(long)]
        plugin_name: Option<String>,

        /// Title for a newly created tracking issue
        #[arg(long)]
        title: Option<String>,

        /// Handling of unreadable issue descriptions: discard-and-reset, fail-fast
        #[arg(long)]
        on_malformed: Option<MalformedPolicy>,

        /// Log marking failures instead of failing the release
        #[arg(long)]
        best_effort: bool,

        /// Extra merge cycles when the issue changes concurrently
        #[arg(long)]
        conflict_retries: Option<u32>,
    },

    /// Print the module versions recorded on the tracking issue
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let mut overrides = ConfigOverrides {
        gitlab_url: cli.gitlab.gitlab_url,
        api_path_prefix: cli.gitlab.api_path_prefix,
        parent: cli.gitlab.parent,
        label: cli.gitlab.label,
        retry_limit: cli.gitlab.retry_limit,
        timeout_secs: cli.gitlab.timeout,
        ..ConfigOverrides::default()
    };

    match cli.command {
        Commands::Mark {
            releases,
            module,
            pom_path,
            project_path,
            plugin_name,
            title,
            on_malformed,
            best_effort,
            conflict_retries,
        } => {
            overrides.pom_path = pom_path;
            overrides.title = title;
            overrides.malformed_policy = on_malformed;
            overrides.conflict_retries = conflict_retries;
            if best_effort {
                overrides.failure_policy = Some(FailurePolicy::BestEffort);
            }
            let config = TrackerConfig::from_env(overrides)?;
            run_mark(&config, &releases, module, project_path, plugin_name).await?;
        }
        Commands::Show => {
            let config = TrackerConfig::from_env(overrides)?;
            run_show(&config).await?;
        }
    }

    Ok(())
}

async fn run_mark(
    config: &TrackerConfig,
    releases_path: &Path,
    module: Option<String>,
    project_path: Option<String>,
    plugin_name: Option<String>,
) -> Result<()> {
    let Some(settings) = config.marker_settings() else {
        info!("No parent project configured, skipping");
        return Ok(());
    };

    let releases = read_releases(releases_path)?;
    let module = module.unwrap_or_else(|| {
        let project_path = project_path.unwrap_or_else(current_dir_name);
        pom::module_name(&config.pom_path, &project_path)
    });

    let selector: Box<dyn ReleaseSelector> = match plugin_name {
        Some(name) => Box::new(PluginNameSelector::new(name)),
        None => Box::new(AnyRelease),
    };

    let client = config.client()?;
    let marker = ParentMarker::new(&client, settings);

    match marker.mark(&releases, selector.as_ref(), &module).await? {
        MarkOutcome::NoRelease => println!("No releases to mark"),
        MarkOutcome::Marked {
            module,
            version,
            upsert,
        } => {
            let action = if upsert.created { "Created" } else { "Updated" };
            println!(
                "{action} tracking issue #{} on {}: {module} {version}",
                upsert.iid,
                marker.settings().parent
            );
        }
        MarkOutcome::Failed(e) => println!("Parent not marked: {e}"),
    }

    Ok(())
}

async fn run_show(config: &TrackerConfig) -> Result<()> {
    let parent: ProjectRef = config
        .parent
        .clone()
        .context("No parent project configured (set --parent or CI_PARENT_ID_OR_PATH)")?;

    let client = config.client()?;
    let Some(issue) = IssueLocator::new(&client)
        .locate(&parent, &config.label)
        .await?
    else {
        println!("No open tracking issue on {parent}");
        return Ok(());
    };

    let map = VersionMapCodec::new(config.malformed_policy).decode(issue.body())?;
    println!("Tracking issue #{} on {parent}", issue.iid);
    for (module, version) in map.iter() {
        println!("  {module}: {version}");
    }

    Ok(())
}

fn read_releases(path: &Path) -> Result<Vec<ReleaseEvent>> {
    let raw = if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read releases from stdin")?;
        raw
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read releases from {}", path.display()))?
    };

    serde_json::from_str(&raw).context("Failed to parse releases JSON")
}

fn current_dir_name() -> String {
    std::env::current_dir()
        .ok()
        .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default()
}
