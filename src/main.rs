use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use meeting_notes_gen::config::{FanInOrder, Verbosity, DEFAULT_BASE_BRANCH, DEFAULT_LABEL};
use meeting_notes_gen::{
    render, Config, Digest, GitHubClient, OutputFormat, Pipeline, PipelineConfig,
    RepoSlug, ReportWindow,
};

#[derive(Parser, Debug)]
#[command(name = "meeting-notes-gen")]
#[command(version = "0.1.0")]
#[command(about = "A tool to generate ceph perf meeting notes")]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Enable trace logging, including every classification decision
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate notes
    Gen(GenArgs),
}

#[derive(ClapArgs, Debug)]
struct GenArgs {
    /// GitHub token used to scrape the list of pull requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository to scrape, as owner/name
    #[arg(long, default_value = "ceph/ceph")]
    repo: String,

    /// Start of the reporting window (YYYY-MM-DD), defaults to a week ago
    #[arg(long)]
    since: Option<String>,

    /// Number of pages of 100 pull requests to scan
    #[arg(long, default_value = "5")]
    pages: u32,

    /// Only pull requests carrying this label are reported
    #[arg(long, default_value = DEFAULT_LABEL)]
    label: String,

    /// Only pull requests merging into this branch are scanned
    #[arg(long, default_value = DEFAULT_BASE_BRANCH)]
    base: String,

    /// Maximum pages fetched at once (overrides CONCURRENCY_LIMIT)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Abort the run after this many seconds (overrides RUN_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// List pull requests in page order instead of arrival order
    #[arg(long)]
    ordered: bool,

    /// Output format (text, markdown, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Hide the page progress bar
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.debug, cli.trace);

    // Logs go to stderr so the report can be piped
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(verbosity.directive().parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    let Command::Gen(args) = cli.command;
    match generate(args, verbosity).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!("Command failed ({}): {}", e.class(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn generate(args: GenArgs, verbosity: Verbosity) -> meeting_notes_gen::Result<()> {
    // Validate everything before touching the network
    let window = match args.since.as_deref() {
        Some(since) => ReportWindow::parse(since)?,
        None => ReportWindow::days_before(Utc::now(), 7),
    };
    let repo = RepoSlug::parse(&args.repo)?;
    let format: OutputFormat = args.format.parse()?;

    let mut config = Config::load(args.token)?;
    if let Some(limit) = args.concurrency {
        config.concurrency_limit = limit;
    }
    if let Some(secs) = args.timeout_secs {
        config.run_timeout = Duration::from_secs(secs);
    }

    let pipeline_config = PipelineConfig {
        pages: args.pages,
        label: args.label,
        ordering: if args.ordered {
            FanInOrder::PageOrder
        } else {
            FanInOrder::Arrival
        },
        show_progress: !args.no_progress && verbosity == Verbosity::Info,
        ..PipelineConfig::from(&config)
    };

    let github = GitHubClient::new(&config.github_token, repo.clone())?
        .with_base_url(config.api_url.clone())
        .with_base_branch(args.base);

    tracing::info!("Collecting pull requests for {} since {}", repo, window);
    let output = Pipeline::new(Arc::new(github), window, pipeline_config)
        .run()
        .await?;

    let digest = Digest {
        generated_on: Utc::now().date_naive(),
        repo,
        window,
        buckets: output.buckets,
    };
    let report = render(&digest, format)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &report)?;
        tracing::info!("Output written to: {}", path);
    } else {
        print!("{}", report);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meeting_notes_gen::Error;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["meeting-notes-gen", "gen", "--token", "t"]).unwrap();
        let Command::Gen(args) = cli.command;
        assert_eq!(args.repo, "ceph/ceph");
        assert_eq!(args.pages, 5);
        assert_eq!(args.label, "performance");
        assert_eq!(args.base, "main");
        assert!(args.since.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_debug_is_global() {
        let cli = Cli::try_parse_from(["meeting-notes-gen", "gen", "--debug", "--pages", "2"]).unwrap();
        assert!(cli.debug);
        let Command::Gen(args) = cli.command;
        assert_eq!(args.pages, 2);
    }

    #[tokio::test]
    async fn test_invalid_since_fails_before_any_request() {
        let cli = Cli::try_parse_from([
            "meeting-notes-gen",
            "gen",
            "--token",
            "t",
            "--since",
            "last week",
        ])
        .unwrap();
        let Command::Gen(args) = cli.command;

        let err = generate(args, Verbosity::Info).await.unwrap_err();
        assert!(matches!(err, Error::InvalidWindow(_)));
    }
}
