//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use deploynote_core::pipeline::{self, PipelineConfig, Progress};
use deploynote_core::store::{StoreConfig, StoreOutcome};
use deploynote_github::{CommitIdentity, GitHubClient};
use deploynote_model::{ChatClient, ModelParams};
use deploynote_shared::{
    AppConfig, RepoTarget, github_token, init_config, load_config, model_api_key,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// deploynote — deploy notes for pull requests.
#[derive(Parser)]
#[command(
    name = "deploynote",
    version,
    about = "Generate a deploy note for a pull request, commit it to the branch, and post it as a comment.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate the deploy note for a pull request.
    Generate {
        /// Pull request number.
        #[arg(long, env = "PR_NUMBER")]
        pr: u64,

        /// Repository as owner/name.
        #[arg(long, env = "REPOSITORY")]
        repo: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "deploynote=info",
        1 => "deploynote=debug",
        _ => "deploynote=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate { pr, repo } => cmd_generate(pr, &repo).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(pr: u64, repo: &str) -> Result<()> {
    // Validate credentials before any network call
    let config = load_config()?;
    let token = github_token(&config)?;
    let api_key = model_api_key(&config)?;

    let target = RepoTarget::parse(repo)?;

    let host = GitHubClient::new(&config.github.api_base, target.clone(), token)?;
    let model = ChatClient::new(
        &config.model.base_url,
        api_key,
        ModelParams {
            model: config.model.model.clone(),
            temperature: config.model.temperature,
            max_tokens: config.model.max_tokens,
        },
    )?;

    let pipeline_config = PipelineConfig {
        pr_number: pr,
        store: StoreConfig {
            notes_dir: config.notes.dir.clone(),
            identity: CommitIdentity {
                name: config.github.committer_name.clone(),
                email: config.github.committer_email.clone(),
            },
        },
    };

    info!(pr, repo = %target, "generating deploy note");

    let reporter = CliProgress::new();
    let report =
        pipeline::generate_deploy_note(&pipeline_config, &host, &model, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Deploy note {}!", describe(report.outcome));
    println!("  PR:     #{pr} ({target})");
    println!("  Path:   {}", report.note_path);
    println!("  Time:   {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn describe(outcome: StoreOutcome) -> &'static str {
    match outcome {
        StoreOutcome::Created => "created",
        StoreOutcome::Updated => "updated",
        StoreOutcome::Unchanged => "unchanged, no commit needed",
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Progress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }
}
