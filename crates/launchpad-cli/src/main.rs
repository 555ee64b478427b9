mod deploy;
mod status;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use launchpad_config::{AppConfig, ConfigLoader, ProcessEnv};
use launchpad_migrate::{MigrationEngine, SourceDirectory};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "launchpad", version, about = "Run migrations and deployment preflight")]
struct Cli {
    /// Config file (YAML or TOML). Defaults to launchpad.{yml,yaml,toml}.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the migrations directory with example migrations if missing.
    Init,
    /// Show applied, pending and orphaned migrations.
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Run all pending migrations.
    Migrate,
    /// Validate the deployment environment, then run migrations.
    Deploy,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Init => println!("{}", init(&config)?),
        Command::Status { json } => {
            let engine = engine(&config)?;
            let status = engine.status()?;
            if json {
                println!("{}", status.to_json()?);
            } else {
                status::print_status(&status, engine.ledger().path());
            }
        }
        Command::Migrate => {
            let report = engine(&config)?.run()?;
            info!("{} migrations applied", report.applied.len());
        }
        Command::Deploy => {
            let engine = engine(&config)?;
            deploy::Deployment::new(&config, &ProcessEnv).run(&engine)?;
        }
    }

    Ok(())
}

/// Bootstrap the source directory and describe what happened.
fn init(config: &AppConfig) -> Result<String> {
    let source = SourceDirectory::new(&config.migrations.source_dir);
    let message = if source.ensure()? {
        format!("Created {} with example migrations.", source.path().display())
    } else {
        format!("{} already exists, nothing to do.", source.path().display())
    };
    Ok(message)
}

fn load_config(path: Option<&std::path::Path>) -> Result<AppConfig> {
    ConfigLoader::new(&ProcessEnv)
        .load(path)
        .context("failed to load configuration")
}

fn engine(config: &AppConfig) -> Result<MigrationEngine> {
    MigrationEngine::new(config, Box::new(ProcessEnv)).context("failed to set up migration engine")
}
