//! agentd CLI - Supervise a single worker process
//!
//! Runs the HTTP control server that starts and stops the worker, and
//! talks to a running server from the command line.

mod commands;
mod server;
mod signals;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use commands::config::Overrides;
use commands::remote::Action;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "agentd")]
#[command(author, version, about = "Supervise a single long-running worker process")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the config file (default: ~/.agentd/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Control server URL used by the client commands
    #[arg(long, global = true, default_value = "http://127.0.0.1:8000")]
    url: String,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control server (default)
    Serve(WorkerArgs),

    /// Ask the server to start the worker
    Start,

    /// Ask the server to stop the worker
    #[command(alias = "stop")]
    Close,

    /// Check that the control server is up
    Health,

    /// Show the worker phase and pid
    Status,

    /// Show the resolved configuration
    Config(ConfigArgs),
}

#[derive(Args)]
struct WorkerArgs {
    /// Address to listen on, e.g. 127.0.0.1:8000
    #[arg(long)]
    listen: Option<String>,

    /// Worker executable
    #[arg(long)]
    program: Option<String>,

    /// Worker argument (repeatable)
    #[arg(long = "arg", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Worker working directory
    #[arg(long)]
    workdir: Option<PathBuf>,
}

#[derive(Args)]
struct ConfigArgs {
    #[command(flatten)]
    worker: WorkerArgs,

    /// Write the resolved configuration back to the config file
    #[arg(long)]
    save: bool,
}

impl From<WorkerArgs> for Overrides {
    fn from(args: WorkerArgs) -> Self {
        Self {
            listen: args.listen,
            program: args.program,
            args: args.args,
            workdir: args.workdir,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve(args)) => {
            commands::serve::run(cli.config, &args.into()).await?;
        }
        Some(Commands::Start) => {
            commands::remote::run(&cli.url, Action::Start, cli.json, cli.config).await?;
        }
        Some(Commands::Close) => {
            commands::remote::run(&cli.url, Action::Close, cli.json, cli.config).await?;
        }
        Some(Commands::Health) => {
            commands::remote::run(&cli.url, Action::Health, cli.json, cli.config).await?;
        }
        Some(Commands::Status) => {
            commands::remote::run(&cli.url, Action::Status, cli.json, cli.config).await?;
        }
        Some(Commands::Config(args)) => {
            commands::config::show(cli.config, &args.worker.into(), cli.json, args.save).await?;
        }
        None => {
            commands::serve::run(cli.config, &Overrides::default()).await?;
        }
    }

    Ok(())
}
