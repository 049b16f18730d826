// ABOUTME: Command-line entry point for the import console
// ABOUTME: Parses arguments, sets up logging and dispatches to connection and import commands

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use import_console::remote::ApiClient;
use import_console::{Config, CurrentUser};

mod commands;

#[derive(Parser)]
#[command(name = "import-console", version, about = "Configure connections and schedule bulk imports")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the backend API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Override the push-channel WebSocket URL
    #[arg(long, global = true)]
    ws_url: Option<String>,

    /// Override the stored current-user file
    #[arg(long, global = true)]
    user_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage CRM and VCC connections
    Connections {
        #[command(subcommand)]
        action: ConnectionCommands,
    },
    /// List, control and create import jobs
    Imports {
        #[command(subcommand)]
        action: ImportCommands,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Hubspot,
    Five9,
}

#[derive(Subcommand)]
enum ConnectionCommands {
    /// List saved connections
    List,
    /// Create a connection; secrets are prompted for
    Create {
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete connections by id
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ImportCommands {
    /// List imports with their current status
    List,
    /// Create an import with the interactive wizard
    New,
    /// Start an import
    Start { id: i64 },
    /// Stop an import
    Stop { id: i64 },
    /// Run an import once, right now
    Run { id: i64 },
    /// Delete imports by id
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,
        #[arg(short, long)]
        yes: bool,
    },
    /// Show scheduled cron expressions
    Schedules,
    /// Follow import progress live until interrupted
    Watch,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(url) = cli.ws_url {
        config.ws_url = url;
    }
    if let Some(path) = cli.user_file {
        config.user_file = path;
    }
    config.validate()?;

    let client = ApiClient::new(&config.api_base_url, config.request_timeout())
        .context("Failed to create HTTP client")?;
    let user = CurrentUser::load(&config.user_file).with_context(|| {
        format!(
            "No signed-in user found at {}. Sign in through the web console first",
            config.user_file.display()
        )
    })?;

    match cli.command {
        Commands::Connections { action } => match action {
            ConnectionCommands::List => commands::connections::list(&client, &user).await,
            ConnectionCommands::Create {
                kind,
                name,
                description,
            } => commands::connections::create(&client, &user, kind, name, description).await,
            ConnectionCommands::Delete { ids, yes } => {
                commands::connections::delete(&client, &user, &ids, yes).await
            }
        },
        Commands::Imports { action } => match action {
            ImportCommands::List => commands::imports::list(&client, &user).await,
            ImportCommands::New => commands::wizard::run(&client, &user).await,
            ImportCommands::Start { id } => commands::imports::toggle(&client, &user, id, true).await,
            ImportCommands::Stop { id } => commands::imports::toggle(&client, &user, id, false).await,
            ImportCommands::Run { id } => commands::imports::run_now(&client, id).await,
            ImportCommands::Delete { ids, yes } => {
                commands::imports::delete(&client, &user, &ids, yes).await
            }
            ImportCommands::Schedules => commands::imports::schedules(&client).await,
            ImportCommands::Watch => commands::imports::watch(&client, &user, &config).await,
        },
    }
}
