use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use complaint_intake::api::client::{http_client, HttpConversationClient};
use complaint_intake::api::routes::Endpoints;
use complaint_intake::commands;
use complaint_intake::config::Config;
use complaint_intake::suggest::{EntityType, HttpSuggestionClient};
use complaint_intake::tui;
use complaint_intake::ui::conversation::ConversationManager;

#[derive(Parser)]
#[command(name = "complaint-intake")]
#[command(version)]
#[command(about = "Terminal client for the complaint intake wizard", long_about = None)]
struct Cli {
    /// Wizard server URL
    #[arg(long, global = true)]
    server: Option<String>,

    /// Entry path; `/v2` selects the versioned API
    #[arg(long, global = true)]
    path: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up suggestions once
    Suggest {
        /// company, address or fio
        entity: EntityType,
        query: String,
    },
    /// Print the current conversation
    Transcript,
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration file
    Init,
}

impl Cli {
    fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn init_tracing(cli: &Cli, config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    if cli.command.is_some() {
        fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
        return Ok(());
    }

    // The terminal belongs to the UI; logs go to a file
    fs::create_dir_all(&config.home).context("Failed to create application directory")?;
    let log_path = config.log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

async fn run_wizard(config: Config) -> Result<()> {
    let endpoints = Endpoints::new(&config.server_url, &config.entry_path)
        .with_context(|| format!("Invalid server URL: {}", config.server_url))?;
    let client = http_client(config.request_timeout()).context("Failed to build HTTP client")?;
    let api = Arc::new(HttpConversationClient::new(client.clone(), endpoints.clone()));
    let source = Arc::new(HttpSuggestionClient::new(client, endpoints.clone()));
    tracing::info!(server = %config.server_url, version = ?endpoints.version(), "Starting wizard");

    tui::run(|events| ConversationManager::new(&config, api, source, endpoints, events)).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?.with_overrides(cli.server.clone(), cli.path.clone());
    init_tracing(&cli, &config)?;

    match cli.command {
        None => run_wizard(config).await,
        Some(Commands::Suggest { entity, query }) => commands::suggest(&config, entity, &query).await,
        Some(Commands::Transcript) => commands::transcript(&config).await,
        Some(Commands::Config { action: ConfigAction::Init }) => commands::config_init(&config),
    }
}
