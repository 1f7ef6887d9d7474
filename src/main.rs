use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use estate_crm::config::{CliOverrides, CrmConfig};

mod cmd;

#[derive(Parser)]
#[command(name = "estate-crm")]
#[command(version, about = "Real-estate CRM back-end")]
pub struct Cli {
    /// Debug-level logging (ESTATE_CRM_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML config file (defaults to ./estate-crm.toml when present)
    #[arg(long, global = true, env = "ESTATE_CRM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to serve on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Database path
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Enable dev mode (permissive CORS for a local front-end dev server)
        #[arg(long)]
        dev: bool,
    },
    /// Create the database and its tables without starting the server
    InitDb {
        /// Database path
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Load the sample data set into an empty database
    Seed {
        /// Database path
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate configuration and report problems
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // A missing .env is fine; variables may come from the real environment.
    let _ = dotenvy::dotenv();

    let overrides = match &cli.command {
        Commands::Serve {
            port,
            host,
            db_path,
            dev,
        } => CliOverrides {
            host: host.clone(),
            port: *port,
            db_path: db_path.clone(),
            dev_mode: *dev,
        },
        Commands::InitDb { db_path } | Commands::Seed { db_path } => CliOverrides {
            db_path: db_path.clone(),
            ..Default::default()
        },
        Commands::Config { .. } => CliOverrides::default(),
    };
    let config = CrmConfig::load(cli.config.as_deref())?.with_overrides(overrides);

    estate_crm::logging::init_tracing(config.log_format(), cli.verbose);

    match &cli.command {
        Commands::Serve { .. } => cmd::cmd_serve(&config).await?,
        Commands::InitDb { .. } => cmd::cmd_init_db(&config)?,
        Commands::Seed { .. } => cmd::cmd_seed(&config)?,
        Commands::Config { command } => {
            cmd::cmd_config(&config, cli.config.as_deref(), command.clone())?
        }
    }

    Ok(())
}
