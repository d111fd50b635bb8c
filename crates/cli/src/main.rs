use clap::Parser;
use eyre::{eyre, WrapErr};
use std::path::PathBuf;
use std::process::ExitCode;
use tes_config::{ClientConfig, ConfigLoader};
use tes_core::ApiGeneration;
use tes_utils::tracing::{init as init_tracing, verbosity_directive};

mod commands;
mod output;

use commands::Commands;

#[derive(Parser)]
#[command(name = "tes")]
#[command(about = "Submit and track tasks on a GA4GH Task Execution Service server", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $XDG_CONFIG_HOME/tes/client.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// TES server address
    #[arg(short, long, global = true, value_name = "URL")]
    server: Option<String>,

    /// API generation the server speaks (taskop, jobs, tasks)
    #[arg(short = 'g', long, global = true, value_name = "GENERATION")]
    api_generation: Option<ApiGeneration>,

    /// Read service information before any job call
    #[arg(long, global = true)]
    connect: bool,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn load_config(&self) -> eyre::Result<ClientConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.config {
            loader = loader.file(path);
        }
        let mut config = loader.load().wrap_err("failed to load configuration")?;

        if let Some(server) = &self.server {
            config.server.address = server.clone();
        }
        if let Some(generation) = self.api_generation {
            config.server.api_generation = generation;
        }
        if self.connect {
            config.server.probe_on_connect = true;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(verbosity_directive(cli.verbose))
        .map_err(|e| eyre!("failed to initialize logging: {e}"))?;

    let config = cli.load_config()?;
    let outcome = cli.command.execute(config).await?;
    Ok(outcome.into())
}
