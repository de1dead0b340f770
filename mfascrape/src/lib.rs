//! mfascrape CLI library: argument parsing and command dispatch.

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use mfascrape_core::config::ScrapeConfig;
use mfascrape_core::observability;

/// Parse the arguments and dispatch to the command handlers.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing();

    match cli.command {
        Commands::Run { args } => {
            let manager = commands::environment_manager(&cli.project_dir, cli.verify)?;
            commands::tasks::cmd_run(&manager, &args)?;
        }
        Commands::Format => {
            let manager = commands::environment_manager(&cli.project_dir, cli.verify)?;
            commands::tasks::cmd_format(&manager)?;
        }
        Commands::Lint => {
            let manager = commands::environment_manager(&cli.project_dir, cli.verify)?;
            commands::tasks::cmd_lint(&manager)?;
        }
        Commands::Setup => {
            let manager = commands::environment_manager(&cli.project_dir, cli.verify)?;
            commands::tasks::cmd_setup(&manager)?;
        }
        Commands::Status => {
            let manager = commands::environment_manager(&cli.project_dir, cli.verify)?;
            commands::env::cmd_status(&manager)?;
        }
        Commands::Clean { dry_run, force } => {
            let manager = commands::environment_manager(&cli.project_dir, cli.verify)?;
            commands::env::cmd_clean(manager.layout().env_dir(), dry_run, force)?;
        }
        Commands::Scrape {
            output,
            deduplicated,
            columns,
            base_url,
        } => {
            let mut config = ScrapeConfig::from_env().context("Invalid scrape configuration")?;
            if let Some(path) = output {
                config.output_file = path;
            }
            if let Some(path) = deduplicated {
                config.deduplicated_file = path;
            }
            if let Some(path) = columns {
                config.columns_file = path;
            }
            if let Some(url) = base_url {
                config.base_url = url;
            }
            commands::scrape::cmd_scrape(&config)?;
        }
    }

    Ok(())
}
