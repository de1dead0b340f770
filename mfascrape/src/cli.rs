use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mfascrape_core::config::VerifyPolicy;

/// Environment manager and Pushshift scraper for the /r/malefashionadvice Daily Questions threads
#[derive(Parser, Debug)]
#[command(name = "mfascrape")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project directory holding the manifest, the script and the environment
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// How installed packages are verified: existence or checksum (default: from env or existence)
    #[arg(long, global = true, value_name = "POLICY")]
    pub verify: Option<VerifyPolicy>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scraper script inside the environment
    Run {
        /// Arguments passed to the script (after `--`)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
        args: Vec<String>,
    },

    /// Format the sources with black
    #[command(visible_aliases = ["black", "b"])]
    Format,

    /// Lint the sources with pylint
    #[command(visible_aliases = ["pylint", "l"])]
    Lint,

    /// Create the environment and install the manifest without running anything
    Setup,

    /// Show which prerequisites are present
    Status,

    /// Remove the environment directory
    Clean {
        /// Show what would be removed without deleting
        #[arg(long)]
        dry_run: bool,

        /// Force removal without confirmation
        #[arg(long, short)]
        force: bool,
    },

    /// Capture the Daily Questions threads from Pushshift into TSV files
    Scrape {
        /// Results file, appended to while fetching
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,

        /// Deduplicated copy of the results
        #[arg(long, short = 'd', value_name = "FILE")]
        deduplicated: Option<PathBuf>,

        /// Header-only columns file
        #[arg(long, short = 'c', value_name = "FILE")]
        columns: Option<PathBuf>,

        /// Pushshift API base URL
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },
}
