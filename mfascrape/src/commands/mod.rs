//! Command handlers.

pub mod env;
pub mod scrape;
pub mod tasks;

use std::path::Path;

use anyhow::{Context, Result};
use mfascrape_core::config::{ProjectConfig, StyleConfig, VerifyPolicy};
use mfascrape_env::{EnvironmentManager, SystemRunner};

/// Manager for `project_dir`, with environment configuration and the
/// `--verify` flag layered on top.
pub fn environment_manager(project_dir: &Path, verify: Option<VerifyPolicy>) -> Result<EnvironmentManager> {
    let mut config = ProjectConfig::from_env().context("Invalid project configuration")?;
    if let Some(policy) = verify {
        config.verify = policy;
    }
    let style = StyleConfig::from_env().context("Invalid style configuration")?;
    Ok(EnvironmentManager::new(project_dir, config, style, SystemRunner))
}
