//! `run`, `format`, `lint` and `setup`.

use anyhow::Result;
use mfascrape_env::{EnvironmentManager, ProcessRunner, Resolution};

fn report(resolution: &Resolution) {
    let created = resolution.created();
    if !created.is_empty() {
        tracing::info!("Prepared {}", created.join(", "));
    }
}

pub fn cmd_run<R: ProcessRunner>(manager: &EnvironmentManager<R>, args: &[String]) -> Result<()> {
    report(&manager.run(args)?);
    Ok(())
}

pub fn cmd_format<R: ProcessRunner>(manager: &EnvironmentManager<R>) -> Result<()> {
    report(&manager.format()?);
    Ok(())
}

pub fn cmd_lint<R: ProcessRunner>(manager: &EnvironmentManager<R>) -> Result<()> {
    report(&manager.lint()?);
    Ok(())
}

/// `mfascrape setup`
pub fn cmd_setup<R: ProcessRunner>(manager: &EnvironmentManager<R>) -> Result<()> {
    let resolution = manager.ensure_dependencies()?;
    if resolution.created().is_empty() {
        eprintln!("✓ Environment already up to date at {}", manager.layout().env_dir().display());
    } else {
        eprintln!(
            "✓ Environment ready at {} (created: {})",
            manager.layout().env_dir().display(),
            resolution.created().join(", ")
        );
    }
    Ok(())
}
