//! `mfascrape scrape`: the native Pushshift capture with automatic restarts.

use std::time::Duration;

use anyhow::Result;
use mfascrape_core::config::ScrapeConfig;
use mfascrape_pushshift::{
    retry_with_schedule, HttpApi, ScrapePaths, ScrapeSettings, Scraper, RESTART_DELAYS_SECS,
};

pub fn cmd_scrape(config: &ScrapeConfig) -> Result<()> {
    let api = HttpApi::new(&config.base_url, Duration::from_secs(config.http_timeout_secs));
    let scraper = Scraper::new(api, ScrapeSettings::default(), ScrapePaths::from(config));

    match retry_with_schedule(&RESTART_DELAYS_SECS, || scraper.scrape_once(), std::thread::sleep) {
        Ok(summary) => {
            tracing::info!(
                written = summary.comments_written,
                unique = summary.unique_comments,
                "Process complete"
            );
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("Too many restarts. Aborting")),
    }
}
