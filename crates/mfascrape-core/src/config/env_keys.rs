//! Environment variable keys and their aliases.
//!
//! Primary variables use the `MFASCRAPE_*` prefix. The Makefile-era names
//! (`VENV`, `PYTHON`) are still honoured as aliases.

/// Project layout: environment directory, manifest, script, source set.
pub mod project {
    pub const MFASCRAPE_ENV_DIR: &str = "MFASCRAPE_ENV_DIR";
    pub const ENV_DIR_ALIASES: &[&str] = &["VENV"];

    pub const MFASCRAPE_MANIFEST: &str = "MFASCRAPE_MANIFEST";

    pub const MFASCRAPE_SCRIPT: &str = "MFASCRAPE_SCRIPT";

    /// Comma separated list of files handed to the formatter and linter.
    pub const MFASCRAPE_SOURCES: &str = "MFASCRAPE_SOURCES";

    /// Host interpreter used to create the environment.
    pub const MFASCRAPE_PYTHON: &str = "MFASCRAPE_PYTHON";
    pub const PYTHON_ALIASES: &[&str] = &["PYTHON"];

    /// `existence` (default) or `checksum`.
    pub const MFASCRAPE_VERIFY: &str = "MFASCRAPE_VERIFY";
}

/// Formatter / linter settings.
pub mod style {
    pub const MFASCRAPE_FORMATTER: &str = "MFASCRAPE_FORMATTER";
    pub const MFASCRAPE_LINTER: &str = "MFASCRAPE_LINTER";
    pub const MFASCRAPE_TARGET_VERSION: &str = "MFASCRAPE_TARGET_VERSION";
    pub const MFASCRAPE_LINE_LENGTH: &str = "MFASCRAPE_LINE_LENGTH";
}

/// Pushshift scraper.
pub mod scrape {
    pub const MFASCRAPE_PUSHSHIFT_URL: &str = "MFASCRAPE_PUSHSHIFT_URL";
    pub const PUSHSHIFT_URL_ALIASES: &[&str] = &["PUSHSHIFT_URL"];

    pub const MFASCRAPE_OUTPUT_FILE: &str = "MFASCRAPE_OUTPUT_FILE";
    pub const MFASCRAPE_DEDUPLICATED_FILE: &str = "MFASCRAPE_DEDUPLICATED_FILE";
    pub const MFASCRAPE_COLUMNS_FILE: &str = "MFASCRAPE_COLUMNS_FILE";

    pub const MFASCRAPE_HTTP_TIMEOUT_SECS: &str = "MFASCRAPE_HTTP_TIMEOUT_SECS";
}

/// Observability and logging.
pub mod observability {
    pub const MFASCRAPE_QUIET: &str = "MFASCRAPE_QUIET";

    pub const MFASCRAPE_LOG_LEVEL: &str = "MFASCRAPE_LOG_LEVEL";

    pub const MFASCRAPE_LOG_JSON: &str = "MFASCRAPE_LOG_JSON";

    pub const MFASCRAPE_AUDIT_LOG: &str = "MFASCRAPE_AUDIT_LOG";
}
