//! Configuration structs grouped by concern, loaded from the environment.

use super::env_keys::{observability as obv_keys, project, scrape, style};
use super::loader::{env_bool, env_list, env_optional, env_or, load_dotenv};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while interpreting configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: expected {expected}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// How an installed-package marker is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyPolicy {
    /// The marker directory existing is proof of a complete installation.
    #[default]
    Existence,
    /// The marker must exist and the install stamp must match the manifest digest.
    Checksum,
}

impl FromStr for VerifyPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "existence" | "exists" => Ok(Self::Existence),
            "checksum" | "hash" | "sha256" => Ok(Self::Checksum),
            _ => Err(ConfigError::Invalid {
                key: project::MFASCRAPE_VERIFY,
                value: s.to_string(),
                expected: "existence | checksum",
            }),
        }
    }
}

impl fmt::Display for VerifyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Existence => f.write_str("existence"),
            Self::Checksum => f.write_str("checksum"),
        }
    }
}

/// Project layout: where the environment, manifest and sources live.
/// Relative paths are resolved against the project directory.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub env_dir: PathBuf,
    pub manifest: PathBuf,
    pub script: PathBuf,
    pub sources: Vec<PathBuf>,
    /// Host interpreter override; `None` means search `PATH`.
    pub python: Option<PathBuf>,
    pub verify: VerifyPolicy,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            env_dir: PathBuf::from("venv"),
            manifest: PathBuf::from("requirements.txt"),
            script: PathBuf::from("scrape_mfa.py"),
            sources: vec![PathBuf::from("scrape_mfa.py")],
            python: None,
            verify: VerifyPolicy::Existence,
        }
    }
}

impl ProjectConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        let defaults = Self::default();
        let script = env_optional(project::MFASCRAPE_SCRIPT, &[])
            .map(PathBuf::from)
            .unwrap_or(defaults.script);
        // The source set follows the script unless listed explicitly.
        let sources = env_list(project::MFASCRAPE_SOURCES, &[])
            .filter(|list| !list.is_empty())
            .map(|list| list.into_iter().map(PathBuf::from).collect())
            .unwrap_or_else(|| vec![script.clone()]);
        let verify = match env_optional(project::MFASCRAPE_VERIFY, &[]) {
            Some(v) => v.parse()?,
            None => VerifyPolicy::default(),
        };
        Ok(Self {
            env_dir: env_optional(project::MFASCRAPE_ENV_DIR, project::ENV_DIR_ALIASES)
                .map(PathBuf::from)
                .unwrap_or(defaults.env_dir),
            manifest: env_optional(project::MFASCRAPE_MANIFEST, &[])
                .map(PathBuf::from)
                .unwrap_or(defaults.manifest),
            script,
            sources,
            python: env_optional(project::MFASCRAPE_PYTHON, project::PYTHON_ALIASES)
                .map(PathBuf::from),
            verify,
        })
    }
}

/// Formatter and linter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleConfig {
    /// Package (and module) name of the formatter.
    pub formatter: String,
    /// Package (and module) name of the linter.
    pub linter: String,
    pub target_version: String,
    pub line_length: u16,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            formatter: "black".to_string(),
            linter: "pylint".to_string(),
            target_version: "py37".to_string(),
            line_length: 79,
        }
    }
}

impl StyleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        let defaults = Self::default();
        let line_length = match env_optional(style::MFASCRAPE_LINE_LENGTH, &[]) {
            Some(v) => parse_line_length(&v)?,
            None => defaults.line_length,
        };
        Ok(Self {
            formatter: env_or(style::MFASCRAPE_FORMATTER, &[], || defaults.formatter),
            linter: env_or(style::MFASCRAPE_LINTER, &[], || defaults.linter),
            target_version: env_or(style::MFASCRAPE_TARGET_VERSION, &[], || {
                defaults.target_version
            }),
            line_length,
        })
    }
}

fn parse_line_length(value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::Invalid {
            key: style::MFASCRAPE_LINE_LENGTH,
            value: value.to_string(),
            expected: "a positive integer",
        })
}

/// Pushshift scraper settings.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub output_file: PathBuf,
    pub deduplicated_file: PathBuf,
    pub columns_file: PathBuf,
    pub http_timeout_secs: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.pushshift.io".to_string(),
            output_file: PathBuf::from("./scrape_mfa_results.tsv"),
            deduplicated_file: PathBuf::from("./scrape_mfa_results.deduplicated.tsv"),
            columns_file: PathBuf::from("./columns.tsv"),
            http_timeout_secs: 30,
        }
    }
}

impl ScrapeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        let defaults = Self::default();
        let http_timeout_secs = match env_optional(scrape::MFASCRAPE_HTTP_TIMEOUT_SECS, &[]) {
            Some(v) => parse_timeout_secs(&v)?,
            None => defaults.http_timeout_secs,
        };
        Ok(Self {
            base_url: env_or(
                scrape::MFASCRAPE_PUSHSHIFT_URL,
                scrape::PUSHSHIFT_URL_ALIASES,
                || defaults.base_url,
            )
            .trim_end_matches('/')
            .to_string(),
            output_file: env_optional(scrape::MFASCRAPE_OUTPUT_FILE, &[])
                .map(PathBuf::from)
                .unwrap_or(defaults.output_file),
            deduplicated_file: env_optional(scrape::MFASCRAPE_DEDUPLICATED_FILE, &[])
                .map(PathBuf::from)
                .unwrap_or(defaults.deduplicated_file),
            columns_file: env_optional(scrape::MFASCRAPE_COLUMNS_FILE, &[])
                .map(PathBuf::from)
                .unwrap_or(defaults.columns_file),
            http_timeout_secs,
        })
    }
}

fn parse_timeout_secs(value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::Invalid {
            key: scrape::MFASCRAPE_HTTP_TIMEOUT_SECS,
            value: value.to_string(),
            expected: "a positive number of seconds",
        })
}

/// Observability: quiet, log_level, log_json, audit_log.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
    pub audit_log: Option<String>,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            load_dotenv();
            Self {
                quiet: env_bool(obv_keys::MFASCRAPE_QUIET, &[], false),
                log_level: env_or(obv_keys::MFASCRAPE_LOG_LEVEL, &[], || {
                    "mfascrape=info".to_string()
                }),
                log_json: env_bool(obv_keys::MFASCRAPE_LOG_JSON, &[], false),
                audit_log: env_optional(obv_keys::MFASCRAPE_AUDIT_LOG, &[]),
            }
        })
    }
}
