//! Environment variable loading.
//!
//! Keeps the fallback chains in one place so callers never repeat `or_else`
//! ladders over `std::env::var`.

use std::env;
use std::path::Path;

/// Legacy variable → preferred variable.
const DEPRECATED_PAIRS: &[(&str, &str)] = &[
    ("VENV", "MFASCRAPE_ENV_DIR"),
    ("PYTHON", "MFASCRAPE_PYTHON"),
    ("PUSHSHIFT_URL", "MFASCRAPE_PUSHSHIFT_URL"),
];

/// Print a single migration hint when a legacy name is set and its
/// replacement is not.
fn warn_deprecated_env_vars() {
    use std::sync::Once;
    static WARNED: Once = Once::new();
    WARNED.call_once(|| {
        let hints: Vec<String> = DEPRECATED_PAIRS
            .iter()
            .filter(|(deprecated, recommended)| {
                env::var(deprecated).is_ok() && env::var(recommended).is_err()
            })
            .map(|(deprecated, recommended)| format!("{} → {}", deprecated, recommended))
            .collect();
        if !hints.is_empty() {
            tracing::warn!(
                "[DEPRECATED] legacy environment variables in use, prefer:\n   {}",
                hints.join("\n   ")
            );
        }
    });
}

/// Parse `.env` content into key/value pairs.
///
/// Blank lines and `#` comments are skipped, an unquoted trailing `# comment`
/// is stripped, and one level of matching single or double quotes is removed.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(eq_pos) = line.find('=') else {
            continue;
        };
        let key = line[..eq_pos].trim();
        let mut value = line[eq_pos + 1..].trim();
        if let Some(hash_pos) = value.find('#') {
            let before_hash = value[..hash_pos].trim_end();
            if !before_hash.contains('"') && !before_hash.contains('\'') {
                value = before_hash;
            }
        }
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs
}

/// Load `<dir>/.env` into the process environment without overriding
/// variables that are already set. Missing files are ignored.
pub fn load_dotenv_from_dir(dir: &Path) {
    let Ok(content) = std::fs::read_to_string(dir.join(".env")) else {
        return;
    };
    for (key, value) in parse_dotenv(&content) {
        if env::var(&key).is_err() {
            // SAFETY: called during single-threaded startup, before any
            // tool process is spawned.
            #[allow(unsafe_code)]
            unsafe {
                env::set_var(&key, &value);
            }
        }
    }
}

/// Load `.env` from the current directory, once per process.
pub fn load_dotenv() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let dir = env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
        load_dotenv_from_dir(&dir);
        warn_deprecated_env_vars();
    });
}

fn lookup(primary: &str, aliases: &[&str]) -> Option<String> {
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
}

/// Read the primary variable or the first set alias, falling back to `default`.
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    lookup(primary, aliases)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default)
}

/// Read the primary variable or an alias; empty values count as unset.
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    lookup(primary, aliases).and_then(|s| {
        let s = s.trim().to_string();
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    })
}

/// Boolean variable: `0/false/no/off` are false, anything else set is true.
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    match lookup(primary, aliases).as_deref() {
        Some(s) => parse_bool(s),
        None => default,
    }
}

/// Comma separated list; empty entries are dropped. `None` when unset.
pub fn env_list(primary: &str, aliases: &[&str]) -> Option<Vec<String>> {
    env_optional(primary, aliases).map(|s| split_list(&s))
}

pub(crate) fn parse_bool(s: &str) -> bool {
    !matches!(s.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off")
}

pub(crate) fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
