//! Dependency manifest (`requirements.txt`): declared package names and the
//! content digest used by the checksum verification policy.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::EnvError;

/// A parsed requirements file.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    /// Normalized package names in declaration order, without duplicates.
    pub packages: Vec<String>,
    /// SHA-256 (hex) of the file bytes.
    pub digest: String,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, EnvError> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EnvError::Prerequisite {
                    artifact: "manifest".to_string(),
                    reason: format!("{} not found", path.display()),
                }
            } else {
                EnvError::io(format!("read {}", path.display()), e)
            }
        })?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(Self {
            path: path.to_path_buf(),
            packages: parse_requirements(&content),
            digest: content_digest(&bytes),
        })
    }

    pub fn declares(&self, package: &str) -> bool {
        let wanted = normalize_name(package);
        self.packages.iter().any(|p| *p == wanted)
    }
}

fn requirement_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)").expect("valid regex"))
}

/// Extract package names from requirements text.
///
/// Option lines (`-r`, `-e`, `--index-url`), comments, extras, version
/// specifiers, environment markers and direct references are ignored.
pub fn parse_requirements(content: &str) -> Vec<String> {
    let mut packages: Vec<String> = Vec::new();
    for line in content.lines() {
        let line = match line.find(" #") {
            Some(pos) => &line[..pos],
            None => line,
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }
        if let Some(caps) = requirement_name_re().captures(line) {
            let name = normalize_name(&caps[1]);
            if !packages.contains(&name) {
                packages.push(name);
            }
        }
    }
    packages
}

/// Normalize a distribution name to the form used for site-packages entries:
/// lowercase, with `-` and `.` folded to `_`.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == '.' { '_' } else { c })
        .collect()
}

pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requirements_handles_pip_syntax() {
        let content = "\
# scraper
requests==2.25.1
black>=20.8b1  # formatter
pylint
-r dev-requirements.txt
--index-url https://pypi.org/simple
Typing-Extensions[all] ; python_version < '3.8'
zope.interface @ https://example.invalid/zope.whl
requests
";
        assert_eq!(
            parse_requirements(content),
            vec!["requests", "black", "pylint", "typing_extensions", "zope_interface"]
        );
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("PyYAML"), "pyyaml");
        assert_eq!(normalize_name("typing-extensions"), "typing_extensions");
        assert_eq!(normalize_name("zope.interface"), "zope_interface");
    }

    #[test]
    fn test_load_computes_digest_and_declares() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("requirements.txt");
        std::fs::write(&path, "requests\nblack\n").unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.digest.len(), 64);
        assert!(manifest.declares("Black"));
        assert!(!manifest.declares("pylint"));

        std::fs::write(&path, "requests\nblack\npylint\n").unwrap();
        let changed = Manifest::load(&path).unwrap();
        assert_ne!(manifest.digest, changed.digest);
    }

    #[test]
    fn test_load_missing_manifest_is_prerequisite_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Manifest::load(&tmp.path().join("requirements.txt")).unwrap_err();
        match err {
            EnvError::Prerequisite { artifact, .. } => assert_eq!(artifact, "manifest"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
