//! On-disk layout of a Python virtual environment.

use std::path::{Path, PathBuf};

use crate::manifest::normalize_name;

/// Paths inside an environment directory (POSIX `bin/` + `lib/pythonX.Y/`,
/// or Windows `Scripts/` + `Lib/`).
#[derive(Debug, Clone)]
pub struct EnvLayout {
    env_dir: PathBuf,
}

impl EnvLayout {
    pub fn new(env_dir: impl Into<PathBuf>) -> Self {
        Self {
            env_dir: env_dir.into(),
        }
    }

    pub fn env_dir(&self) -> &Path {
        &self.env_dir
    }

    /// The environment exists when its directory does; nothing else is checked.
    pub fn exists(&self) -> bool {
        self.env_dir.is_dir()
    }

    /// Interpreter inside the environment. Falls back to the platform's
    /// conventional location when the environment is not built yet.
    pub fn python(&self) -> PathBuf {
        let posix = self.env_dir.join("bin").join("python");
        let windows = self.env_dir.join("Scripts").join("python.exe");
        if posix.exists() {
            posix
        } else if windows.exists() || cfg!(windows) {
            windows
        } else {
            posix
        }
    }

    /// All site-packages directories present in the environment.
    pub fn site_packages(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        let windows = self.env_dir.join("Lib").join("site-packages");
        if windows.is_dir() {
            dirs.push(windows);
        }
        if let Ok(entries) = std::fs::read_dir(self.env_dir.join("lib")) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                if !name.to_string_lossy().starts_with("python") {
                    continue;
                }
                let site = entry.path().join("site-packages");
                if site.is_dir() {
                    dirs.push(site);
                }
            }
        }
        dirs.sort();
        dirs
    }

    /// Locate the installed-package marker for `package`: its import
    /// directory, a single-module file, or its `.dist-info` / `.egg-info`.
    pub fn find_package(&self, package: &str) -> Option<PathBuf> {
        let wanted = normalize_name(package);
        for site in self.site_packages() {
            let Ok(entries) = std::fs::read_dir(&site) else {
                continue;
            };
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                if marker_matches(&name, &wanted) {
                    return Some(entry.path());
                }
            }
        }
        None
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.find_package(package).is_some()
    }
}

fn marker_matches(entry: &str, wanted: &str) -> bool {
    if let Some(meta) = entry
        .strip_suffix(".dist-info")
        .or_else(|| entry.strip_suffix(".egg-info"))
    {
        let dist = meta.split('-').next().unwrap_or(meta);
        return normalize_name(dist) == wanted;
    }
    let module = entry.strip_suffix(".py").unwrap_or(entry);
    normalize_name(module) == wanted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_env_has_no_site_packages() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = EnvLayout::new(tmp.path().join("venv"));
        assert!(!layout.exists());
        assert!(layout.site_packages().is_empty());
        assert!(!layout.has_package("requests"));
    }

    #[test]
    fn test_python_prefers_existing_interpreter() {
        let tmp = tempfile::tempdir().unwrap();
        let env = tmp.path().join("venv");
        fs::create_dir_all(env.join("Scripts")).unwrap();
        fs::write(env.join("Scripts").join("python.exe"), "").unwrap();
        let layout = EnvLayout::new(&env);
        assert_eq!(layout.python(), env.join("Scripts").join("python.exe"));
    }

    #[test]
    fn test_find_package_by_dir_module_and_dist_info() {
        let tmp = tempfile::tempdir().unwrap();
        let env = tmp.path().join("venv");
        let site = env.join("lib").join("python3.7").join("site-packages");
        fs::create_dir_all(site.join("requests")).unwrap();
        fs::create_dir_all(site.join("PyYAML-6.0.dist-info")).unwrap();
        fs::write(site.join("six.py"), "").unwrap();
        let layout = EnvLayout::new(&env);

        assert_eq!(layout.site_packages(), vec![site.clone()]);
        assert_eq!(layout.find_package("requests"), Some(site.join("requests")));
        assert!(layout.has_package("pyyaml"));
        assert!(layout.has_package("six"));
        assert!(!layout.has_package("black"));
    }

    #[test]
    fn test_marker_matches() {
        assert!(marker_matches("black-23.1.0.dist-info", "black"));
        assert!(marker_matches("typing_extensions-4.0.1.dist-info", "typing_extensions"));
        assert!(marker_matches("pylint", "pylint"));
        assert!(!marker_matches("pylint_venv", "pylint"));
        assert!(!marker_matches("blackd-1.0.dist-info", "black"));
    }
}
