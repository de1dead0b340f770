//! Environment commands: report prerequisite state and remove the environment.

use std::fs;
use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use mfascrape_env::{EnvStatus, EnvironmentManager, ProcessRunner};

/// `mfascrape status`
pub fn cmd_status<R: ProcessRunner>(manager: &EnvironmentManager<R>) -> Result<()> {
    let status = manager.status()?;
    print!("{}", render_status(&status));
    Ok(())
}

fn render_status(status: &EnvStatus) -> String {
    let mark = |present: bool| if present { "✓" } else { "✗" };
    let mut out = String::new();
    out.push_str(&format!("Environment: {}\n", status.env_dir.display()));
    out.push_str(&format!("Verify:      {}\n", status.verify));
    match &status.manifest {
        Some(path) => out.push_str(&format!("Manifest:    {}\n", path.display())),
        None => out.push_str("Manifest:    (missing)\n"),
    }
    out.push('\n');
    for artifact in &status.artifacts {
        out.push_str(&format!("  {} {}\n", mark(artifact.present), artifact.name));
    }
    if status.manifest_digest.is_some() {
        let stamp = match &status.stamp_digest {
            None => "no install stamp",
            Some(_) if status.stamp_current() => "install stamp matches manifest",
            Some(_) => "install stamp is stale",
        };
        out.push_str(&format!("\n  {} {}\n", mark(status.stamp_current()), stamp));
    }
    out
}

/// `mfascrape clean`
pub fn cmd_clean(env_dir: &Path, dry_run: bool, force: bool) -> Result<()> {
    let stdin = std::io::stdin();
    clean_environment(env_dir, dry_run, force, stdin.lock())
}

fn clean_environment(env_dir: &Path, dry_run: bool, force: bool, mut input: impl BufRead) -> Result<()> {
    if !env_dir.is_dir() {
        eprintln!("No environment found at {}", env_dir.display());
        return Ok(());
    }

    let size = dir_size(env_dir);
    eprintln!("🗂  Environment {} ({})", env_dir.display(), format_size(size));

    if dry_run {
        eprintln!();
        eprintln!("(Dry run: no files removed. Remove --dry-run to delete.)");
        return Ok(());
    }

    if !force {
        eprint!("\nRemove the environment? [y/N] ");
        let mut answer = String::new();
        input.read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            eprintln!("Cancelled.");
            return Ok(());
        }
    }

    fs::remove_dir_all(env_dir).with_context(|| format!("Failed to remove {}", env_dir.display()))?;
    eprintln!("✓ Removed {}, freed {}", env_dir.display(), format_size(size));
    Ok(())
}

/// Compute total size of a directory recursively.
fn dir_size(path: &Path) -> u64 {
    let mut total: u64 = 0;
    if let Ok(entries) = fs::read_dir(path) {
        for entry in entries.flatten() {
            let p = entry.path();
            if p.is_dir() {
                total += dir_size(&p);
            } else if let Ok(meta) = p.metadata() {
                total += meta.len();
            }
        }
    }
    total
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mfascrape_core::config::VerifyPolicy;
    use mfascrape_env::ArtifactState;
    use std::path::PathBuf;

    fn venv_with_files(root: &Path) -> PathBuf {
        let env = root.join("venv");
        fs::create_dir_all(env.join("bin")).unwrap();
        fs::write(env.join("bin/python"), vec![0u8; 2048]).unwrap();
        fs::write(env.join("pyvenv.cfg"), "home = /usr/bin\n").unwrap();
        env
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_dir_size_is_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let env = venv_with_files(dir.path());
        assert_eq!(dir_size(&env), 2048 + "home = /usr/bin\n".len() as u64);
    }

    #[test]
    fn test_dry_run_keeps_environment() {
        let dir = tempfile::tempdir().unwrap();
        let env = venv_with_files(dir.path());
        clean_environment(&env, true, false, &b""[..]).unwrap();
        assert!(env.exists());
    }

    #[test]
    fn test_declined_confirmation_keeps_environment() {
        let dir = tempfile::tempdir().unwrap();
        let env = venv_with_files(dir.path());
        clean_environment(&env, false, false, &b"n\n"[..]).unwrap();
        assert!(env.exists());
    }

    #[test]
    fn test_confirmed_or_forced_clean_removes_environment() {
        let dir = tempfile::tempdir().unwrap();
        let env = venv_with_files(dir.path());
        clean_environment(&env, false, false, &b"yes\n"[..]).unwrap();
        assert!(!env.exists());

        let env = venv_with_files(dir.path());
        clean_environment(&env, false, true, &b""[..]).unwrap();
        assert!(!env.exists());
    }

    #[test]
    fn test_clean_without_environment_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        clean_environment(&dir.path().join("venv"), false, true, &b""[..]).unwrap();
    }

    #[test]
    fn test_status_rendering() {
        let status = EnvStatus {
            env_dir: PathBuf::from("/proj/venv"),
            verify: VerifyPolicy::Checksum,
            manifest: Some(PathBuf::from("/proj/requirements.txt")),
            manifest_digest: Some("abc".to_string()),
            stamp_digest: Some("def".to_string()),
            artifacts: vec![
                ArtifactState {
                    name: "environment".to_string(),
                    present: true,
                },
                ArtifactState {
                    name: "package:requests".to_string(),
                    present: false,
                },
            ],
        };
        let text = render_status(&status);
        assert!(text.contains("Verify:      checksum"));
        assert!(text.contains("  ✓ environment\n"));
        assert!(text.contains("  ✗ package:requests\n"));
        assert!(text.contains("install stamp is stale"));
    }
}
