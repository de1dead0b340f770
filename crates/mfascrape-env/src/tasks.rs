//! The user-invocable actions and what each needs before it may run.

use std::fmt;
use std::path::{Path, PathBuf};

use mfascrape_core::config::StyleConfig;

use crate::builder::{package_artifact, DEPENDENCIES, ENVIRONMENT};
use crate::process::Invocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Execute the target script with the environment's interpreter.
    Run,
    /// Rewrite the source set in place with the formatter.
    Format,
    /// Report diagnostics for the source set with the linter.
    Lint,
}

impl Task {
    pub fn name(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Format => "format",
            Self::Lint => "lint",
        }
    }

    /// Artifacts that must exist before the task's tool is spawned.
    pub fn prerequisites(self, style: &StyleConfig) -> Vec<String> {
        match self {
            Self::Run => vec![ENVIRONMENT.to_string(), DEPENDENCIES.to_string()],
            Self::Format => vec![ENVIRONMENT.to_string(), package_artifact(&style.formatter)],
            Self::Lint => vec![ENVIRONMENT.to_string(), package_artifact(&style.linter)],
        }
    }

    /// Command line for the task. `python` is the environment's interpreter.
    pub fn invocation(
        self,
        python: &Path,
        project_dir: &Path,
        script: &Path,
        sources: &[PathBuf],
        style: &StyleConfig,
        extra_args: &[String],
    ) -> Invocation {
        let sources = sources.iter().map(|s| s.display().to_string());
        let invocation = match self {
            Self::Run => Invocation::new(script.display().to_string(), python)
                .arg(script.display().to_string())
                .args(extra_args.iter().cloned()),
            Self::Format => Invocation::new(style.formatter.clone(), python)
                .args(["-m", style.formatter.as_str()])
                .args(["--target-version", style.target_version.as_str()])
                .args(["--line-length".to_string(), style.line_length.to_string()])
                .args(sources),
            Self::Lint => Invocation::new(style.linter.clone(), python)
                .args(["-m", style.linter.as_str()])
                .arg(format!("--max-line-length={}", style.line_length))
                .args(sources),
        };
        invocation.current_dir(project_dir)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> Vec<PathBuf> {
        vec![PathBuf::from("scrape_mfa.py")]
    }

    #[test]
    fn test_prerequisites() {
        let style = StyleConfig::default();
        assert_eq!(Task::Run.prerequisites(&style), vec!["environment", "dependencies"]);
        assert_eq!(Task::Format.prerequisites(&style), vec!["environment", "package:black"]);
        assert_eq!(Task::Lint.prerequisites(&style), vec!["environment", "package:pylint"]);
    }

    #[test]
    fn test_format_invocation_uses_fixed_style() {
        let style = StyleConfig::default();
        let inv = Task::Format.invocation(
            Path::new("venv/bin/python"),
            Path::new("/project"),
            Path::new("scrape_mfa.py"),
            &sources(),
            &style,
            &[],
        );
        assert_eq!(inv.label, "black");
        assert_eq!(
            inv.command_line(),
            "venv/bin/python -m black --target-version py37 --line-length 79 scrape_mfa.py"
        );
        assert_eq!(inv.cwd, PathBuf::from("/project"));
    }

    #[test]
    fn test_lint_invocation_enforces_line_length() {
        let inv = Task::Lint.invocation(
            Path::new("venv/bin/python"),
            Path::new("/project"),
            Path::new("scrape_mfa.py"),
            &sources(),
            &StyleConfig::default(),
            &[],
        );
        assert_eq!(
            inv.command_line(),
            "venv/bin/python -m pylint --max-line-length=79 scrape_mfa.py"
        );
    }

    #[test]
    fn test_run_invocation_passes_extra_args() {
        let inv = Task::Run.invocation(
            Path::new("venv/bin/python"),
            Path::new("/project"),
            Path::new("scrape_mfa.py"),
            &sources(),
            &StyleConfig::default(),
            &["-o".to_string(), "out.tsv".to_string()],
        );
        assert_eq!(inv.label, "scrape_mfa.py");
        assert_eq!(inv.args, vec!["scrape_mfa.py", "-o", "out.tsv"]);
    }
}
