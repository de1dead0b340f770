//! Process seam: every external command (venv creation, pip, the script,
//! the formatter, the linter) goes through a `ProcessRunner`.
//!
//! Children inherit stdio, so their diagnostics reach the user verbatim.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::error::EnvError;

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Short name used in logs, audit records and errors (e.g. "pylint").
    pub label: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(label: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
            cwd: PathBuf::from("."),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = dir.to_path_buf();
        self
    }

    /// Shell-like rendering for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs an invocation to completion and reports its exit status.
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<i32, EnvError>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<i32, EnvError> {
        (**self).run(invocation)
    }
}

/// Spawns real processes with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<i32, EnvError> {
        tracing::debug!(cmd = %invocation.command_line(), cwd = %invocation.cwd.display(), "spawn");
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .status()
            .map_err(|source| EnvError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;
        Ok(exit_code(status))
    }
}

/// Exit status as the invoking shell would report it (128 + signal when killed).
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder_and_command_line() {
        let inv = Invocation::new("black", "venv/bin/python")
            .args(["-m", "black"])
            .arg("scrape_mfa.py")
            .current_dir(Path::new("/project"));
        assert_eq!(inv.args, vec!["-m", "black", "scrape_mfa.py"]);
        assert_eq!(inv.cwd, PathBuf::from("/project"));
        assert_eq!(inv.command_line(), "venv/bin/python -m black scrape_mfa.py");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_exit_status() {
        let tmp = tempfile::tempdir().unwrap();
        let ok = Invocation::new("sh", "sh").args(["-c", "exit 0"]).current_dir(tmp.path());
        let failing = Invocation::new("sh", "sh").args(["-c", "exit 3"]).current_dir(tmp.path());
        assert_eq!(SystemRunner.run(&ok).unwrap(), 0);
        assert_eq!(SystemRunner.run(&failing).unwrap(), 3);
    }

    #[test]
    fn test_system_runner_spawn_failure() {
        let inv = Invocation::new("missing", "/definitely/not/a/real/binary");
        let err = SystemRunner.run(&inv).unwrap_err();
        assert!(matches!(err, EnvError::Spawn { .. }));
    }
}
