//! Environment manager: gates `run`, `format` and `lint` behind lazily
//! created prerequisites.

use std::path::{Path, PathBuf};
use std::time::Instant;

use mfascrape_core::config::{ProjectConfig, StyleConfig, VerifyPolicy};
use mfascrape_core::observability;

use crate::builder::{build_graph, package_artifact, BuildContext, DEPENDENCIES, ENVIRONMENT};
use crate::error::EnvError;
use crate::graph::Resolution;
use crate::layout::EnvLayout;
use crate::manifest::Manifest;
use crate::process::{Invocation, ProcessRunner, SystemRunner};
use crate::stamp::InstallStamp;
use crate::tasks::Task;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactState {
    pub name: String,
    pub present: bool,
}

/// Snapshot of the prerequisites, taken without creating anything.
#[derive(Debug, Clone)]
pub struct EnvStatus {
    pub env_dir: PathBuf,
    pub verify: VerifyPolicy,
    /// Manifest path, when the file exists.
    pub manifest: Option<PathBuf>,
    pub manifest_digest: Option<String>,
    pub stamp_digest: Option<String>,
    pub artifacts: Vec<ArtifactState>,
}

impl EnvStatus {
    /// Whether the last install was made from the current manifest.
    pub fn stamp_current(&self) -> bool {
        matches!((&self.manifest_digest, &self.stamp_digest), (Some(m), Some(s)) if m == s)
    }
}

pub struct EnvironmentManager<R: ProcessRunner = SystemRunner> {
    project_dir: PathBuf,
    config: ProjectConfig,
    style: StyleConfig,
    layout: EnvLayout,
    runner: R,
}

impl<R: ProcessRunner> EnvironmentManager<R> {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        config: ProjectConfig,
        style: StyleConfig,
        runner: R,
    ) -> Self {
        // Children run with the project as their working directory, so every
        // path handed to them must already be absolute.
        let project_dir = project_dir.into();
        let project_dir = std::path::absolute(&project_dir).unwrap_or(project_dir);
        let layout = EnvLayout::new(project_dir.join(&config.env_dir));
        Self {
            project_dir,
            config,
            style,
            layout,
            runner,
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn layout(&self) -> &EnvLayout {
        &self.layout
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    fn manifest_path(&self) -> PathBuf {
        self.project_dir.join(&self.config.manifest)
    }

    fn load_manifest(&self) -> Result<Manifest, EnvError> {
        Manifest::load(&self.manifest_path())
    }

    fn load_manifest_if_present(&self) -> Result<Option<Manifest>, EnvError> {
        let path = self.manifest_path();
        if path.exists() {
            Manifest::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }

    fn tool_packages(&self) -> [&str; 2] {
        [self.style.formatter.as_str(), self.style.linter.as_str()]
    }

    fn context<'a>(&'a self, manifest: Option<&'a Manifest>) -> BuildContext<'a> {
        BuildContext {
            project_dir: &self.project_dir,
            layout: &self.layout,
            manifest,
            runner: &self.runner,
            host_python: self.config.python.as_deref(),
            verify: self.config.verify,
        }
    }

    fn resolve(&self, targets: &[String], manifest: Option<&Manifest>) -> Result<Resolution, EnvError> {
        let graph = build_graph(manifest, &self.tool_packages())?;
        let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
        graph.resolve(&targets, &self.context(manifest))
    }

    /// Create the environment directory if it is absent.
    pub fn ensure_environment(&self) -> Result<Resolution, EnvError> {
        self.resolve(&[ENVIRONMENT.to_string()], None)
    }

    /// Environment plus every package the manifest declares.
    pub fn ensure_dependencies(&self) -> Result<Resolution, EnvError> {
        let manifest = self.load_manifest()?;
        self.resolve(
            &[ENVIRONMENT.to_string(), DEPENDENCIES.to_string()],
            Some(&manifest),
        )
    }

    /// Resolve the task's prerequisites, then spawn its tool.
    pub fn execute(&self, task: Task, extra_args: &[String]) -> Result<Resolution, EnvError> {
        // `run` needs the whole manifest; the tools only need their own marker.
        let manifest = match task {
            Task::Run => Some(self.load_manifest()?),
            Task::Format | Task::Lint => self.load_manifest_if_present()?,
        };
        let resolution = self.resolve(&task.prerequisites(&self.style), manifest.as_ref())?;
        let invocation = task.invocation(
            &self.layout.python(),
            &self.project_dir,
            &self.config.script,
            &self.config.sources,
            &self.style,
            extra_args,
        );
        self.invoke(task, &invocation)?;
        Ok(resolution)
    }

    pub fn run(&self, args: &[String]) -> Result<Resolution, EnvError> {
        self.execute(Task::Run, args)
    }

    pub fn format(&self) -> Result<Resolution, EnvError> {
        self.execute(Task::Format, &[])
    }

    pub fn lint(&self) -> Result<Resolution, EnvError> {
        self.execute(Task::Lint, &[])
    }

    fn invoke(&self, task: Task, invocation: &Invocation) -> Result<(), EnvError> {
        tracing::info!(task = task.name(), "{}", invocation.command_line());
        observability::audit_task_started(
            task.name(),
            &invocation.program.display().to_string(),
            &invocation.args,
            &invocation.cwd.display().to_string(),
        );
        let started = Instant::now();
        let code = self.runner.run(invocation)?;
        observability::audit_task_completed(task.name(), code, started.elapsed().as_millis() as u64);
        if code != 0 {
            return Err(EnvError::ToolFailed {
                tool: invocation.label.clone(),
                code,
            });
        }
        Ok(())
    }

    /// Evaluate every prerequisite without creating anything.
    pub fn status(&self) -> Result<EnvStatus, EnvError> {
        let manifest = self.load_manifest_if_present()?;
        let graph = build_graph(manifest.as_ref(), &self.tool_packages())?;
        let ctx = self.context(manifest.as_ref());

        let mut targets = vec![DEPENDENCIES.to_string()];
        targets.extend(self.tool_packages().iter().map(|p| package_artifact(p)));
        let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
        let artifacts = graph
            .inspect(&targets, &ctx)?
            .into_iter()
            .filter(|(name, _)| name != DEPENDENCIES)
            .map(|(name, present)| ArtifactState { name, present })
            .collect();

        Ok(EnvStatus {
            env_dir: self.layout.env_dir().to_path_buf(),
            verify: self.config.verify,
            manifest: manifest.as_ref().map(|m| m.path.clone()),
            manifest_digest: manifest.as_ref().map(|m| m.digest.clone()),
            stamp_digest: InstallStamp::read(self.layout.env_dir()).map(|s| s.manifest_sha256),
            artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeRunner;
    use std::fs;

    const REQUIREMENTS: &str = "requests\nblack\npylint\n";

    fn project(requirements: Option<&str>) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        if let Some(content) = requirements {
            fs::write(tmp.path().join("requirements.txt"), content).unwrap();
        }
        fs::write(tmp.path().join("scrape_mfa.py"), "print('hi')\n").unwrap();
        tmp
    }

    fn manager(tmp: &tempfile::TempDir, runner: FakeRunner) -> EnvironmentManager<FakeRunner> {
        manager_with(tmp, runner, VerifyPolicy::Existence)
    }

    fn manager_with(
        tmp: &tempfile::TempDir,
        runner: FakeRunner,
        verify: VerifyPolicy,
    ) -> EnvironmentManager<FakeRunner> {
        let config = ProjectConfig {
            python: Some(PathBuf::from("python3")),
            verify,
            ..ProjectConfig::default()
        };
        EnvironmentManager::new(tmp.path(), config, StyleConfig::default(), runner)
    }

    fn all_packages() -> FakeRunner {
        FakeRunner::new(&["requests", "black", "pylint"])
    }

    #[test]
    fn test_relative_project_dir_places_environment_under_project() {
        let tmp = tempfile::Builder::new().tempdir_in(".").unwrap();
        fs::write(tmp.path().join("requirements.txt"), REQUIREMENTS).unwrap();
        let relative = PathBuf::from(tmp.path().file_name().unwrap());
        assert!(relative.is_relative());

        let config = ProjectConfig {
            python: Some(PathBuf::from("python3")),
            ..ProjectConfig::default()
        };
        let mgr = EnvironmentManager::new(&relative, config, StyleConfig::default(), all_packages());
        assert!(mgr.project_dir().is_absolute());

        let resolution = mgr.ensure_dependencies().unwrap();
        assert!(resolution.was_created(ENVIRONMENT));
        assert!(tmp.path().join("venv").join("bin").join("python").exists());
        assert!(tmp.path().join("venv/lib/python3.11/site-packages/requests").exists());
        assert!(!tmp.path().join(&relative).exists());

        let calls = mgr.runner.calls.borrow();
        let venv = calls.iter().find(|c| c.label == "venv").unwrap();
        assert!(Path::new(venv.args.last().unwrap()).is_absolute());
        let pip = calls.iter().find(|c| c.label == "pip").unwrap();
        assert!(pip.program.is_absolute());
    }

    #[test]
    fn test_fresh_checkout_creates_environment_before_tool() {
        for task in [Task::Run, Task::Format, Task::Lint] {
            let tmp = project(Some(REQUIREMENTS));
            let mgr = manager(&tmp, all_packages());
            let resolution = mgr.execute(task, &[]).unwrap();
            let labels = mgr.runner.labels();
            assert_eq!(labels[0], "venv", "{task}");
            assert_eq!(labels[1], "pip", "{task}");
            assert_eq!(labels.len(), 3, "{task}");
            assert!(resolution.was_created(ENVIRONMENT));
        }
    }

    #[test]
    fn test_second_invocation_skips_creation_and_install() {
        let tmp = project(Some(REQUIREMENTS));
        let mgr = manager(&tmp, all_packages());
        mgr.lint().unwrap();
        mgr.runner.calls.borrow_mut().clear();

        let resolution = mgr.lint().unwrap();
        assert_eq!(mgr.runner.labels(), vec!["pylint"]);
        assert!(resolution.created().is_empty());
    }

    #[test]
    fn test_single_install_satisfies_every_marker() {
        let tmp = project(Some(REQUIREMENTS));
        let mgr = manager(&tmp, all_packages());
        mgr.run(&[]).unwrap();
        assert_eq!(mgr.runner.count("pip"), 1);
        assert_eq!(mgr.runner.count("venv"), 1);
    }

    #[test]
    fn test_failed_install_blocks_every_tool() {
        for task in [Task::Run, Task::Format, Task::Lint] {
            let tmp = project(Some(REQUIREMENTS));
            let mut runner = all_packages();
            runner.pip_exit = 1;
            let mgr = manager(&tmp, runner);
            let err = mgr.execute(task, &[]).unwrap_err();
            assert!(matches!(err, EnvError::Installation { code: 1 }), "{task}");
            assert_eq!(mgr.runner.labels(), vec!["venv", "pip"], "{task}");
            // the environment created before the failure stays for inspection
            assert!(mgr.layout().exists());
        }
    }

    #[test]
    fn test_deleting_one_marker_reinstalls_full_manifest() {
        let tmp = project(Some(REQUIREMENTS));
        let mgr = manager(&tmp, all_packages());
        mgr.run(&[]).unwrap();

        let marker = mgr.layout().find_package("requests").unwrap();
        fs::remove_dir_all(marker).unwrap();
        mgr.runner.calls.borrow_mut().clear();

        let resolution = mgr.run(&[]).unwrap();
        assert_eq!(mgr.runner.labels(), vec!["pip", "scrape_mfa.py"]);
        let calls = mgr.runner.calls.borrow();
        assert_eq!(calls[0].args[3], "-r");
        assert!(calls[0].args[4].ends_with("requirements.txt"));
        assert!(resolution.was_created("package:requests"));
        assert!(!resolution.was_created(ENVIRONMENT));
    }

    #[test]
    fn test_checksum_policy_reinstalls_after_manifest_change() {
        let tmp = project(Some(REQUIREMENTS));
        let mgr = manager_with(&tmp, all_packages(), VerifyPolicy::Checksum);
        mgr.ensure_dependencies().unwrap();
        fs::write(tmp.path().join("requirements.txt"), "requests>=2.25\nblack\npylint\n").unwrap();
        mgr.runner.calls.borrow_mut().clear();

        mgr.ensure_dependencies().unwrap();
        assert_eq!(mgr.runner.labels(), vec!["pip"]);
    }

    #[test]
    fn test_existence_policy_ignores_manifest_change() {
        let tmp = project(Some(REQUIREMENTS));
        let mgr = manager(&tmp, all_packages());
        mgr.ensure_dependencies().unwrap();
        fs::write(tmp.path().join("requirements.txt"), "requests>=2.25\nblack\npylint\n").unwrap();
        mgr.runner.calls.borrow_mut().clear();

        let resolution = mgr.ensure_dependencies().unwrap();
        assert!(mgr.runner.labels().is_empty());
        assert!(resolution.created().is_empty());
    }

    #[test]
    fn test_lint_failure_propagates_exit_status() {
        let tmp = project(Some(REQUIREMENTS));
        let mut runner = all_packages();
        runner.tool_exits.insert("pylint".to_string(), 16);
        let mgr = manager(&tmp, runner);
        let err = mgr.lint().unwrap_err();
        assert!(matches!(err, EnvError::ToolFailed { ref tool, code: 16 } if tool == "pylint"));
        assert_eq!(err.exit_code(), 16);
    }

    #[test]
    fn test_run_requires_manifest() {
        let tmp = project(None);
        let mgr = manager(&tmp, all_packages());
        let err = mgr.run(&[]).unwrap_err();
        assert!(matches!(err, EnvError::Prerequisite { ref artifact, .. } if artifact == "manifest"));
        assert!(mgr.runner.labels().is_empty());
    }

    #[test]
    fn test_format_without_manifest_uses_installed_formatter() {
        let tmp = project(None);
        let mgr = manager(&tmp, all_packages());
        mgr.ensure_environment().unwrap();
        fs::create_dir_all(mgr.layout().site_packages()[0].join("black")).unwrap();
        mgr.runner.calls.borrow_mut().clear();

        mgr.format().unwrap();
        assert_eq!(mgr.runner.labels(), vec!["black"]);
    }

    #[test]
    fn test_formatter_missing_from_manifest_is_reported() {
        let tmp = project(Some("requests\n"));
        let mgr = manager(&tmp, FakeRunner::new(&["requests"]));
        let err = mgr.format().unwrap_err();
        assert!(matches!(err, EnvError::Prerequisite { ref artifact, .. } if artifact == "package:black"));
        assert_eq!(mgr.runner.count("black"), 0);
    }

    #[test]
    fn test_ensure_environment_is_idempotent() {
        let tmp = project(Some(REQUIREMENTS));
        let mgr = manager(&tmp, all_packages());
        assert!(mgr.ensure_environment().unwrap().was_created(ENVIRONMENT));
        assert!(mgr.ensure_environment().unwrap().created().is_empty());
        assert_eq!(mgr.runner.count("venv"), 1);
    }

    #[test]
    fn test_status_does_not_create_anything() {
        let tmp = project(Some(REQUIREMENTS));
        let mgr = manager(&tmp, all_packages());
        let before = mgr.status().unwrap();
        assert!(before.artifacts.iter().all(|a| !a.present));
        assert!(!before.stamp_current());
        assert!(mgr.runner.labels().is_empty());

        mgr.ensure_dependencies().unwrap();
        let after = mgr.status().unwrap();
        let names: Vec<&str> = after.artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["environment", "package:requests", "package:black", "package:pylint"]
        );
        assert!(after.artifacts.iter().all(|a| a.present));
        assert!(after.stamp_current());
    }
}
