//! Build the isolated environment: `python -m venv`, then
//! `pip install -r <manifest>`. Also defines the concrete artifacts the
//! manager puts in its graph.

use std::path::{Path, PathBuf};

use mfascrape_core::config::VerifyPolicy;

use crate::error::EnvError;
use crate::graph::{Artifact, ArtifactGraph};
use crate::info_log;
use crate::layout::EnvLayout;
use crate::manifest::{normalize_name, Manifest};
use crate::process::{Invocation, ProcessRunner};
use crate::stamp::InstallStamp;

pub const ENVIRONMENT: &str = "environment";
pub const DEPENDENCIES: &str = "dependencies";

/// Graph name of the marker artifact for `package`.
pub fn package_artifact(package: &str) -> String {
    format!("package:{}", normalize_name(package))
}

/// Everything predicates and creation actions need.
pub struct BuildContext<'a> {
    pub project_dir: &'a Path,
    pub layout: &'a EnvLayout,
    pub manifest: Option<&'a Manifest>,
    pub runner: &'a dyn ProcessRunner,
    /// Host interpreter override; `None` searches `PATH`.
    pub host_python: Option<&'a Path>,
    pub verify: VerifyPolicy,
}

/// The environment directory.
pub struct EnvironmentArtifact {
    prerequisites: Vec<String>,
}

impl EnvironmentArtifact {
    pub fn new() -> Self {
        Self {
            prerequisites: Vec::new(),
        }
    }
}

impl Default for EnvironmentArtifact {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Artifact<BuildContext<'a>> for EnvironmentArtifact {
    fn name(&self) -> &str {
        ENVIRONMENT
    }

    fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }

    fn is_present(&self, ctx: &BuildContext<'a>) -> Result<bool, EnvError> {
        Ok(ctx.layout.exists())
    }

    fn create(&self, ctx: &BuildContext<'a>) -> Result<(), EnvError> {
        create_environment(ctx)
    }
}

/// Installed-package marker. Every marker is created by the same action:
/// installing the whole manifest.
pub struct PackageArtifact {
    name: String,
    package: String,
    prerequisites: Vec<String>,
}

impl PackageArtifact {
    pub fn new(package: &str) -> Self {
        Self {
            name: package_artifact(package),
            package: normalize_name(package),
            prerequisites: vec![ENVIRONMENT.to_string()],
        }
    }
}

impl<'a> Artifact<BuildContext<'a>> for PackageArtifact {
    fn name(&self) -> &str {
        &self.name
    }

    fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }

    fn is_present(&self, ctx: &BuildContext<'a>) -> Result<bool, EnvError> {
        if !ctx.layout.has_package(&self.package) {
            return Ok(false);
        }
        match ctx.verify {
            VerifyPolicy::Existence => Ok(true),
            VerifyPolicy::Checksum => {
                let Some(manifest) = ctx.manifest else {
                    return Ok(false);
                };
                Ok(InstallStamp::read(ctx.layout.env_dir())
                    .is_some_and(|stamp| stamp.matches(&manifest.digest)))
            }
        }
    }

    fn create(&self, ctx: &BuildContext<'a>) -> Result<(), EnvError> {
        if let Some(manifest) = ctx.manifest {
            if !manifest.declares(&self.package) {
                return Err(EnvError::Prerequisite {
                    artifact: self.name.clone(),
                    reason: format!(
                        "{} is not declared in {}",
                        self.package,
                        manifest.path.display()
                    ),
                });
            }
        }
        install_manifest(ctx)
    }
}

/// Aggregate of every package the manifest declares. Holds whenever its
/// prerequisites do, so it never has a creation step of its own.
pub struct DependenciesArtifact {
    prerequisites: Vec<String>,
}

impl DependenciesArtifact {
    pub fn new(packages: &[String]) -> Self {
        let mut prerequisites = vec![ENVIRONMENT.to_string()];
        prerequisites.extend(packages.iter().map(|p| package_artifact(p)));
        Self { prerequisites }
    }
}

impl<'a> Artifact<BuildContext<'a>> for DependenciesArtifact {
    fn name(&self) -> &str {
        DEPENDENCIES
    }

    fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }

    fn is_present(&self, _ctx: &BuildContext<'a>) -> Result<bool, EnvError> {
        Ok(true)
    }

    fn create(&self, _ctx: &BuildContext<'a>) -> Result<(), EnvError> {
        Ok(())
    }
}

/// Graph of the environment, one marker per manifest package plus
/// `extra_packages` (formatter, linter), and the `dependencies` aggregate.
pub fn build_graph<'a>(
    manifest: Option<&Manifest>,
    extra_packages: &[&str],
) -> Result<ArtifactGraph<BuildContext<'a>>, EnvError> {
    let mut graph: ArtifactGraph<BuildContext<'a>> = ArtifactGraph::new();
    graph.add(Box::new(EnvironmentArtifact::new()))?;

    let declared: Vec<String> = manifest.map(|m| m.packages.clone()).unwrap_or_default();
    for package in declared
        .iter()
        .map(String::as_str)
        .chain(extra_packages.iter().copied())
    {
        if !graph.contains(&package_artifact(package)) {
            graph.add(Box::new(PackageArtifact::new(package)))?;
        }
    }
    graph.add(Box::new(DependenciesArtifact::new(&declared)))?;
    Ok(graph)
}

/// Host interpreter used to create the environment.
pub fn resolve_host_python(override_path: Option<&Path>) -> Result<PathBuf, EnvError> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }
    for name in ["python3", "python"] {
        if let Ok(path) = which::which(name) {
            return Ok(path);
        }
    }
    Err(EnvError::Prerequisite {
        artifact: ENVIRONMENT.to_string(),
        reason: "python3 or python not found in PATH".to_string(),
    })
}

/// `<host python> -m venv <env dir>`
pub fn create_environment(ctx: &BuildContext<'_>) -> Result<(), EnvError> {
    let python = resolve_host_python(ctx.host_python)?;
    let invocation = Invocation::new("venv", python)
        .args(["-m", "venv"])
        .arg(ctx.layout.env_dir().display().to_string())
        .current_dir(ctx.project_dir);
    info_log!("{}", invocation.command_line());
    let code = ctx.runner.run(&invocation).map_err(|e| match e {
        EnvError::Spawn { program, source } => EnvError::Prerequisite {
            artifact: ENVIRONMENT.to_string(),
            reason: format!("host interpreter {} cannot be started: {}", program.display(), source),
        },
        other => other,
    })?;
    if code != 0 {
        return Err(EnvError::Prerequisite {
            artifact: ENVIRONMENT.to_string(),
            reason: format!("`{}` exited with status {}", invocation.command_line(), code),
        });
    }
    Ok(())
}

/// `<env python> -m pip install -r <manifest>`, then record the install stamp.
pub fn install_manifest(ctx: &BuildContext<'_>) -> Result<(), EnvError> {
    let manifest = ctx.manifest.ok_or_else(|| EnvError::Prerequisite {
        artifact: "manifest".to_string(),
        reason: "no dependency manifest loaded".to_string(),
    })?;
    let invocation = Invocation::new("pip", ctx.layout.python())
        .args(["-m", "pip", "install", "-r"])
        .arg(manifest.path.display().to_string())
        .current_dir(ctx.project_dir);
    info_log!("{}", invocation.command_line());
    let code = ctx.runner.run(&invocation)?;
    if code != 0 {
        return Err(EnvError::Installation { code });
    }
    InstallStamp::new(&manifest.digest, &manifest.packages).write(ctx.layout.env_dir())
}
