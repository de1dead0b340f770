//! Artifact graph: named prerequisites with an existence predicate and a
//! creation action, resolved in dependency order.
//!
//! Predicates are evaluated right before an artifact would be created, so an
//! action that satisfies several artifacts at once (one manifest install
//! providing every package marker) runs only once per resolution.

use std::collections::HashMap;
use std::time::Instant;

use mfascrape_core::observability;

use crate::error::EnvError;
use crate::info_log;

/// A node of the graph. `C` is the context handed to predicates and actions.
pub trait Artifact<C> {
    fn name(&self) -> &str;

    /// Names of the artifacts that must exist before this one is checked.
    fn prerequisites(&self) -> &[String];

    fn is_present(&self, ctx: &C) -> Result<bool, EnvError>;

    fn create(&self, ctx: &C) -> Result<(), EnvError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The predicate held; nothing was done.
    Present,
    /// The creation action ran and the predicate now holds.
    Created,
}

/// Ordered record of what a resolution did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub steps: Vec<(String, StepOutcome)>,
}

impl Resolution {
    pub fn created(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|(_, outcome)| *outcome == StepOutcome::Created)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn was_created(&self, name: &str) -> bool {
        self.steps
            .iter()
            .any(|(n, outcome)| n == name && *outcome == StepOutcome::Created)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

pub struct ArtifactGraph<C> {
    nodes: Vec<Box<dyn Artifact<C>>>,
    index: HashMap<String, usize>,
}

impl<C> Default for ArtifactGraph<C> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<C> ArtifactGraph<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, artifact: Box<dyn Artifact<C>>) -> Result<(), EnvError> {
        let name = artifact.name().to_string();
        if self.index.contains_key(&name) {
            return Err(EnvError::DuplicateArtifact(name));
        }
        self.index.insert(name, self.nodes.len());
        self.nodes.push(artifact);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn lookup(&self, name: &str) -> Result<usize, EnvError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| EnvError::UnknownArtifact(name.to_string()))
    }

    /// Topological order of `targets` and everything they need, each
    /// artifact at most once, prerequisites in declaration order.
    pub fn plan(&self, targets: &[&str]) -> Result<Vec<&str>, EnvError> {
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut order = Vec::new();
        let mut path = Vec::new();
        for target in targets {
            let idx = self.lookup(target)?;
            self.visit(idx, &mut marks, &mut order, &mut path)?;
        }
        Ok(order.into_iter().map(|i| self.nodes[i].name()).collect())
    }

    fn visit(
        &self,
        idx: usize,
        marks: &mut [Mark],
        order: &mut Vec<usize>,
        path: &mut Vec<usize>,
    ) -> Result<(), EnvError> {
        match marks[idx] {
            Mark::Done => return Ok(()),
            Mark::Visiting => {
                let start = path.iter().position(|&p| p == idx).unwrap_or(0);
                let cycle: Vec<&str> = path[start..]
                    .iter()
                    .chain(std::iter::once(&idx))
                    .map(|&i| self.nodes[i].name())
                    .collect();
                return Err(EnvError::Cycle(cycle.join(" -> ")));
            }
            Mark::Unvisited => {}
        }
        marks[idx] = Mark::Visiting;
        path.push(idx);
        for prerequisite in self.nodes[idx].prerequisites() {
            let dep = self.lookup(prerequisite)?;
            self.visit(dep, marks, order, path)?;
        }
        path.pop();
        marks[idx] = Mark::Done;
        order.push(idx);
        Ok(())
    }

    /// Make every artifact in the plan exist, creating absent ones in order.
    /// Stops at the first failure; artifacts created before it stay on disk.
    pub fn resolve(&self, targets: &[&str], ctx: &C) -> Result<Resolution, EnvError> {
        let mut resolution = Resolution::default();
        for name in self.plan(targets)? {
            let artifact = &self.nodes[self.lookup(name)?];
            if artifact.is_present(ctx)? {
                tracing::debug!(artifact = name, "present");
                resolution.steps.push((name.to_string(), StepOutcome::Present));
                continue;
            }
            info_log!("creating {}", name);
            let started = Instant::now();
            artifact.create(ctx)?;
            if !artifact.is_present(ctx)? {
                return Err(EnvError::Prerequisite {
                    artifact: name.to_string(),
                    reason: "creation step finished but the artifact is still missing".to_string(),
                });
            }
            observability::audit_artifact_created(name, started.elapsed().as_millis() as u64);
            resolution.steps.push((name.to_string(), StepOutcome::Created));
        }
        Ok(resolution)
    }

    /// Evaluate predicates along the plan without creating anything.
    pub fn inspect(&self, targets: &[&str], ctx: &C) -> Result<Vec<(String, bool)>, EnvError> {
        let mut states = Vec::new();
        for name in self.plan(targets)? {
            let artifact = &self.nodes[self.lookup(name)?];
            states.push((name.to_string(), artifact.is_present(ctx)?));
        }
        Ok(states)
    }
}
