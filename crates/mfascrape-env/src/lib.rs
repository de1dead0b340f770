//! Isolated Python environment manager.
//!
//! Prerequisites (the environment directory and the installed-package
//! markers) are modelled as an artifact graph; `run`, `format` and `lint`
//! resolve their prerequisites through it before spawning anything.

pub mod builder;
pub mod error;
pub mod graph;
pub mod layout;
pub mod log;
pub mod manager;
pub mod manifest;
pub mod process;
pub mod stamp;
pub mod tasks;

pub use error::EnvError;
pub use graph::{Artifact, ArtifactGraph, Resolution, StepOutcome};
pub use manager::{ArtifactState, EnvStatus, EnvironmentManager};
pub use process::{Invocation, ProcessRunner, SystemRunner};
pub use tasks::Task;
