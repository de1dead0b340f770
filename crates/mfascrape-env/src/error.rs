use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the environment manager.
///
/// Tool and installer failures keep the child's exit status so the CLI can
/// exit with it unchanged.
#[derive(Debug, Error)]
pub enum EnvError {
    /// A prerequisite could not be created, or its creation did not produce it.
    #[error("cannot provide '{artifact}': {reason}")]
    Prerequisite { artifact: String, reason: String },

    /// The package installer exited non-zero.
    #[error("dependency installation failed with exit status {code}")]
    Installation { code: i32 },

    /// The script, formatter or linter exited non-zero.
    #[error("{tool} exited with status {code}")]
    ToolFailed { tool: String, code: i32 },

    #[error("unknown artifact '{0}'")]
    UnknownArtifact(String),

    #[error("artifact '{0}' is declared twice")]
    DuplicateArtifact(String),

    #[error("prerequisite cycle: {0}")]
    Cycle(String),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl EnvError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit status the CLI should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Installation { code } | Self::ToolFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}
