//! Error types for the buildpack shim
//!
//! All modules use `ShimResult<T>` as their return type.

use crate::finalize::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for shim operations
pub type ShimResult<T> = Result<T, ShimError>;

/// All errors that can occur while finalizing
#[derive(Error, Debug)]
pub enum ShimError {
    // Missing or malformed input
    #[error("no order.toml found in {}", dir.display())]
    NoFragmentsFound { dir: PathBuf },

    #[error("invalid deps index '{value}'")]
    InvalidDepsIndex {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("CF_STACK is not set")]
    MissingStack,

    #[error("Invalid buildpack manifest at {path}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command exited with {}: {command}\n{output}", exit_label(*code))]
    CommandExecution {
        command: String,
        code: Option<i32>,
        output: String,
    },

    // Serialization errors
    #[error("TOML parse error in {}", path.display())]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("TOML serialize error for {}", path.display())]
    TomlSerialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    #[error("YAML parse error in {}", path.display())]
    YamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("YAML serialize error for {}", path.display())]
    YamlSerialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    // Orchestration
    #[error("failed to {phase}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<ShimError>,
    },
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "signal".to_string(),
    }
}

impl ShimError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, code: Option<i32>, output: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            code,
            output: output.into(),
        }
    }

    /// Tag this error with the pipeline phase it came from
    pub fn in_phase(self, phase: Phase) -> Self {
        Self::Phase {
            phase,
            source: Box::new(self),
        }
    }

    /// The phase that failed, if the error went through the driver
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Render the error with its full source chain on one line
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            rendered.push_str(": ");
            rendered.push_str(&err.to_string());
            source = err.source();
        }
        rendered
    }
}
