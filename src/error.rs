//! Error taxonomy for parsing, resolution, and execution.
//!
//! Every error is terminal to the invocation. The CLI maps each variant to a
//! process exit code with [`Error::exit_code`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type for ladle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Exit code for definition and usage errors.
pub const USAGE_ERROR: i32 = 2;

/// Exit code for everything else that is not a subprocess failure.
pub const GENERAL_ERROR: i32 = 1;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no ladle.yaml found in {start} or any parent directory")]
    FileNotFound { start: PathBuf },

    #[error("recipe file {path} does not exist")]
    MissingFile { path: PathBuf },

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{} validation error(s):\n  {}", .0.len(), .0.join("\n  "))]
    Validation(Vec<String>),

    #[error("unknown recipe '{name}'{}", suggestion_suffix(.suggestion))]
    UnknownRecipe {
        name: String,
        suggestion: Option<String>,
    },

    #[error("recipe '{recipe}' requires parameter '{param}'")]
    UnboundParameter { recipe: String, param: String },

    #[error("recipe '{recipe}' has no parameter '{param}'")]
    UnknownParameter { recipe: String, param: String },

    #[error("recipe '{recipe}' takes {max} argument(s) but {given} were given")]
    TooManyArguments {
        recipe: String,
        max: usize,
        given: usize,
    },

    #[error("parameter '{param}' of '{recipe}' must be one of: {}", .choices.join(", "))]
    InvalidChoice {
        recipe: String,
        param: String,
        value: String,
        choices: Vec<String>,
    },

    #[error("unknown profile '{profile}' (available: {})", .available.join(", "))]
    UnknownProfile {
        profile: String,
        available: Vec<String>,
    },

    #[error("dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("template error in '{template}': {message}")]
    Template { template: String, message: String },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("recipe '{recipe}' failed with exit code {code}")]
    SubprocessFailure { recipe: String, code: i32 },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(". Did you mean '{}'?", s))
        .unwrap_or_default()
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn template(template: &str, message: impl Into<String>) -> Self {
        Self::Template {
            template: template.to_string(),
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    ///
    /// A failing subprocess propagates its own code. A code of 0 cannot be
    /// a failure, so it is reported as a general error instead.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SubprocessFailure { code, .. } if *code != 0 => *code,
            Self::SubprocessFailure { .. }
            | Self::Io { .. }
            | Self::Json(_)
            | Self::Spawn { .. } => GENERAL_ERROR,
            _ => USAGE_ERROR,
        }
    }
}
