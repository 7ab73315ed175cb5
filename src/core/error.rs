use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the entire launcher.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Archive ─────────────────────────────────────────
    #[error("Unable to find the resource: {0}")]
    ResourceNotFound(String),

    #[error("Failed to create a temporary file in {dir:?}: {source}")]
    ExtractionFailed {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot determine the location of the running archive: {0}")]
    SelfLocation(String),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Loading ─────────────────────────────────────────
    #[error("Class {class} not found in {archives:?}")]
    ClassNotFound {
        class: String,
        archives: Vec<PathBuf>,
    },

    #[error("Daemon helper {helper} is unavailable: {reason}")]
    DaemonHelperUnavailable { helper: String, reason: String },

    #[error("Runtime does not expose the {0} hook")]
    HookUnsupported(String),

    // ── Java ────────────────────────────────────────────
    #[error("No usable Java runtime found (tried {0:?})")]
    JavaNotFound(PathBuf),

    #[error("{product} requires Java {required} or later, but {path:?} is Java {found}")]
    UnsupportedJava {
        product: String,
        path: PathBuf,
        found: u32,
        required: u32,
    },

    #[error("Java execution failed: {0}")]
    JavaExecution(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Bootstrap ───────────────────────────────────────
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        source: Box<LauncherError>,
    },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// Tag this error with the bootstrap step it aborted.
    pub fn at(self, stage: Stage) -> Self {
        match self {
            already @ LauncherError::Stage { .. } => already,
            other => LauncherError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }
}

/// Steps of the bootstrap sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SelfLocation,
    Daemon,
    Signals,
    LogRedirect,
    Extraction,
    EntryPoint,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SelfLocation => "self location",
            Stage::Daemon => "daemonization",
            Stage::Signals => "signal setup",
            Stage::LogRedirect => "log redirection",
            Stage::Extraction => "resource extraction",
            Stage::EntryPoint => "entry point",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_tag_is_applied_once() {
        let err = LauncherError::ResourceNotFound("winstone.jar".into())
            .at(Stage::Extraction)
            .at(Stage::EntryPoint);
        assert_eq!(
            err.to_string(),
            "resource extraction failed: Unable to find the resource: winstone.jar"
        );
    }
}
