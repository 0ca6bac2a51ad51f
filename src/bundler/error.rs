//! Error types for pipeline operations.
//!
//! Every failing step maps onto one [`ErrorKind`]. Stage errors carry the
//! architecture they belong to so one architecture's failure never reads as
//! the other's, and tool failures keep the raw diagnostic text.

use super::settings::Arch;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an error is attributed to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    /// Environment creation or dependency install
    Provisioning,
    /// External freezing tool
    Freeze,
    /// Code signing
    Signing,
    /// Disk image creation
    Packaging,
    /// Notary submission or stapling
    Notarization,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Provisioning => "provisioning",
            Stage::Freeze => "freeze",
            Stage::Signing => "signing",
            Stage::Packaging => "packaging",
            Stage::Notarization => "notarization",
        };
        f.write_str(name)
    }
}

/// Error taxonomy used for exit reporting.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Precondition,
    Provisioning,
    Freeze,
    Signing,
    Packaging,
    Notarization,
    Manifest,
    Io,
    Internal,
}

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum Error {
    /// Required configuration or artifact missing before a destructive step
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A stage failed for one architecture
    #[error("{stage} failed for {arch}: {source}")]
    Stage {
        stage: Stage,
        arch: Arch,
        #[source]
        source: Box<Error>,
    },

    /// An external tool exited unsuccessfully
    #[error("`{program}` exited with {status}\n{diagnostics}")]
    ToolFailed {
        program: String,
        status: String,
        diagnostics: String,
    },

    /// An external tool could not be started
    #[error("failed to run `{program}`: {source}")]
    ToolSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem error with the path and operation it happened on
    #[error("{context} ({}): {source}", .path.display())]
    Fs {
        context: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// release.toml or VERSION problems
    #[error("manifest error: {0}")]
    Manifest(String),

    /// IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all with a message
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Taxonomy of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Precondition(_) => ErrorKind::Precondition,
            Error::Stage { stage, .. } => match stage {
                Stage::Provisioning => ErrorKind::Provisioning,
                Stage::Freeze => ErrorKind::Freeze,
                Stage::Signing => ErrorKind::Signing,
                Stage::Packaging => ErrorKind::Packaging,
                Stage::Notarization => ErrorKind::Notarization,
            },
            Error::Manifest(_) => ErrorKind::Manifest,
            Error::IoError(_) | Error::Fs { .. } => ErrorKind::Io,
            Error::ToolFailed { .. }
            | Error::ToolSpawn { .. }
            | Error::Json(_)
            | Error::GenericError(_) => ErrorKind::Internal,
        }
    }

    /// Architecture the error is attributed to, if any.
    pub fn arch(&self) -> Option<Arch> {
        match self {
            Error::Stage { arch, .. } => Some(*arch),
            _ => None,
        }
    }
}

/// Extension methods for attaching context to results.
pub trait ErrorExt<T> {
    /// Attach a filesystem operation and path to an IO error.
    fn fs_context(self, context: &str, path: &Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &str, path: &Path) -> Result<T> {
        self.map_err(|source| Error::Fs {
            context: context.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Attribute an error to a stage and architecture.
pub trait StageExt<T> {
    fn in_stage(self, stage: Stage, arch: Arch) -> Result<T>;
}

impl<T> StageExt<T> for Result<T> {
    fn in_stage(self, stage: Stage, arch: Arch) -> Result<T> {
        self.map_err(|e| match e {
            already @ Error::Stage { .. } => already,
            other => Error::Stage {
                stage,
                arch,
                source: Box::new(other),
            },
        })
    }
}

/// Convert a missing value into a pipeline error.
pub trait Context<T> {
    fn context<C: fmt::Display>(self, context: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: fmt::Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }
}

/// Return early with a [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)).into())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_keep_raw_tool_output() {
        let tool: Result<()> = Err(Error::ToolFailed {
            program: "pyinstaller".into(),
            status: "exit status: 1".into(),
            diagnostics: "ModuleNotFoundError: No module named 'streamlit'".into(),
        });
        let err = tool.in_stage(Stage::Freeze, Arch::X86_64).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Freeze);
        assert_eq!(err.arch(), Some(Arch::X86_64));
        let msg = err.to_string();
        assert!(msg.contains("freeze failed for x86_64"));
        assert!(msg.contains("No module named 'streamlit'"));
    }

    #[test]
    fn in_stage_does_not_rewrap() {
        let first: Result<()> = Err(Error::GenericError("boom".into()));
        let err = first
            .in_stage(Stage::Signing, Arch::Arm64)
            .in_stage(Stage::Packaging, Arch::Arm64)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Signing);
    }
}
