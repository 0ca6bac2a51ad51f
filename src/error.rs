//! Crate-level error types for the release CLI.
//!
//! Pipeline failures live in [`crate::bundler::Error`]; this module wraps them
//! together with argument and manifest errors raised at the CLI layer.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type surfaced by the binary
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Pipeline errors
    #[error("{0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Interactive prompt errors
    #[error("Prompt error: {0}")]
    Prompt(#[from] inquire::InquireError),

    /// Failures in the CLI wiring, with their context chain
    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Suggestions printed under the error message.
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::bundler::ErrorKind;

        match self {
            ReleaseError::Bundler(e) => match e.kind() {
                ErrorKind::Precondition
                    if e.to_string().contains(crate::bundler::SIGNING_IDENTITY_VAR) =>
                {
                    vec![format!(
                        "Set {} in the environment or in the workspace .env file",
                        crate::bundler::SIGNING_IDENTITY_VAR
                    )]
                }
                ErrorKind::Precondition => {
                    vec!["Run the target named in the message first".to_string()]
                }
                ErrorKind::Manifest => {
                    vec!["Check release.toml and the VERSION file".to_string()]
                }
                _ => vec!["Run `clean` to reset the workspace before retrying".to_string()],
            },
            ReleaseError::Prompt(_) => {
                vec!["notarize must be run from an interactive terminal".to_string()]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
