//! Release pipeline for a frozen Python application shipped as two native
//! macOS bundles, one for Apple Silicon and one for Intel.
//!
//! The pipeline provisions an architecture-pinned environment, freezes the
//! program, signs the bundle, wraps it in a disk image and optionally
//! notarizes and staples it, keeping every artifact architecture-named.
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{CliError, ReleaseError, Result};
