//! Release pipeline for a frozen macOS application built for two
//! architectures.
//!
//! The pipeline provisions one Python environment per architecture, freezes
//! the program into an architecture-specific `.app`, signs it, wraps it in a
//! disk image and optionally notarizes and staples that image. Apple Silicon
//! and Intel artifacts never share a path.
//!
//! # Module Organization
//!
//! - [`settings`] - Workspace layout, build specification, credentials
//! - [`platform`] - Provisioning, freezing and the macOS tool wrappers
//! - [`builder`] - Targets, step graph and execution
//! - [`workspace`] - Cleaning
//! - [`utils`] - Filesystem and process helpers
//! - [`error`] - Error taxonomy

pub mod builder;
pub mod error;
pub mod platform;
pub mod settings;
pub mod utils;
pub mod workspace;

pub use builder::{Pipeline, PipelineReport, Step, StepOutcome, Target};
pub use error::{Error, ErrorKind, Result, Stage};
pub use settings::{
    Arch, ArchitectureSettings, BuildSpecification, DmgSettings, NotaryCredentials,
    ReleaseConfig, ResourceMapping, SIGNING_IDENTITY_VAR, Settings, SettingsBuilder,
    SigningIdentity, SigningSettings, ToolSettings,
};

#[cfg(test)]
pub(crate) use settings::test_spec;
