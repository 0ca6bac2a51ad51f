//! Pipeline orchestration.
//!
//! A [`Target`] names what the user asked for. It expands into a graph of
//! [`Step`]s, and a [`Pipeline`] executes that graph against one workspace.
//!
//! # Example
//!
//! ```no_run
//! use psydekick_bundler_release::bundler::{
//!     Pipeline, ReleaseConfig, Target,
//! };
//! use psydekick_bundler_release::metadata::load_manifest;
//! use std::path::Path;
//!
//! # async fn example() -> psydekick_bundler_release::bundler::Result<()> {
//! let settings = load_manifest(Path::new("release.toml"), None)?;
//! let config = ReleaseConfig::from_env();
//!
//! let report = Pipeline::new(&settings, &config)
//!     .run(Target::BuildAll)
//!     .await?;
//! if let Some(inspection) = &report.inspection {
//!     println!("{inspection}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`target`] - User-facing targets
//! - [`graph`] - Steps and their dependency graph
//! - [`orchestrator`] - Step execution and reporting
//! - [`manifest`] - Release manifest
//! - `checksum` - SHA-256 for files and bundle trees
//! - [`tool_detection`] - External tool availability

pub(crate) mod checksum;
pub mod graph;
pub mod manifest;
pub mod orchestrator;
pub mod target;
pub mod tool_detection;

pub use graph::{Dependency, PipelineGraph, Step};
pub use manifest::{ReleaseArtifact, ReleaseManifest};
pub use orchestrator::{Pipeline, PipelineReport, StepOutcome};
pub use target::Target;
