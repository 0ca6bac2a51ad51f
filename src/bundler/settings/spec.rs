//! Declarative description of the program being frozen.

use std::path::PathBuf;

/// One resource embedded into the frozen bundle.
///
/// `source` is relative to the workspace root; `destination` is a directory
/// inside the bundle's resource tree (`.` for its root).
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize)]
pub struct ResourceMapping {
    pub source: PathBuf,
    pub destination: String,
}

/// Immutable build description shared by both architectures.
///
/// Loaded once from the `[app]` table of `release.toml` together with the
/// version file, and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct BuildSpecification {
    /// Application name; the freezer emits `<app_name>.app`.
    pub app_name: String,

    /// Entry script, relative to the workspace.
    pub entry_point: PathBuf,

    /// Data files and directories to embed.
    pub resources: Vec<ResourceMapping>,

    /// Modules loaded dynamically that the freezer cannot discover.
    pub hidden_imports: Vec<String>,

    /// CFBundleIdentifier.
    pub bundle_identifier: String,

    /// Optional `.icns` icon, relative to the workspace.
    pub icon: Option<PathBuf>,

    /// LSMinimumSystemVersion.
    pub minimum_system_version: String,

    /// Version stamped into bundle metadata.
    pub version: semver::Version,
}

impl BuildSpecification {
    /// Name of the bundle the freezer emits, independent of architecture.
    pub fn frozen_bundle_name(&self) -> String {
        format!("{}.app", self.app_name)
    }
}
