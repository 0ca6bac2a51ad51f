//! macOS tooling, signing and disk image settings.

use std::path::PathBuf;

/// Program names for every external collaborator.
///
/// All default to the tool names found on a stock macOS install. Overriding
/// them points the pipeline at wrappers or stand-ins.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// `arch(1)`, used to pin child processes to an instruction set.
    pub arch: String,
    pub codesign: String,
    pub spctl: String,
    pub hdiutil: String,
    /// `xcrun`, front-end for `notarytool` and `stapler`.
    pub xcrun: String,
    /// Launcher for smoke tests.
    pub open: String,
    /// Directory disk images are mounted under.
    pub volumes_root: PathBuf,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            arch: "arch".into(),
            codesign: "codesign".into(),
            spctl: "spctl".into(),
            hdiutil: "hdiutil".into(),
            xcrun: "xcrun".into(),
            open: "open".into(),
            volumes_root: PathBuf::from("/Volumes"),
        }
    }
}

/// Code signing options that are not secret.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SigningSettings {
    /// Path to an entitlements plist, relative to the workspace.
    pub entitlements: Option<PathBuf>,
}

/// macOS DMG disk image configuration.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct DmgSettings {
    /// Fixed maximum capacity passed to `hdiutil create -size`.
    pub capacity: String,

    /// Output format passed to `hdiutil create -format`.
    pub format: String,

    /// Add an `Applications` symlink next to the app for drag-to-install.
    pub applications_symlink: bool,
}

impl Default for DmgSettings {
    fn default() -> Self {
        Self {
            capacity: "1g".into(),
            format: "UDZO".into(),
            applications_symlink: true,
        }
    }
}

/// Per-architecture interpreter selection.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ArchitectureSettings {
    /// Interpreter that runs natively on this architecture.
    pub interpreter: Option<String>,
}
