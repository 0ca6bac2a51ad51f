//! Release manifest loading from `release.toml` and the version file.

use crate::bundler::{
    Arch, ArchitectureSettings, BuildSpecification, DmgSettings, Error, ResourceMapping, Result,
    Settings, SettingsBuilder, SigningSettings, ToolSettings,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default manifest file name at the workspace root.
pub const MANIFEST_FILE: &str = "release.toml";

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    app: RawApp,
    #[serde(default)]
    paths: RawPaths,
    #[serde(default)]
    architectures: BTreeMap<Arch, ArchitectureSettings>,
    #[serde(default)]
    tools: ToolSettings,
    #[serde(default)]
    signing: SigningSettings,
    #[serde(default)]
    dmg: DmgSettings,
}

#[derive(Debug, serde::Deserialize)]
struct RawApp {
    name: String,
    entry_point: PathBuf,
    bundle_identifier: String,
    #[serde(default)]
    icon: Option<PathBuf>,
    #[serde(default = "default_minimum_system_version")]
    minimum_system_version: String,
    #[serde(default)]
    resources: Vec<ResourceMapping>,
    #[serde(default)]
    hidden_imports: Vec<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RawPaths {
    version_file: Option<PathBuf>,
    requirements: Option<PathBuf>,
    build_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

fn default_minimum_system_version() -> String {
    "10.15".to_string()
}

/// Load settings from a manifest file.
///
/// The manifest's directory is the workspace unless `workspace` overrides it.
pub fn load_manifest(manifest_path: &Path, workspace: Option<&Path>) -> Result<Settings> {
    let text = std::fs::read_to_string(manifest_path).map_err(|e| {
        Error::Manifest(format!("failed to read {}: {e}", manifest_path.display()))
    })?;

    let workspace = match workspace {
        Some(dir) => dir.to_path_buf(),
        None => manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    parse_manifest_at(&text, &workspace, manifest_path)
}

/// Parse manifest text; relative paths resolve against `workspace`.
pub fn parse_manifest(text: &str, workspace: &Path) -> Result<Settings> {
    parse_manifest_at(text, workspace, &workspace.join(MANIFEST_FILE))
}

fn parse_manifest_at(text: &str, workspace: &Path, manifest_path: &Path) -> Result<Settings> {
    let raw: RawManifest = toml::from_str(text)
        .map_err(|e| Error::Manifest(format!("failed to parse {MANIFEST_FILE}: {e}")))?;

    if raw.app.name.trim().is_empty() {
        return Err(Error::Manifest("[app] name must not be empty".into()));
    }
    if raw.app.name.contains('/') {
        return Err(Error::Manifest(format!(
            "[app] name must not contain '/': {}",
            raw.app.name
        )));
    }

    let version_file = raw
        .paths
        .version_file
        .unwrap_or_else(|| PathBuf::from("VERSION"));
    let version = read_version(&workspace.join(&version_file))?;

    let icon = raw.app.icon.or_else(|| discover_icon(workspace));

    let spec = BuildSpecification {
        app_name: raw.app.name,
        entry_point: raw.app.entry_point,
        resources: raw.app.resources,
        hidden_imports: raw.app.hidden_imports,
        bundle_identifier: raw.app.bundle_identifier,
        icon,
        minimum_system_version: raw.app.minimum_system_version,
        version,
    };

    let mut builder = SettingsBuilder::new()
        .workspace(workspace)
        .spec(spec)
        .manifest(manifest_path)
        .version_file(version_file)
        .architectures(raw.architectures)
        .tools(raw.tools)
        .signing(raw.signing)
        .dmg(raw.dmg);

    if let Some(path) = raw.paths.requirements {
        builder = builder.requirements(path);
    }
    if let Some(path) = raw.paths.build_dir {
        builder = builder.build_dir(path);
    }
    if let Some(path) = raw.paths.output_dir {
        builder = builder.output_dir(path);
    }

    builder.build()
}

/// Read a `MAJOR.MINOR.PATCH` version file.
///
/// Pre-release and build suffixes are rejected; the CI bump only ever
/// increments the patch component.
pub fn read_version(path: &Path) -> Result<semver::Version> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Manifest(format!("failed to read {}: {e}", path.display())))?;
    parse_version(text.trim())
}

fn parse_version(text: &str) -> Result<semver::Version> {
    let version = semver::Version::parse(text)
        .map_err(|e| Error::Manifest(format!("invalid version '{text}': {e}")))?;

    if !version.pre.is_empty() || !version.build.is_empty() {
        return Err(Error::Manifest(format!(
            "version must be MAJOR.MINOR.PATCH, found '{text}'"
        )));
    }

    Ok(version)
}

/// Conventional icon locations, checked when the manifest names none.
fn discover_icon(workspace: &Path) -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("assets").join("img").join("icon.icns"),
        PathBuf::from("assets").join("icon.icns"),
    ];

    for candidate in candidates {
        if workspace.join(&candidate).is_file() {
            log::info!("Found macOS icon: {}", candidate.display());
            return Some(candidate);
        }
    }

    log::debug!("No icon configured or found under assets/");
    None
}
