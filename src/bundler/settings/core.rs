//! Core Settings struct and workspace layout.

use super::{Arch, ArchitectureSettings, BuildSpecification, DmgSettings, SigningSettings, ToolSettings};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main settings for pipeline operations.
///
/// Holds the build specification and owns the workspace layout: every
/// architecture-scoped path is computed here and nowhere else, so no two
/// architectures can end up sharing one.
///
/// # Examples
///
/// ```
/// use psydekick_bundler_release::bundler::{Arch, SettingsBuilder};
///
/// # fn example(spec: psydekick_bundler_release::bundler::BuildSpecification)
/// #     -> psydekick_bundler_release::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .workspace("/work/psydekick")
///     .spec(spec)
///     .build()?;
///
/// println!("{}", settings.bundle_path(Arch::Arm64).display());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    workspace: PathBuf,
    spec: BuildSpecification,
    requirements: PathBuf,
    build_dir: PathBuf,
    output_dir: PathBuf,
    architectures: BTreeMap<Arch, ArchitectureSettings>,
    tools: ToolSettings,
    signing: SigningSettings,
    dmg: DmgSettings,
}

impl Settings {
    /// Returns the product name.
    pub fn app_name(&self) -> &str {
        &self.spec.app_name
    }

    /// Returns the version string.
    pub fn version_string(&self) -> String {
        self.spec.version.to_string()
    }

    /// Returns the build specification.
    pub fn spec(&self) -> &BuildSpecification {
        &self.spec
    }

    /// Workspace root; relative manifest paths resolve against it.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Resolves a manifest-relative path.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Pinned dependency manifest installed into each environment.
    pub fn requirements(&self) -> &Path {
        &self.requirements
    }

    /// Root of all transient build state.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Directory holding the final bundles and disk images.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Provisioned environment for `arch`.
    pub fn env_dir(&self, arch: Arch) -> PathBuf {
        self.workspace.join(format!("venv-{}", arch.as_str()))
    }

    /// Interpreter inside the provisioned environment.
    pub fn env_python(&self, arch: Arch) -> PathBuf {
        self.env_dir(arch).join("bin").join("python")
    }

    /// Host interpreter used to create the environment.
    pub fn interpreter(&self, arch: Arch) -> String {
        self.architectures
            .get(&arch)
            .and_then(|a| a.interpreter.clone())
            .unwrap_or_else(|| arch.default_interpreter().to_string())
    }

    /// Freezer output directory for `arch`.
    pub fn intermediate_dist_dir(&self, arch: Arch) -> PathBuf {
        self.build_dir.join(format!("dist-{}", arch.as_str()))
    }

    /// Freezer work directory for `arch`.
    pub fn intermediate_work_dir(&self, arch: Arch) -> PathBuf {
        self.build_dir.join(format!("work-{}", arch.as_str()))
    }

    /// Where the freezer emits its architecture-independent bundle name.
    pub fn frozen_bundle_path(&self, arch: Arch) -> PathBuf {
        self.intermediate_dist_dir(arch)
            .join(self.spec.frozen_bundle_name())
    }

    /// Generated freezer specification for `arch`.
    pub fn spec_file_path(&self, arch: Arch) -> PathBuf {
        self.build_dir
            .join("specs")
            .join(format!("{}-{}.spec", self.app_name(), arch.as_str()))
    }

    /// Artifact base name, e.g. `PsydeKick-AppleSilicon`.
    pub fn artifact_stem(&self, arch: Arch) -> String {
        format!("{}-{}", self.app_name(), arch.path_label())
    }

    /// Final, architecture-qualified bundle path.
    pub fn bundle_path(&self, arch: Arch) -> PathBuf {
        self.output_dir
            .join(format!("{}.app", self.artifact_stem(arch)))
    }

    /// Final disk image path.
    pub fn dmg_path(&self, arch: Arch) -> PathBuf {
        self.output_dir
            .join(format!("{}.dmg", self.artifact_stem(arch)))
    }

    /// Disk image volume label: `<AppName> (<ArchDisplayName>)`.
    pub fn volume_label(&self, arch: Arch) -> String {
        format!("{} ({})", self.app_name(), arch.display_name())
    }

    /// Where the disk image for `arch` is mounted when attached.
    pub fn mount_point(&self, arch: Arch) -> PathBuf {
        self.tools.volumes_root.join(self.volume_label(arch))
    }

    /// Release manifest written after packaging.
    pub fn release_manifest_path(&self) -> PathBuf {
        self.output_dir.join("release-manifest.json")
    }

    /// Returns the external tool names.
    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }

    /// Returns the signing options.
    pub fn signing(&self) -> &SigningSettings {
        &self.signing
    }

    /// Returns the disk image options.
    pub fn dmg(&self) -> &DmgSettings {
        &self.dmg
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        workspace: PathBuf,
        spec: BuildSpecification,
        requirements: PathBuf,
        build_dir: PathBuf,
        output_dir: PathBuf,
        architectures: BTreeMap<Arch, ArchitectureSettings>,
        tools: ToolSettings,
        signing: SigningSettings,
        dmg: DmgSettings,
    ) -> Self {
        Self {
            workspace,
            spec,
            requirements,
            build_dir,
            output_dir,
            architectures,
            tools,
            signing,
            dmg,
        }
    }
}
