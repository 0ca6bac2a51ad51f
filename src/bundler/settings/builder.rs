//! Builder for constructing Settings.

use super::{
    Arch, ArchitectureSettings, BuildSpecification, DmgSettings, Settings, SigningSettings,
    ToolSettings,
};
use crate::bundler::{Error, Result, utils::fs::normalize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Builder for constructing [`Settings`].
///
/// Relative directories are resolved against the workspace at build time.
///
/// # See Also
///
/// - [`Settings`] - The built settings struct
#[derive(Default)]
pub struct SettingsBuilder {
    workspace: Option<PathBuf>,
    spec: Option<BuildSpecification>,
    requirements: Option<PathBuf>,
    manifest: Option<PathBuf>,
    version_file: Option<PathBuf>,
    build_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    architectures: BTreeMap<Arch, ArchitectureSettings>,
    tools: ToolSettings,
    signing: SigningSettings,
    dmg: DmgSettings,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the workspace root.
    ///
    /// # Required
    pub fn workspace<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.workspace = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the build specification.
    ///
    /// # Required
    pub fn spec(mut self, spec: BuildSpecification) -> Self {
        self.spec = Some(spec);
        self
    }

    /// Pinned dependency manifest.
    ///
    /// Default: `requirements.txt`
    pub fn requirements<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.requirements = Some(path.as_ref().to_path_buf());
        self
    }

    /// Manifest the settings were loaded from; `clean` must never reach it.
    pub fn manifest<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.manifest = Some(path.as_ref().to_path_buf());
        self
    }

    /// Version file stamped into the bundles; `clean` must never reach it.
    pub fn version_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.version_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Transient build directory.
    ///
    /// Default: `build`
    pub fn build_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.build_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Final artifact directory.
    ///
    /// Default: `dist`
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Per-architecture interpreter overrides.
    pub fn architectures(mut self, architectures: BTreeMap<Arch, ArchitectureSettings>) -> Self {
        self.architectures = architectures;
        self
    }

    /// External tool names.
    pub fn tools(mut self, tools: ToolSettings) -> Self {
        self.tools = tools;
        self
    }

    /// Signing options.
    pub fn signing(mut self, signing: SigningSettings) -> Self {
        self.signing = signing;
        self
    }

    /// Disk image options.
    pub fn dmg(mut self, dmg: DmgSettings) -> Self {
        self.dmg = dmg;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `workspace` or `spec` is missing, or if the build or
    /// output directory would take workspace inputs with it when removed.
    pub fn build(self) -> Result<Settings> {
        use crate::bundler::error::Context;

        let workspace = self.workspace.context("workspace is required")?;
        let spec = self.spec.context("spec is required")?;

        let under_workspace = |path: Option<PathBuf>, default: &str| {
            let path = path.unwrap_or_else(|| PathBuf::from(default));
            if path.is_absolute() {
                path
            } else {
                workspace.join(path)
            }
        };

        let requirements = under_workspace(self.requirements, "requirements.txt");
        let build_dir = under_workspace(self.build_dir, "build");
        let output_dir = under_workspace(self.output_dir, "dist");

        let resolve = |path: &Path| normalize(&workspace.join(path));
        let mut inputs: Vec<PathBuf> = vec![resolve(&spec.entry_point), normalize(&requirements)];
        inputs.extend(spec.resources.iter().map(|r| resolve(&r.source)));
        inputs.extend(spec.icon.iter().map(|icon| resolve(icon)));
        inputs.extend(self.manifest.iter().map(|p| resolve(p)));
        inputs.extend(self.version_file.iter().map(|p| resolve(p)));

        let environments: Vec<PathBuf> = Arch::ALL
            .iter()
            .map(|arch| resolve(Path::new(&format!("venv-{}", arch.as_str()))))
            .collect();

        for (key, dir) in [("build_dir", &build_dir), ("output_dir", &output_dir)] {
            check_removable(key, dir, &workspace, &environments, &inputs)?;
        }

        Ok(Settings::new(
            workspace,
            spec,
            requirements,
            build_dir,
            output_dir,
            self.architectures,
            self.tools,
            self.signing,
            self.dmg,
        ))
    }
}

/// Rejects a directory that `clean` could not remove without destroying
/// the workspace, an environment or an input of the build.
fn check_removable(
    key: &str,
    dir: &Path,
    workspace: &Path,
    environments: &[PathBuf],
    inputs: &[PathBuf],
) -> Result<()> {
    let dir = normalize(dir);
    let reject = |what: String| {
        Err(Error::Manifest(format!(
            "[paths] {key} = {} {what}",
            dir.display()
        )))
    };

    if normalize(workspace).starts_with(&dir) {
        return reject("is the workspace or one of its parents".into());
    }
    if let Some(env) = environments
        .iter()
        .find(|env| env.starts_with(&dir) || dir.starts_with(env))
    {
        return reject(format!("overlaps the environment {}", env.display()));
    }
    if let Some(input) = inputs.iter().find(|input| input.starts_with(&dir)) {
        return reject(format!("contains the build input {}", input.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{ErrorKind, ResourceMapping, test_spec};

    fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
            .workspace("/work/psydekick")
            .spec(test_spec("PsydeKick"))
            .manifest("release.toml")
            .version_file("VERSION")
    }

    fn rejection(builder: SettingsBuilder) -> String {
        let err = builder.build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Manifest);
        err.to_string()
    }

    #[test]
    fn defaults_are_accepted() {
        let settings = builder().build().unwrap();
        assert_eq!(settings.build_dir(), Path::new("/work/psydekick/build"));
        assert_eq!(settings.output_dir(), Path::new("/work/psydekick/dist"));
    }

    #[test]
    fn workspace_itself_is_rejected() {
        for dir in [".", "", "./", "dist/.."] {
            let msg = rejection(builder().output_dir(dir));
            assert!(msg.contains("output_dir"), "{dir}: {msg}");
            assert!(msg.contains("workspace"), "{dir}: {msg}");
        }
        assert!(rejection(builder().build_dir("/work")).contains("build_dir"));
        assert!(rejection(builder().build_dir("..")).contains("workspace"));
        assert!(rejection(builder().output_dir("/")).contains("workspace"));
    }

    #[test]
    fn environment_directories_are_rejected() {
        let msg = rejection(builder().build_dir("venv-x86_64"));
        assert!(msg.contains("environment"));
        let msg = rejection(builder().output_dir("venv-arm64/dist"));
        assert!(msg.contains("environment"));
    }

    #[test]
    fn directories_holding_inputs_are_rejected() {
        let mut spec = test_spec("PsydeKick");
        spec.entry_point = "app/run_app.py".into();
        let msg = rejection(builder().spec(spec).output_dir("app"));
        assert!(msg.contains("run_app.py"), "{msg}");

        let mut spec = test_spec("PsydeKick");
        spec.resources.push(ResourceMapping {
            source: "config/settings.yaml".into(),
            destination: "config".into(),
        });
        let msg = rejection(builder().spec(spec).build_dir("config"));
        assert!(msg.contains("settings.yaml"), "{msg}");

        let msg = rejection(builder().manifest("ci/release.toml").build_dir("ci"));
        assert!(msg.contains("release.toml"), "{msg}");

        let msg = rejection(builder().requirements("deps/requirements.txt").output_dir("deps"));
        assert!(msg.contains("requirements.txt"), "{msg}");
    }

    #[test]
    fn sibling_directories_outside_the_workspace_are_allowed() {
        let settings = builder().output_dir("/tmp/psydekick-dist").build().unwrap();
        assert_eq!(settings.output_dir(), Path::new("/tmp/psydekick-dist"));
    }
}
