//! Workspace lifecycle: removing generated state.
//!
//! Every operation here is idempotent and never fails the run. Anything that
//! could not be removed is reported as a warning and left for the next clean.

use crate::bundler::{
    Arch, Settings,
    utils::{
        fs::{EnsureAbsent, ensure_absent, find_matching},
        process,
    },
};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Directory names never descended into while sweeping caches and logs.
const SWEEP_SKIP_DIRS: &[&str] = &[".git", "target"];

/// Result of a cleaning operation.
#[derive(Debug, Default)]
pub struct CleanReport {
    /// Paths that existed and were removed (or volumes detached).
    pub removed: Vec<PathBuf>,
    /// Cleanup warnings: things that could not be removed.
    pub warnings: Vec<String>,
}

impl CleanReport {
    fn record(&mut self, path: &Path, outcome: EnsureAbsent) {
        match outcome {
            EnsureAbsent::Removed => {
                log::info!("Removed {}", path.display());
                self.removed.push(path.to_path_buf());
            }
            EnsureAbsent::AlreadyAbsent => {
                log::debug!("{} already absent", path.display());
            }
            EnsureAbsent::Failed(e) => {
                let warning = format!("could not remove {}: {e}", path.display());
                log::warn!("{warning}");
                self.warnings.push(warning);
            }
        }
    }
}

/// Detach stale volumes and remove build outputs, caches and logs.
///
/// Environments are left alone; see [`clean_environments`].
pub async fn clean(settings: &Settings) -> CleanReport {
    let mut report = CleanReport::default();

    for arch in Arch::ALL {
        let mount_point = settings.mount_point(arch);
        let outcome = detach_volume(settings, &mount_point).await;
        report.record(&mount_point, outcome);
    }

    for dir in [settings.build_dir(), settings.output_dir()] {
        let outcome = ensure_absent(dir).await;
        report.record(dir, outcome);
    }

    let mut skip: Vec<PathBuf> = Arch::ALL.iter().map(|a| settings.env_dir(*a)).collect();
    skip.extend(SWEEP_SKIP_DIRS.iter().map(|d| settings.workspace().join(d)));

    let workspace = settings.workspace().to_path_buf();
    let stale = tokio::task::spawn_blocking(move || {
        find_matching(&workspace, &skip, |entry| {
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_dir() {
                name == "__pycache__"
            } else {
                name.ends_with(".pyc") || name.ends_with(".log")
            }
        })
    })
    .await
    .unwrap_or_else(|e| {
        log::warn!("cache sweep aborted: {e}");
        Vec::new()
    });

    for path in stale {
        let outcome = ensure_absent(&path).await;
        report.record(&path, outcome);
    }

    log::info!(
        "Clean finished: {} removed, {} warning(s)",
        report.removed.len(),
        report.warnings.len()
    );
    report
}

/// Remove both architectures' environments.
pub async fn clean_environments(settings: &Settings) -> CleanReport {
    let mut report = CleanReport::default();
    for arch in Arch::ALL {
        let env = settings.env_dir(arch);
        let outcome = ensure_absent(&env).await;
        report.record(&env, outcome);
    }
    report
}

async fn detach_volume(settings: &Settings, mount_point: &Path) -> EnsureAbsent {
    if !mount_point.exists() {
        return EnsureAbsent::AlreadyAbsent;
    }

    let mut command = Command::new(&settings.tools().hdiutil);
    command.arg("detach").arg(mount_point).arg("-force");

    match process::run_captured(&mut command).await {
        Ok(_) => EnsureAbsent::Removed,
        // The volume went away while we were detaching it.
        Err(_) if !mount_point.exists() => EnsureAbsent::AlreadyAbsent,
        Err(e) => EnsureAbsent::Failed(std::io::Error::other(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{SettingsBuilder, ToolSettings, test_spec};

    fn settings(root: &Path) -> Settings {
        SettingsBuilder::new()
            .workspace(root)
            .spec(test_spec("PsydeKick"))
            .tools(ToolSettings {
                volumes_root: root.join("Volumes"),
                ..ToolSettings::default()
            })
            .build()
            .unwrap()
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    #[tokio::test]
    async fn clean_removes_outputs_caches_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("build/work-arm64/x.toc"));
        touch(&root.join("dist/PsydeKick-Intel.dmg"));
        touch(&root.join("utils/__pycache__/helpers.cpython-311.pyc"));
        touch(&root.join("workflows/stray.pyc"));
        touch(&root.join("streamlit.log"));
        touch(&root.join("main.py"));

        let report = clean(&settings(root)).await;

        assert!(report.warnings.is_empty());
        assert!(!root.join("build").exists());
        assert!(!root.join("dist").exists());
        assert!(!root.join("utils/__pycache__").exists());
        assert!(!root.join("workflows/stray.pyc").exists());
        assert!(!root.join("streamlit.log").exists());
        assert!(root.join("main.py").exists());
    }

    #[tokio::test]
    async fn clean_does_not_descend_into_environments() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let cached = root.join("venv-arm64/lib/site/__pycache__/mod.pyc");
        touch(&cached);

        clean(&settings(root)).await;

        assert!(cached.exists());
    }

    #[tokio::test]
    async fn clean_twice_is_a_no_op_the_second_time() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("build/specs/PsydeKick-arm64.spec"));
        let s = settings(dir.path());

        let first = clean(&s).await;
        let second = clean(&s).await;

        assert!(!first.removed.is_empty());
        assert!(second.removed.is_empty());
        assert!(second.warnings.is_empty());
    }

    #[tokio::test]
    async fn clean_environments_removes_both() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("venv-arm64/bin/python"));
        touch(&root.join("venv-x86_64/bin/python"));

        let report = clean_environments(&settings(root)).await;

        assert_eq!(report.removed.len(), 2);
        assert!(!root.join("venv-arm64").exists());
        assert!(!root.join("venv-x86_64").exists());
        assert!(clean_environments(&settings(root)).await.removed.is_empty());
    }

    /// Settings whose `hdiutil` is a shell script running `body`, with the
    /// Apple Silicon volume mounted under the workspace.
    #[cfg(unix)]
    fn with_mounted_volume(root: &Path, body: &str) -> (Settings, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let hdiutil = root.join("fake-bin/hdiutil");
        std::fs::create_dir_all(hdiutil.parent().unwrap()).unwrap();
        std::fs::write(&hdiutil, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&hdiutil, std::fs::Permissions::from_mode(0o755)).unwrap();

        let settings = SettingsBuilder::new()
            .workspace(root)
            .spec(test_spec("PsydeKick"))
            .tools(ToolSettings {
                hdiutil: hdiutil.display().to_string(),
                volumes_root: root.join("Volumes"),
                ..ToolSettings::default()
            })
            .build()
            .unwrap();
        let mount = settings.mount_point(Arch::Arm64);
        std::fs::create_dir_all(&mount).unwrap();
        (settings, mount)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn detached_volume_is_recorded_as_removed() {
        let dir = tempfile::tempdir().unwrap();
        let (s, mount) = with_mounted_volume(dir.path(), "exit 0");
        assert!(mount.ends_with("Volumes/PsydeKick (Apple Silicon)"));

        assert!(matches!(detach_volume(&s, &mount).await, EnsureAbsent::Removed));

        let report = clean(&s).await;
        assert!(report.removed.contains(&mount));
        assert!(report.warnings.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_detach_is_a_single_warning() {
        let dir = tempfile::tempdir().unwrap();
        let (s, mount) = with_mounted_volume(
            dir.path(),
            "echo 'hdiutil: detach failed - Resource busy' >&2\nexit 1",
        );

        let report = clean(&s).await;

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("PsydeKick (Apple Silicon)"));
        assert!(report.warnings[0].contains("Resource busy"));
        assert!(!report.removed.contains(&mount));
        assert!(mount.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn volume_vanishing_during_detach_is_already_absent() {
        let dir = tempfile::tempdir().unwrap();
        let (s, mount) = with_mounted_volume(dir.path(), "rm -rf \"$2\"\nexit 1");

        assert!(matches!(
            detach_volume(&s, &mount).await,
            EnsureAbsent::AlreadyAbsent
        ));
        assert!(!mount.exists());
    }

    #[tokio::test]
    async fn absent_mount_point_is_already_absent() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(dir.path());
        let outcome = detach_volume(&s, &s.mount_point(Arch::Arm64)).await;
        assert!(matches!(outcome, EnsureAbsent::AlreadyAbsent));
    }
}
