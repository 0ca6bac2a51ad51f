//! macOS DMG disk image creation using hdiutil.
//!
//! One compressed, read-only image per architecture, wrapping that
//! architecture's signed bundle under its plain application name, with a
//! fixed capacity ceiling and the `<AppName> (<Arch>)` volume label.

use crate::bundler::{
    Arch, Error, Result, Settings,
    error::{ErrorExt, Stage, StageExt},
    utils::{fs, process},
};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Package the signed bundle for `arch` into its disk image.
///
/// # Process
/// 1. Require the final bundle
/// 2. Stage it in a temporary directory under the build dir (so an
///    interrupted run is recovered by `clean`), plus an Applications symlink
/// 3. `hdiutil create -volname <label> -srcfolder <staging> -ov -format UDZO -size <cap>`
///
/// Overwrites any previous image for `arch`; never touches the other
/// architecture's image.
pub async fn create_dmg(settings: &Settings, arch: Arch) -> Result<PathBuf> {
    create_inner(settings, arch)
        .await
        .in_stage(Stage::Packaging, arch)
}

async fn create_inner(settings: &Settings, arch: Arch) -> Result<PathBuf> {
    let bundle = settings.bundle_path(arch);
    if !bundle.is_dir() {
        return Err(Error::Precondition(format!(
            "no bundle at {}; run package-for-distribution or build-{arch} first",
            bundle.display()
        )));
    }

    let dmg_path = settings.dmg_path(arch);
    let volume_label = settings.volume_label(arch);

    fs::create_dir_all(settings.build_dir(), false).await?;
    let staging = tempfile::Builder::new()
        .prefix(&format!("dmg-{}-", arch.as_str()))
        .tempdir_in(settings.build_dir())
        .fs_context("creating DMG staging directory", settings.build_dir())?;

    let staged_app = staging.path().join(settings.spec().frozen_bundle_name());
    log::debug!("Staging {} at {}", bundle.display(), staged_app.display());
    fs::copy_dir(&bundle, &staged_app).await?;

    #[cfg(unix)]
    {
        if settings.dmg().applications_symlink {
            let link = staging.path().join("Applications");
            std::os::unix::fs::symlink("/Applications", &link)
                .fs_context("creating Applications symlink", &link)?;
        }
    }

    log::info!("Creating {} ({})", dmg_path.display(), volume_label);

    process::run_captured(&mut hdiutil_create(
        settings,
        &volume_label,
        staging.path(),
        &dmg_path,
    ))
    .await?;

    if !dmg_path.is_file() {
        return Err(Error::GenericError(format!(
            "hdiutil reported success but {} does not exist",
            dmg_path.display()
        )));
    }

    drop(staging);

    log::info!("✓ Created {}", dmg_path.display());
    Ok(dmg_path)
}

fn hdiutil_create(settings: &Settings, volume_label: &str, srcfolder: &Path, dmg: &Path) -> Command {
    let dmg_settings = settings.dmg();
    let mut command = Command::new(&settings.tools().hdiutil);
    command
        .args(["create", "-volname", volume_label, "-srcfolder"])
        .arg(srcfolder)
        .args([
            "-ov",
            "-format",
            dmg_settings.format.as_str(),
            "-size",
            dmg_settings.capacity.as_str(),
        ])
        .arg(dmg);
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{ErrorKind, SettingsBuilder, test_spec, utils::process::describe};

    fn settings(root: &Path) -> Settings {
        SettingsBuilder::new()
            .workspace(root)
            .spec(test_spec("PsydeKick"))
            .build()
            .unwrap()
    }

    #[test]
    fn hdiutil_arguments_carry_label_format_and_capacity() {
        let s = settings(Path::new("/work"));
        let cmd = hdiutil_create(
            &s,
            &s.volume_label(Arch::Arm64),
            Path::new("/work/build/stage"),
            &s.dmg_path(Arch::Arm64),
        );
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            vec![
                "create",
                "-volname",
                "PsydeKick (Apple Silicon)",
                "-srcfolder",
                "/work/build/stage",
                "-ov",
                "-format",
                "UDZO",
                "-size",
                "1g",
                "/work/dist/PsydeKick-AppleSilicon.dmg",
            ]
        );
        assert!(describe(&cmd).starts_with("hdiutil create"));
    }

    #[tokio::test]
    async fn packaging_requires_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_dmg(&settings(dir.path()), Arch::X86_64)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Packaging);
        assert!(!dir.path().join("dist/PsydeKick-Intel.dmg").exists());
    }
}
