//! Freezer invocation.
//!
//! Drives PyInstaller from the architecture's own environment, with output
//! and work directories namespaced by architecture, then relocates the
//! emitted `<AppName>.app` to its architecture-qualified final path.
//!
//! # Architecture
//!
//! - `template` - PyInstaller spec rendering from the build specification

mod template;

pub use template::{py_str, render_spec};

use crate::bundler::{
    Arch, Error, Result, Settings,
    error::{ErrorExt, Stage, StageExt},
    utils::{fs, process},
};
use std::path::PathBuf;

/// Freeze the application for `arch` and return the final bundle path.
///
/// # Process
/// 1. Check the environment and every input named by the specification
/// 2. Remove this architecture's previous final bundle and intermediates
/// 3. Render the spec and run the freezer
/// 4. Move the emitted bundle to its final path (the last mutating step)
/// 5. Delete the intermediate directories
///
/// A failed freeze leaves no final bundle behind, so later inspection
/// reports the architecture as absent.
pub async fn freeze(settings: &Settings, arch: Arch) -> Result<PathBuf> {
    freeze_inner(settings, arch)
        .await
        .in_stage(Stage::Freeze, arch)
}

async fn freeze_inner(settings: &Settings, arch: Arch) -> Result<PathBuf> {
    let env_python = settings.env_python(arch);
    if !env_python.exists() {
        return Err(Error::Precondition(format!(
            "no provisioned environment at {}; run provision-{arch} first",
            settings.env_dir(arch).display()
        )));
    }
    check_inputs(settings)?;

    let final_bundle = settings.bundle_path(arch);
    let dist_dir = settings.intermediate_dist_dir(arch);
    let work_dir = settings.intermediate_work_dir(arch);

    fs::ensure_absent(&final_bundle).await.into_result(&final_bundle)?;
    fs::create_dir_all(&dist_dir, true).await?;
    fs::create_dir_all(&work_dir, true).await?;

    let spec_path = settings.spec_file_path(arch);
    let rendered = render_spec(settings, arch)?;
    if let Some(parent) = spec_path.parent() {
        fs::create_dir_all(parent, false).await?;
    }
    tokio::fs::write(&spec_path, rendered)
        .await
        .fs_context("writing freezer spec", &spec_path)?;

    log::info!("Freezing {} for {}", settings.app_name(), arch);

    process::run_streamed(
        process::pinned(&settings.tools().arch, arch, &env_python)
            .args(["-m", "PyInstaller", "--noconfirm", "--clean", "--distpath"])
            .arg(&dist_dir)
            .arg("--workpath")
            .arg(&work_dir)
            .arg(&spec_path)
            .current_dir(settings.workspace()),
        &format!("freeze {arch}"),
    )
    .await?;

    let frozen = settings.frozen_bundle_path(arch);
    if !frozen.is_dir() {
        return Err(Error::GenericError(format!(
            "freezer reported success but produced no bundle at {}",
            frozen.display()
        )));
    }

    fs::move_dir(&frozen, &final_bundle).await?;

    for dir in [&dist_dir, &work_dir] {
        if let fs::EnsureAbsent::Failed(e) = fs::ensure_absent(dir).await {
            log::warn!("Could not remove {}: {}", dir.display(), e);
        }
    }

    log::info!("✓ {} bundle: {}", arch, final_bundle.display());
    Ok(final_bundle)
}

/// Verifies the entry point, icon and resource sources exist.
fn check_inputs(settings: &Settings) -> Result<()> {
    let spec = settings.spec();
    let mut missing = Vec::new();

    let entry = settings.resolve(&spec.entry_point);
    if !entry.is_file() {
        missing.push(entry);
    }
    if let Some(icon) = &spec.icon {
        let icon = settings.resolve(icon);
        if !icon.is_file() {
            missing.push(icon);
        }
    }
    for resource in &spec.resources {
        let source = settings.resolve(&resource.source);
        if !source.exists() {
            missing.push(source);
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        let list: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
        Err(Error::Precondition(format!(
            "build specification references missing files: {}",
            list.join(", ")
        )))
    }
}
