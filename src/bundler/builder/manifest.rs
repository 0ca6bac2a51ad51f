//! Release manifest written next to the disk images.

use super::checksum::calculate_sha256;
use crate::bundler::{Arch, Error, Result, Settings, error::ErrorExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One packaged architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseArtifact {
    pub arch: String,
    pub display_name: String,
    pub bundle: PathBuf,
    pub disk_image: PathBuf,
    pub volume_label: String,
    pub size_bytes: u64,
    pub sha256: String,
}

/// Contents of `release-manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseManifest {
    pub app_name: String,
    pub version: String,
    pub bundle_identifier: String,
    pub generated_at: DateTime<Utc>,
    pub artifacts: Vec<ReleaseArtifact>,
}

/// Describe every disk image currently in the output directory.
///
/// Architectures without an image are left out; the manifest never lists an
/// artifact that does not exist.
pub async fn collect(settings: &Settings) -> Result<ReleaseManifest> {
    let mut artifacts = Vec::new();

    for arch in Arch::ALL {
        let dmg = settings.dmg_path(arch);
        if !dmg.is_file() {
            log::debug!("{arch}: no disk image, left out of the manifest");
            continue;
        }
        let size_bytes = tokio::fs::metadata(&dmg)
            .await
            .fs_context("reading disk image metadata", &dmg)?
            .len();

        artifacts.push(ReleaseArtifact {
            arch: arch.to_string(),
            display_name: arch.display_name().to_string(),
            bundle: relative_to(settings.workspace(), &settings.bundle_path(arch)),
            disk_image: relative_to(settings.workspace(), &dmg),
            volume_label: settings.volume_label(arch),
            size_bytes,
            sha256: calculate_sha256(&dmg).await?,
        });
    }

    Ok(ReleaseManifest {
        app_name: settings.app_name().to_string(),
        version: settings.version_string(),
        bundle_identifier: settings.spec().bundle_identifier.clone(),
        generated_at: Utc::now(),
        artifacts,
    })
}

/// Write the manifest to `dist/release-manifest.json`.
///
/// Fails when no architecture produced a disk image.
pub async fn write_manifest(settings: &Settings) -> Result<PathBuf> {
    let manifest = collect(settings).await?;
    if manifest.artifacts.is_empty() {
        return Err(Error::Precondition(
            "no disk images to describe; packaging failed for every architecture".into(),
        ));
    }

    let path = settings.release_manifest_path();
    let json = serde_json::to_string_pretty(&manifest)?;
    tokio::fs::write(&path, json)
        .await
        .fs_context("writing release manifest", &path)?;

    log::info!(
        "✓ Wrote {} ({} artifact(s))",
        path.display(),
        manifest.artifacts.len()
    );
    Ok(path)
}

fn relative_to(base: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(base).unwrap_or(path).to_path_buf()
}
