//! macOS signing, packaging, notarization and inspection.
//!
//! # Architecture
//!
//! - `sign` - Deep hardened-runtime signing and advisory verification
//! - `dmg` - Disk image creation with hdiutil
//! - `notarize` - Notary submission and stapling
//! - `inspect` - Read-only bundle summary

pub mod dmg;
pub mod inspect;
pub mod notarize;
pub mod sign;

use crate::bundler::{Arch, Error, Result, Settings, utils::process};
use tokio::process::Command;

/// Smoke-test launch of a built bundle with `open`.
///
/// The Intel bundle is launched under `arch -x86_64` so it runs translated
/// on Apple Silicon hosts.
pub async fn launch(settings: &Settings, arch: Arch) -> Result<()> {
    let bundle = settings.bundle_path(arch);
    if !bundle.is_dir() {
        return Err(Error::Precondition(format!(
            "no bundle at {}; run build-{arch} first",
            bundle.display()
        )));
    }

    let mut command = match arch {
        Arch::Arm64 => Command::new(&settings.tools().open),
        Arch::X86_64 => process::pinned(&settings.tools().arch, arch, &settings.tools().open),
    };
    command.arg(&bundle);

    log::info!("Launching {}", bundle.display());
    process::run_captured(&mut command).await?;
    Ok(())
}
