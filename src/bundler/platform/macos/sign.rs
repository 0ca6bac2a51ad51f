//! Code signing and post-signing verification.

use crate::bundler::{
    Arch, Error, Result, Settings, SigningIdentity,
    error::{Stage, StageExt},
    utils::process,
};
use std::path::PathBuf;
use tokio::process::Command;

/// Deep, hardened-runtime signature over the bundle for `arch`.
///
/// Covers every nested executable and framework. Fails if the bundle has not
/// been built.
pub async fn sign_bundle(settings: &Settings, identity: &SigningIdentity, arch: Arch) -> Result<()> {
    sign_inner(settings, identity, arch)
        .await
        .in_stage(Stage::Signing, arch)
}

async fn sign_inner(settings: &Settings, identity: &SigningIdentity, arch: Arch) -> Result<()> {
    let bundle = require_bundle(settings, arch)?;

    log::info!("Signing {} with '{}'", bundle.display(), identity.as_str());

    let mut command = Command::new(&settings.tools().codesign);
    command.args([
        "--force",
        "--deep",
        "--options",
        "runtime",
        "--timestamp",
        "--sign",
        identity.as_str(),
    ]);
    if let Some(entitlements) = &settings.signing().entitlements {
        command.arg("--entitlements").arg(settings.resolve(entitlements));
    }
    command.arg(&bundle);

    let output = process::run_captured(&mut command).await?;
    let detail = process::combined_output(&output);
    if !detail.is_empty() {
        log::debug!("{detail}");
    }

    log::info!("✓ Signed {}", arch);
    Ok(())
}

fn require_bundle(settings: &Settings, arch: Arch) -> Result<PathBuf> {
    let bundle = settings.bundle_path(arch);
    if bundle.is_dir() {
        Ok(bundle)
    } else {
        Err(Error::Precondition(format!(
            "no bundle at {}; run build-{arch} or build-all first",
            bundle.display()
        )))
    }
}

/// One advisory check's result.
#[derive(Clone, Debug)]
pub struct CheckOutcome {
    pub passed: bool,
    pub output: String,
}

/// Signature and execution-policy results for one bundle.
#[derive(Clone, Debug)]
pub struct SignatureCheck {
    pub arch: Arch,
    /// `None` when there was no bundle to check.
    pub codesign: Option<CheckOutcome>,
    pub gatekeeper: Option<CheckOutcome>,
}

impl SignatureCheck {
    /// Both checks ran and passed.
    pub fn passed(&self) -> bool {
        matches!(
            (&self.codesign, &self.gatekeeper),
            (Some(c), Some(g)) if c.passed && g.passed
        )
    }

    pub fn bundle_missing(&self) -> bool {
        self.codesign.is_none()
    }
}

async fn advisory(command: &mut Command) -> CheckOutcome {
    match process::run_captured(command).await {
        Ok(output) => CheckOutcome {
            passed: true,
            output: process::combined_output(&output),
        },
        Err(Error::ToolFailed { diagnostics, .. }) => CheckOutcome {
            passed: false,
            output: diagnostics,
        },
        Err(e) => CheckOutcome {
            passed: false,
            output: e.to_string(),
        },
    }
}

/// Re-verify the signature and assess Gatekeeper policy for `arch`.
///
/// Diagnostic only: results are logged verbosely and returned, never raised.
pub async fn check_signature(settings: &Settings, arch: Arch) -> SignatureCheck {
    let bundle = settings.bundle_path(arch);
    if !bundle.is_dir() {
        log::warn!("{}: no bundle at {}, nothing to verify", arch, bundle.display());
        return SignatureCheck {
            arch,
            codesign: None,
            gatekeeper: None,
        };
    }

    let codesign = advisory(
        Command::new(&settings.tools().codesign)
            .args(["--verify", "--deep", "--strict", "--verbose=2"])
            .arg(&bundle),
    )
    .await;
    log_outcome(arch, "codesign --verify", &codesign);

    let gatekeeper = advisory(
        Command::new(&settings.tools().spctl)
            .args(["--assess", "--type", "execute", "--verbose"])
            .arg(&bundle),
    )
    .await;
    log_outcome(arch, "spctl --assess", &gatekeeper);

    SignatureCheck {
        arch,
        codesign: Some(codesign),
        gatekeeper: Some(gatekeeper),
    }
}

fn log_outcome(arch: Arch, what: &str, outcome: &CheckOutcome) {
    if outcome.passed {
        log::info!("✓ {arch}: {what} passed");
    } else {
        log::warn!("{arch}: {what} did not pass");
    }
    for line in outcome.output.lines() {
        log::info!("  {line}");
    }
}
