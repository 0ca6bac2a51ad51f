//! Notarization and stapling.
//!
//! Submission blocks inside `notarytool --wait`; the coordinator only shows
//! progress while it waits. A ticket is stapled only after the service
//! returned an `Accepted` verdict for that same image.

use crate::bundler::{
    Arch, Error, NotaryCredentials, Result, Settings,
    error::{Stage, StageExt},
    utils::process,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// Verdict JSON printed by `notarytool submit --output-format json`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NotaryVerdict {
    pub id: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
}

impl NotaryVerdict {
    pub fn accepted(&self) -> bool {
        self.status.as_deref() == Some("Accepted")
    }
}

/// Submit the disk image for `arch` and wait for the verdict.
///
/// Fails unless the service accepted the submission.
pub async fn submit(
    settings: &Settings,
    credentials: &NotaryCredentials,
    arch: Arch,
) -> Result<NotaryVerdict> {
    submit_inner(settings, credentials, arch)
        .await
        .in_stage(Stage::Notarization, arch)
}

async fn submit_inner(
    settings: &Settings,
    credentials: &NotaryCredentials,
    arch: Arch,
) -> Result<NotaryVerdict> {
    let dmg = require_dmg(settings, arch)?;
    let xcrun = &settings.tools().xcrun;

    // notarytool only takes the password on its argument list. The command
    // holds the single copy outside the credentials and is dropped right
    // after the submission returns.
    let mut command = Command::new(xcrun);
    command
        .args(["notarytool", "submit"])
        .arg(&dmg)
        .args(["--apple-id", credentials.apple_id()])
        .args(["--team-id", credentials.team_id()])
        .arg("--password")
        .arg(credentials.password())
        .args(["--wait", "--output-format", "json"]);

    let shown = format!(
        "{xcrun} notarytool submit {} --apple-id {} --team-id {} --password ******** --wait",
        dmg.display(),
        credentials.apple_id(),
        credentials.team_id()
    );

    let spinner = waiting_spinner(&format!("Notarizing {} ({})", dmg.display(), arch));
    let result = process::run_captured_as(&mut command, &shown).await;
    drop(command);
    spinner.finish_and_clear();

    let output = result?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let verdict = parse_verdict(&stdout).map_err(|e| {
        Error::GenericError(format!(
            "unreadable notary response ({e}):\n{}",
            process::combined_output(&output)
        ))
    })?;

    if !verdict.accepted() {
        let id = verdict.id.clone().unwrap_or_default();
        return Err(Error::GenericError(format!(
            "notary service returned status {} for submission {}: {}\n\
             Inspect the log with: {} notarytool log {} --apple-id {} --team-id {}",
            verdict.status.as_deref().unwrap_or("<none>"),
            id,
            verdict.message.as_deref().unwrap_or(""),
            xcrun,
            id,
            credentials.apple_id(),
            credentials.team_id()
        )));
    }

    log::info!(
        "✓ {} notarization accepted (submission {})",
        arch,
        verdict.id.as_deref().unwrap_or("?")
    );
    Ok(verdict)
}

/// Staple the notarization ticket onto the disk image for `arch`.
pub async fn staple(settings: &Settings, arch: Arch) -> Result<()> {
    staple_inner(settings, arch)
        .await
        .in_stage(Stage::Notarization, arch)
}

async fn staple_inner(settings: &Settings, arch: Arch) -> Result<()> {
    let dmg = require_dmg(settings, arch)?;
    let output = process::run_captured(
        Command::new(&settings.tools().xcrun)
            .args(["stapler", "staple"])
            .arg(&dmg),
    )
    .await?;
    log::debug!("{}", process::combined_output(&output));
    log::info!("✓ Stapled ticket to {}", dmg.display());
    Ok(())
}

/// Architectures whose disk image exists, i.e. what `notarize` would submit.
pub fn packaged_architectures(settings: &Settings) -> Vec<Arch> {
    Arch::ALL
        .into_iter()
        .filter(|arch| settings.dmg_path(*arch).is_file())
        .collect()
}

fn require_dmg(settings: &Settings, arch: Arch) -> Result<PathBuf> {
    let dmg = settings.dmg_path(arch);
    if dmg.is_file() {
        Ok(dmg)
    } else {
        Err(Error::Precondition(format!(
            "no disk image at {}; run package-for-distribution first",
            dmg.display()
        )))
    }
}

fn parse_verdict(stdout: &str) -> serde_json::Result<NotaryVerdict> {
    // notarytool may print progress before the JSON document.
    let start = stdout.find('{').unwrap_or(0);
    serde_json::from_str(stdout[start..].trim())
}

fn waiting_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
