//! Command execution.
//!
//! Resolves the workspace, loads `.env` and the release manifest, builds the
//! process-wide [`ReleaseConfig`] once and hands the target to the pipeline.

mod info;
mod notarize;
mod report;

pub use notarize::prompt_credentials;

use super::{Args, Command, RuntimeConfig};
use crate::bundler::{self, Pipeline, ReleaseConfig, platform::macos::notarize::packaged_architectures};
use crate::error::Result;
use crate::metadata::load_manifest;
use anyhow::Context;
use std::path::Path;

/// Execute the parsed command and return the process exit code.
pub async fn execute(args: &Args, runtime: &RuntimeConfig) -> Result<i32> {
    let output = runtime.output();
    let workspace = std::path::absolute(&args.workspace)
        .with_context(|| format!("cannot resolve workspace {}", args.workspace.display()))?;
    load_env_file(&workspace);

    let Some(target) = args.command.target() else {
        let settings = load_manifest(&args.manifest_path(), Some(&workspace));
        if let Err(e) = &settings {
            log::debug!("info without a manifest: {e}");
        }
        info::show(output, settings.as_ref().ok())?;
        return Ok(0);
    };

    let settings = load_manifest(&args.manifest_path(), Some(&workspace))?;
    let config = ReleaseConfig::from_env();
    let mut pipeline = Pipeline::new(&settings, &config);

    if let Command::Notarize { apple_id, team_id } = &args.command {
        let pending = packaged_architectures(&settings);
        if pending.is_empty() {
            return Err(bundler::Error::Precondition(
                "no disk images to notarize; run package-for-distribution first".into(),
            )
            .into());
        }
        output.progress(&format!(
            "Notarizing {}",
            pending
                .iter()
                .map(|a| settings.dmg_path(*a).display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))?;
        let credentials = prompt_credentials(apple_id.clone(), team_id.clone())?;
        pipeline = pipeline.with_credentials(credentials);
    }

    output.section(&format!(
        "{} {} · {}",
        settings.app_name(),
        settings.version_string(),
        target
    ))?;

    let report = pipeline.run(target).await?;
    // Dropping the pipeline clears the notary password.
    drop(pipeline);

    report::print(output, &report)?;

    let mut success = report.success();
    if matches!(args.command, Command::Verify { strict: true }) && !report.signature_checks_passed()
    {
        output.error("signature or Gatekeeper checks did not pass (--strict)")?;
        success = false;
    }

    if success {
        output.success(&format!("{target} finished"))?;
        Ok(0)
    } else {
        output.error(&format!("{target} failed"))?;
        Ok(1)
    }
}

/// Load `<workspace>/.env` without overriding variables already set.
fn load_env_file(workspace: &Path) {
    let env_file = workspace.join(".env");
    match dotenvy::from_path(&env_file) {
        Ok(()) => log::debug!("Loaded {}", env_file.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("Ignoring {}: {e}", env_file.display()),
    }
}
