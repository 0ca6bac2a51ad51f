//! `info`: static description of the targets, plus the resolved layout when
//! a manifest is available.

use crate::bundler::{Arch, Settings, Target};
use crate::cli::OutputManager;
use console::Style;
use std::io;

pub(super) fn show(output: &OutputManager, settings: Option<&Settings>) -> io::Result<()> {
    output.section("Targets")?;
    let name = Style::new().bold();
    for target in Target::all() {
        output.plain(&target_line(&name, &target.to_string(), &target.description()))?;
    }
    output.plain(&target_line(&name, "info", "Show this overview"))?;

    output.section("Configuration")?;
    output.indent(&format!(
        "{} signing identity for package-for-distribution (environment or .env)",
        crate::bundler::SIGNING_IDENTITY_VAR
    ))?;
    output.indent("notarize prompts for the Apple ID, team ID and app-specific password")?;

    let Some(settings) = settings else {
        output.section("Layout")?;
        output.indent("No release.toml found; run from the workspace or pass --manifest")?;
        return Ok(());
    };

    output.section(&format!(
        "Layout for {} {}",
        settings.app_name(),
        settings.version_string()
    ))?;
    for arch in Arch::ALL {
        output.plain(&format!("  {} ({arch})", arch.display_name()))?;
        output.indent(&format!(
            "  environment: {}\n  bundle:      {}\n  disk image:  {}\n  volume:      {}",
            settings.env_dir(arch).display(),
            settings.bundle_path(arch).display(),
            settings.dmg_path(arch).display(),
            settings.volume_label(arch),
        ))?;
    }
    Ok(())
}

/// Pads before styling; escape codes would otherwise count toward the width.
fn target_line(style: &Style, name: &str, description: &str) -> String {
    format!("  {} {description}", style.apply_to(format!("{name:<26}")))
}
