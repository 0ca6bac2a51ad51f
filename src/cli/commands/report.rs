//! End-of-run summary.

use crate::bundler::{PipelineReport, StepOutcome, platform::macos::sign::SignatureCheck};
use crate::cli::OutputManager;
use std::io;

pub(super) fn print(output: &OutputManager, report: &PipelineReport) -> io::Result<()> {
    output.section("Steps")?;
    for (step, outcome) in &report.steps {
        match outcome {
            StepOutcome::Succeeded => output.success(&step.to_string())?,
            StepOutcome::Failed(e) => output.error(&format!("{step}: {e}"))?,
            StepOutcome::Skipped { blocked_by } if blocked_by.is_empty() => {
                output.warn(&format!("{step}: skipped, nothing to do"))?
            }
            StepOutcome::Skipped { blocked_by } => output.warn(&format!(
                "{step}: skipped, {} did not succeed",
                blocked_by
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))?,
        }
    }

    if !report.signature_checks.is_empty() {
        output.section("Signatures")?;
        for check in &report.signature_checks {
            print_check(output, check)?;
        }
    }

    if let Some(inspection) = &report.inspection {
        output.section("Bundles")?;
        output.indent(&inspection.to_string())?;
    }

    for (arch, id) in &report.notary_submissions {
        output.success(&format!("{arch}: notarization accepted ({id})"))?;
    }

    if let Some(manifest) = &report.manifest {
        output.success(&format!("Release manifest: {}", manifest.display()))?;
    }

    for warning in &report.cleanup_warnings {
        output.warn(warning)?;
    }

    Ok(())
}

fn print_check(output: &OutputManager, check: &SignatureCheck) -> io::Result<()> {
    let arch = check.arch;
    if check.bundle_missing() {
        return output.warn(&format!("{arch}: no bundle to check"));
    }
    for (name, outcome) in [("codesign", &check.codesign), ("gatekeeper", &check.gatekeeper)] {
        match outcome {
            Some(o) if o.passed => output.success(&format!("{arch}: {name} ok"))?,
            Some(o) => {
                output.warn(&format!("{arch}: {name} did not pass"))?;
                output.indent(&o.output)?;
            }
            None => {}
        }
    }
    Ok(())
}
