//! External tool availability.
//!
//! Checked once before a pipeline runs so a missing tool is reported up
//! front instead of halfway through a long build. Absence is only a warning:
//! the step that needs the tool still fails with its own diagnostic.

use super::graph::Step;
use crate::bundler::{Arch, Settings};
use std::collections::BTreeSet;

/// Programs the given steps will invoke, with the step kind needing them.
pub fn required_tools(settings: &Settings, steps: &[Step]) -> BTreeSet<(String, &'static str)> {
    let tools = settings.tools();
    let mut required = BTreeSet::new();

    for step in steps {
        match step {
            Step::Provision(arch) => {
                required.insert((tools.arch.clone(), "provision"));
                required.insert((settings.interpreter(*arch), "provision"));
            }
            Step::Freeze(_) => {
                required.insert((tools.arch.clone(), "freeze"));
            }
            Step::Sign(_) => {
                required.insert((tools.codesign.clone(), "sign"));
            }
            Step::CheckSignature(_) => {
                required.insert((tools.codesign.clone(), "verify"));
                required.insert((tools.spctl.clone(), "verify"));
            }
            Step::Package(_) => {
                required.insert((tools.hdiutil.clone(), "package"));
            }
            Step::Notarize(_) | Step::Staple(_) => {
                required.insert((tools.xcrun.clone(), "notarize"));
            }
            Step::Launch(arch) => {
                required.insert((tools.open.clone(), "launch"));
                if *arch == Arch::X86_64 {
                    required.insert((tools.arch.clone(), "launch"));
                }
            }
            Step::Clean => {
                required.insert((tools.hdiutil.clone(), "clean"));
            }
            Step::CleanEnvironments | Step::Inspect | Step::WriteManifest => {}
        }
    }

    required
}

/// Tools among `required_tools` that cannot be found, each logged as a warning.
pub fn missing_tools(settings: &Settings, steps: &[Step]) -> Vec<String> {
    let mut missing = Vec::new();

    for (program, purpose) in required_tools(settings, steps) {
        match which::which(&program) {
            Ok(path) => log::debug!("Found {program} at {}", path.display()),
            Err(e) => {
                // hdiutil is only needed by clean when a volume is still mounted.
                if purpose == "clean" {
                    log::debug!("{program} not found ({e}); stale volumes cannot be detached");
                    continue;
                }
                log::warn!("{program} not found ({e}); {purpose} steps will fail");
                missing.push(program);
            }
        }
    }

    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{SettingsBuilder, ToolSettings, test_spec};

    #[test]
    fn verify_needs_codesign_and_spctl_only() {
        let settings = SettingsBuilder::new()
            .workspace("/work")
            .spec(test_spec("PsydeKick"))
            .build()
            .unwrap();
        let tools = required_tools(&settings, &[Step::CheckSignature(Arch::Arm64), Step::Inspect]);
        let names: Vec<&str> = tools.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(names, vec!["codesign", "spctl"]);
    }

    #[test]
    fn unknown_program_is_reported_missing() {
        let settings = SettingsBuilder::new()
            .workspace("/work")
            .spec(test_spec("PsydeKick"))
            .tools(ToolSettings {
                hdiutil: "definitely-not-a-real-hdiutil-7f3a".into(),
                ..ToolSettings::default()
            })
            .build()
            .unwrap();
        let missing = missing_tools(&settings, &[Step::Package(Arch::X86_64)]);
        assert_eq!(missing, vec!["definitely-not-a-real-hdiutil-7f3a".to_string()]);
    }
}
