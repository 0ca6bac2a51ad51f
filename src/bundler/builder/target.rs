//! User-invocable pipeline targets.

use crate::bundler::Arch;
use std::fmt;

/// A named composition of steps.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Target {
    Provision(Arch),
    Build(Arch),
    BuildAll,
    PackageForDistribution,
    Notarize,
    Verify,
    Clean,
    CleanEnvironments,
    Launch(Arch),
}

impl Target {
    /// Every target, in the order `info` lists them.
    pub fn all() -> Vec<Target> {
        let mut targets = Vec::new();
        targets.extend(Arch::ALL.map(Target::Provision));
        targets.extend(Arch::ALL.map(Target::Build));
        targets.extend([
            Target::BuildAll,
            Target::PackageForDistribution,
            Target::Notarize,
            Target::Verify,
            Target::Clean,
            Target::CleanEnvironments,
        ]);
        targets.extend(Arch::ALL.map(Target::Launch));
        targets
    }

    /// One-line description for `info`.
    pub fn description(&self) -> String {
        match self {
            Target::Provision(a) => {
                format!("Recreate the {} environment and install dependencies", a.display_name())
            }
            Target::Build(a) => format!("Provision and freeze the {} bundle", a.display_name()),
            Target::BuildAll => "Clean, then build both architectures".into(),
            Target::PackageForDistribution => {
                "Build both, sign, check, create disk images and write the release manifest".into()
            }
            Target::Notarize => "Notarize and staple both disk images".into(),
            Target::Verify => "Check signatures and summarize both bundles".into(),
            Target::Clean => "Detach stale volumes, remove build outputs, caches and logs".into(),
            Target::CleanEnvironments => "Remove both architecture environments".into(),
            Target::Launch(a) => format!("Open the {} bundle for a smoke test", a.display_name()),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Provision(a) => write!(f, "provision-{a}"),
            Target::Build(a) => write!(f, "build-{a}"),
            Target::BuildAll => f.write_str("build-all"),
            Target::PackageForDistribution => f.write_str("package-for-distribution"),
            Target::Notarize => f.write_str("notarize"),
            Target::Verify => f.write_str("verify"),
            Target::Clean => f.write_str("clean"),
            Target::CleanEnvironments => f.write_str("clean-environments"),
            Target::Launch(a) => write!(f, "launch-{a}"),
        }
    }
}
