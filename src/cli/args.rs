//! Command line argument parsing.

use crate::bundler::{Arch, Target};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dual-architecture release pipeline for the PsydeKick macOS app
#[derive(Parser, Debug)]
#[command(
    name = "psydekick_release",
    version,
    about = "Build, sign, package and notarize Apple Silicon and Intel macOS bundles",
    long_about = "Builds one frozen .app per architecture from a Python program described by
release.toml, signs each bundle, wraps it in a disk image and optionally
notarizes and staples the image.

Usage:
  psydekick_release build-all
  CODESIGN_IDENTITY='Developer ID Application: …' psydekick_release package-for-distribution
  psydekick_release notarize --apple-id me@example.com --team-id ABCDE12345

Exit code 0 = every step of the target succeeded."
)]
pub struct Args {
    /// Workspace root holding release.toml, VERSION and requirements.txt
    #[arg(short = 'C', long, global = true, value_name = "DIR", default_value = ".")]
    pub workspace: PathBuf,

    /// Release manifest (default: <workspace>/release.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Only print errors and the final status
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Release targets.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Recreate the Apple Silicon environment
    #[command(name = "provision-arm64")]
    ProvisionArm64,
    /// Recreate the Intel environment
    #[command(name = "provision-x86_64")]
    ProvisionX86_64,
    /// Provision and freeze the Apple Silicon bundle
    #[command(name = "build-arm64")]
    BuildArm64,
    /// Provision and freeze the Intel bundle
    #[command(name = "build-x86_64")]
    BuildX86_64,
    /// Clean, build both architectures and summarize
    #[command(name = "build-all")]
    BuildAll,
    /// Build, sign, check and package both architectures
    #[command(name = "package-for-distribution")]
    PackageForDistribution,
    /// Submit both disk images for notarization and staple the tickets
    Notarize {
        /// Apple ID (prompted for when omitted)
        #[arg(long, value_name = "EMAIL")]
        apple_id: Option<String>,
        /// Developer team ID (prompted for when omitted)
        #[arg(long, value_name = "TEAM")]
        team_id: Option<String>,
    },
    /// Check signatures and Gatekeeper policy, then summarize
    Verify {
        /// Exit non-zero when a signature or policy check does not pass
        #[arg(long)]
        strict: bool,
    },
    /// Detach stale volumes, remove build outputs, caches and logs
    Clean,
    /// Remove both architecture environments
    #[command(name = "clean-environments")]
    CleanEnvironments,
    /// Open the Apple Silicon bundle
    #[command(name = "launch-arm64")]
    LaunchArm64,
    /// Open the Intel bundle
    #[command(name = "launch-x86_64")]
    LaunchX86_64,
    /// Describe the targets and the workspace layout
    Info,
}

impl Command {
    /// Pipeline target, `None` for `info`.
    pub fn target(&self) -> Option<Target> {
        let target = match self {
            Command::ProvisionArm64 => Target::Provision(Arch::Arm64),
            Command::ProvisionX86_64 => Target::Provision(Arch::X86_64),
            Command::BuildArm64 => Target::Build(Arch::Arm64),
            Command::BuildX86_64 => Target::Build(Arch::X86_64),
            Command::BuildAll => Target::BuildAll,
            Command::PackageForDistribution => Target::PackageForDistribution,
            Command::Notarize { .. } => Target::Notarize,
            Command::Verify { .. } => Target::Verify,
            Command::Clean => Target::Clean,
            Command::CleanEnvironments => Target::CleanEnvironments,
            Command::LaunchArm64 => Target::Launch(Arch::Arm64),
            Command::LaunchX86_64 => Target::Launch(Arch::X86_64),
            Command::Info => return None,
        };
        Some(target)
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Manifest path, defaulting to `release.toml` in the workspace.
    pub fn manifest_path(&self) -> PathBuf {
        match &self.manifest {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.workspace.join(path),
            None => self.workspace.join(crate::metadata::MANIFEST_FILE),
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.quiet),
        }
    }
}

impl RuntimeConfig {
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn every_target_has_a_subcommand() {
        for target in Target::all() {
            let name = target.to_string();
            let args = Args::try_parse_from(["psydekick_release", name.as_str()]).unwrap();
            assert_eq!(args.command.target(), Some(target));
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let args = Args::try_parse_from([
            "psydekick_release",
            "verify",
            "--strict",
            "--workspace",
            "/work",
            "--manifest",
            "ci/release.toml",
        ])
        .unwrap();
        assert_eq!(args.command, Command::Verify { strict: true });
        assert_eq!(args.manifest_path(), PathBuf::from("/work/ci/release.toml"));
    }

    #[test]
    fn notarize_accepts_ids() {
        let args = Args::try_parse_from([
            "psydekick_release",
            "notarize",
            "--apple-id",
            "dev@example.com",
            "--team-id",
            "ABCDE12345",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Command::Notarize {
                apple_id: Some("dev@example.com".into()),
                team_id: Some("ABCDE12345".into()),
            }
        );
    }
}
