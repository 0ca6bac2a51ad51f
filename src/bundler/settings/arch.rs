//! CPU architecture types and utilities.

use std::fmt;
use std::str::FromStr;

/// Target instruction set of one release pipeline.
///
/// Every artifact name for an architecture is derived from this value: the
/// environment directory, the freezer's intermediate directories, the final
/// bundle, the disk image and its volume label.
///
/// # Examples
///
/// ```
/// use psydekick_bundler_release::bundler::Arch;
///
/// let arch: Arch = "arm64".parse().unwrap();
/// assert_eq!(arch.display_name(), "Apple Silicon");
/// assert_eq!(arch.path_label(), "AppleSilicon");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Deserialize)]
pub enum Arch {
    /// AArch64 / Apple Silicon
    #[serde(rename = "arm64")]
    Arm64,
    /// x86_64 / Intel
    #[serde(rename = "x86_64")]
    X86_64,
}

impl Arch {
    /// Both supported architectures, in pipeline order.
    pub const ALL: [Arch; 2] = [Arch::Arm64, Arch::X86_64];

    /// Identifier used by `arch(1)`, the freezer and directory names.
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::X86_64 => "x86_64",
        }
    }

    /// Human-facing name, used in volume labels.
    pub fn display_name(self) -> &'static str {
        match self {
            Arch::Arm64 => "Apple Silicon",
            Arch::X86_64 => "Intel",
        }
    }

    /// Whitespace-free label used in artifact file names.
    pub fn path_label(self) -> &'static str {
        match self {
            Arch::Arm64 => "AppleSilicon",
            Arch::X86_64 => "Intel",
        }
    }

    /// Flag passed to `arch(1)` to pin a child process to this instruction set.
    pub fn arch_flag(self) -> String {
        format!("-{}", self.as_str())
    }

    /// Default interpreter location for this architecture's Homebrew prefix.
    pub fn default_interpreter(self) -> &'static str {
        match self {
            Arch::Arm64 => "/opt/homebrew/bin/python3",
            Arch::X86_64 => "/usr/local/bin/python3",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            "x86_64" | "x86-64" | "intel" => Ok(Arch::X86_64),
            other => Err(format!(
                "Unsupported architecture: {other}. Valid architectures: arm64, x86_64"
            )),
        }
    }
}
