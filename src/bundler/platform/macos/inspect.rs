//! Read-only bundle inspection.
//!
//! Reports, per architecture, whether the final bundle exists, what kind of
//! binary its main executable is and how large the bundle is. An absent
//! bundle is a distinct status, never an error.

use crate::bundler::{
    Arch, Settings,
    builder::checksum::calculate_sha256,
    utils::fs::{format_size, tree_size},
};
use goblin::mach::{Mach, cputype};
use std::fmt;
use std::path::{Path, PathBuf};

/// State of one architecture's bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BundleStatus {
    /// No bundle at the final path.
    Absent,
    /// Bundle present.
    Present {
        executable: PathBuf,
        format: String,
        size_bytes: u64,
    },
}

/// Disk image facts, when one exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiskImageInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub sha256: Option<String>,
}

/// Inspection result for one architecture.
#[derive(Clone, Debug)]
pub struct ArchInspection {
    pub arch: Arch,
    pub bundle_path: PathBuf,
    pub status: BundleStatus,
    pub disk_image: Option<DiskImageInfo>,
}

/// Inspection result for both architectures.
#[derive(Clone, Debug)]
pub struct InspectionReport {
    pub entries: Vec<ArchInspection>,
}

impl InspectionReport {
    pub fn get(&self, arch: Arch) -> Option<&ArchInspection> {
        self.entries.iter().find(|e| e.arch == arch)
    }
}

impl fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{} ({})", entry.arch.display_name(), entry.arch)?;
            match &entry.status {
                BundleStatus::Absent => {
                    writeln!(f, "  bundle:  not built ({})", entry.bundle_path.display())?
                }
                BundleStatus::Present {
                    executable,
                    format,
                    size_bytes,
                } => {
                    writeln!(f, "  bundle:  {}", entry.bundle_path.display())?;
                    writeln!(f, "  binary:  {} ({})", format, executable.display())?;
                    writeln!(f, "  size:    {}", format_size(*size_bytes))?;
                }
            }
            if let Some(dmg) = &entry.disk_image {
                writeln!(
                    f,
                    "  dmg:     {} ({})",
                    dmg.path.display(),
                    format_size(dmg.size_bytes)
                )?;
                if let Some(sum) = &dmg.sha256 {
                    writeln!(f, "  sha256:  {sum}")?;
                }
            }
        }
        Ok(())
    }
}

/// Inspect both architectures' outputs.
pub async fn inspect(settings: &Settings) -> InspectionReport {
    let mut entries = Vec::new();

    for arch in Arch::ALL {
        let bundle_path = settings.bundle_path(arch);
        let status = inspect_bundle(settings.app_name(), &bundle_path).await;

        let dmg_path = settings.dmg_path(arch);
        let disk_image = if dmg_path.is_file() {
            let size_bytes = tokio::fs::metadata(&dmg_path)
                .await
                .map(|m| m.len())
                .unwrap_or(0);
            let sha256 = calculate_sha256(&dmg_path).await.ok();
            Some(DiskImageInfo {
                path: dmg_path,
                size_bytes,
                sha256,
            })
        } else {
            None
        };

        entries.push(ArchInspection {
            arch,
            bundle_path,
            status,
            disk_image,
        });
    }

    InspectionReport { entries }
}

/// Inspect one bundle path.
pub async fn inspect_bundle(app_name: &str, bundle_path: &Path) -> BundleStatus {
    if !bundle_path.is_dir() {
        return BundleStatus::Absent;
    }

    let bundle = bundle_path.to_path_buf();
    let app_name = app_name.to_string();

    let inspected = tokio::task::spawn_blocking(move || {
        let executable = main_executable(&bundle, &app_name);
        let format = describe_binary(&executable);
        let size_bytes = tree_size(&bundle);
        BundleStatus::Present {
            executable,
            format,
            size_bytes,
        }
    })
    .await;

    match inspected {
        Ok(status) => status,
        Err(e) => {
            log::warn!("Inspection of {} panicked: {}", bundle_path.display(), e);
            BundleStatus::Present {
                executable: bundle_path.to_path_buf(),
                format: "unreadable".into(),
                size_bytes: 0,
            }
        }
    }
}

/// Main executable named by `CFBundleExecutable`, or `Contents/MacOS/<app>`.
pub fn main_executable(bundle: &Path, app_name: &str) -> PathBuf {
    let macos_dir = bundle.join("Contents").join("MacOS");
    let plist_path = bundle.join("Contents").join("Info.plist");

    let from_plist = plist::Value::from_file(&plist_path)
        .ok()
        .and_then(|v| {
            v.as_dictionary()
                .and_then(|d| d.get("CFBundleExecutable"))
                .and_then(|e| e.as_string())
                .map(str::to_string)
        });

    match from_plist {
        Some(name) => macos_dir.join(name),
        None => macos_dir.join(app_name),
    }
}

fn cpu_name(cpu: u32) -> &'static str {
    match cpu {
        cputype::CPU_TYPE_ARM64 => "arm64",
        cputype::CPU_TYPE_X86_64 => "x86_64",
        cputype::CPU_TYPE_ARM => "arm",
        cputype::CPU_TYPE_X86 => "i386",
        _ => "unknown",
    }
}

/// Binary-format identification of an executable.
pub fn describe_binary(path: &Path) -> String {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return "missing executable".to_string(),
    };

    match goblin::Object::parse(&bytes) {
        Ok(goblin::Object::Mach(Mach::Binary(macho))) => format!(
            "Mach-O {} executable {}",
            if macho.is_64 { "64-bit" } else { "32-bit" },
            cpu_name(macho.header.cputype)
        ),
        Ok(goblin::Object::Mach(Mach::Fat(multi))) => {
            let arches: Vec<&str> = multi
                .iter_arches()
                .filter_map(|a| a.ok())
                .map(|a| cpu_name(a.cputype))
                .collect();
            format!("Mach-O universal binary [{}]", arches.join(", "))
        }
        Ok(goblin::Object::Elf(_)) => "ELF executable".to_string(),
        Ok(goblin::Object::PE(_)) => "PE executable".to_string(),
        _ => "unrecognized format".to_string(),
    }
}
