//! Common test utilities for release pipeline integration tests

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A workspace holding a release.toml, VERSION, requirements and sources
#[allow(dead_code)]
pub struct TestWorkspace {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

/// Which stand-in tool behaviours to install.
#[allow(dead_code)]
#[derive(Clone, Copy, Default)]
pub struct FakeTools {
    /// The Intel freeze exits non-zero.
    pub fail_intel_freeze: bool,
    /// The notary service rejects the Intel image.
    pub reject_intel_notarization: bool,
}

impl TestWorkspace {
    /// Create an empty workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp directory");
        Self { temp, path }
    }

    /// Workspace with the program sources, VERSION and requirements, and a
    /// release.toml using the system tool names.
    #[allow(dead_code)]
    pub fn with_project() -> Self {
        let workspace = Self::new();
        workspace.write_project_files();
        workspace.write_manifest("");
        workspace
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from workspace
    #[allow(dead_code)]
    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    /// Check if a file exists in workspace
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    pub fn write_project_files(&self) {
        self.write_file("VERSION", "1.4.2\n");
        self.write_file("requirements.txt", "streamlit==1.38.0\n");
        self.write_file("run_app.py", "import main\n");
        self.write_file("main.py", "print('hello')\n");
    }

    /// release.toml with `extra` appended verbatim.
    pub fn write_manifest(&self, extra: &str) {
        let manifest = format!(
            r#"[app]
name = "PsydeKick"
entry_point = "run_app.py"
bundle_identifier = "com.psydekick.app"
hidden_imports = ["streamlit"]
resources = [{{ source = "main.py", destination = "." }}]

{extra}
"#
        );
        self.write_file("release.toml", &manifest);
    }

    /// Install shell-script stand-ins for every external tool and point the
    /// manifest at them. Tool calls are appended to `calls.txt`.
    #[cfg(unix)]
    #[allow(dead_code)]
    pub fn install_fake_tools(&self, behaviour: FakeTools) {
        let bin = self.path.join("fake-bin");
        let calls = self.path.join("calls.txt");
        let calls = calls.display();

        let freeze_ok = r#"mkdir -p "$dist/PsydeKick.app/Contents/MacOS"
    printf 'bin' > "$dist/PsydeKick.app/Contents/MacOS/PsydeKick"
    exit 0"#;
        let freeze_fail = r#"echo "ModuleNotFoundError: No module named 'streamlit'" >&2
    exit 1"#;

        for arch in ["arm64", "x86_64"] {
            let freeze = if arch == "x86_64" && behaviour.fail_intel_freeze {
                freeze_fail
            } else {
                freeze_ok
            };
            let env_python = bin.join(format!("env-python-{arch}"));
            write_script(
                &env_python,
                &format!(
                    r#"#!/bin/sh
echo "python-{arch} $*" >> "{calls}"
case "$2" in
  pip)
    echo "Successfully installed"
    exit 0
    ;;
  PyInstaller)
    dist=""
    while [ $# -gt 0 ]; do
      if [ "$1" = "--distpath" ]; then dist="$2"; fi
      shift
    done
    {freeze}
    ;;
esac
exit 2
"#
                ),
            );
            write_script(
                &bin.join(format!("python3-{arch}")),
                &format!(
                    r#"#!/bin/sh
if [ "$1" = "-m" ] && [ "$2" = "venv" ]; then
  mkdir -p "$3/bin"
  cp "{}" "$3/bin/python"
  chmod +x "$3/bin/python"
  exit 0
fi
echo "unexpected interpreter call: $*" >&2
exit 2
"#,
                    env_python.display()
                ),
            );
        }

        write_script(
            &bin.join("arch"),
            &format!(
                r#"#!/bin/sh
echo "arch $1" >> "{calls}"
shift
exec "$@"
"#
            ),
        );
        write_script(
            &bin.join("codesign"),
            &format!(
                r#"#!/bin/sh
echo "codesign $*" >> "{calls}"
exit 0
"#
            ),
        );
        write_script(
            &bin.join("open"),
            &format!(
                r#"#!/bin/sh
echo "open $*" >> "{calls}"
exit 0
"#
            ),
        );
        write_script(
            &bin.join("spctl"),
            r#"#!/bin/sh
echo "rejected (the code is valid but does not seem to be an app)" >&2
exit 3
"#,
        );
        write_script(
            &bin.join("hdiutil"),
            &format!(
                r#"#!/bin/sh
echo "hdiutil $*" >> "{calls}"
if [ "$1" = "create" ]; then
  for last; do :; done
  printf 'disk image' > "$last"
fi
exit 0
"#
            ),
        );
        let intel_status = if behaviour.reject_intel_notarization {
            "Invalid"
        } else {
            "Accepted"
        };
        write_script(
            &bin.join("xcrun"),
            &format!(
                r#"#!/bin/sh
case "$1" in
  notarytool)
    echo "notarytool $3" >> "{calls}"
    case "$3" in
      *Intel*) status="{intel_status}" ;;
      *) status="Accepted" ;;
    esac
    echo "Conducting pre-submission checks..."
    echo "{{\"id\":\"submission-$$\",\"status\":\"$status\",\"message\":\"Processing complete\"}}"
    exit 0
    ;;
  stapler)
    echo "staple $3" >> "{calls}"
    exit 0
    ;;
esac
exit 2
"#
            ),
        );

        self.write_manifest(&format!(
            r#"[architectures.arm64]
interpreter = '{bin}/python3-arm64'

[architectures.x86_64]
interpreter = '{bin}/python3-x86_64'

[tools]
arch = '{bin}/arch'
codesign = '{bin}/codesign'
spctl = '{bin}/spctl'
hdiutil = '{bin}/hdiutil'
xcrun = '{bin}/xcrun'
open = '{bin}/open'
volumes_root = '{root}/Volumes'
"#,
            bin = bin.display(),
            root = self.path.display(),
        ));
    }

    /// Lines of `calls.txt`.
    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.path.join("calls.txt"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create script directory");
    }
    std::fs::write(path, body).expect("Failed to write script");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
}

/// Command for the release binary, rooted at `workspace`.
#[allow(dead_code)]
pub fn release_cmd_for_workspace(workspace: &Path) -> assert_cmd::Command {
    #[allow(deprecated)]
    let mut cmd = assert_cmd::Command::cargo_bin("psydekick_release").unwrap();
    cmd.arg("--workspace")
        .arg(workspace)
        .env_remove("CODESIGN_IDENTITY")
        .env("RUST_LOG", "info");
    cmd
}
