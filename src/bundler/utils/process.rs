//! External tool execution.
//!
//! Long-running tools (installers, the freezer) stream stdout into the log
//! as it arrives; short tools are captured. Either way a non-zero exit
//! becomes [`Error::ToolFailed`] carrying the tool's own diagnostics.

use crate::bundler::error::{Error, Result};
use std::ffi::OsStr;
use std::process::{Output, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Lines of stderr kept for the error message of a streamed tool.
const STDERR_TAIL_LINES: usize = 60;

/// Human-readable rendering of a command line, secrets excluded by the caller.
pub fn describe(command: &Command) -> String {
    let std = command.as_std();
    let mut parts = vec![std.get_program().to_string_lossy().into_owned()];
    parts.extend(std.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

fn program_name(command: &Command) -> String {
    command.as_std().get_program().to_string_lossy().into_owned()
}

/// Builds `arch -<arch> <program>`, pinning the child to one instruction set.
pub fn pinned(arch_tool: &str, arch: crate::bundler::Arch, program: impl AsRef<OsStr>) -> Command {
    let mut command = Command::new(arch_tool);
    command.arg(arch.arch_flag()).arg(program);
    command
}

/// Runs a tool to completion and captures its output.
///
/// Fails with the combined stderr/stdout when the exit status is non-zero.
pub async fn run_captured(command: &mut Command) -> Result<Output> {
    let shown = describe(command);
    run_captured_as(command, &shown).await
}

/// Like [`run_captured`], logging `shown` instead of the real arguments.
///
/// For command lines that carry secrets.
pub async fn run_captured_as(command: &mut Command, shown: &str) -> Result<Output> {
    let program = program_name(command);
    log::debug!("Running: {shown}");

    let output = command
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| Error::ToolSpawn {
            program: program.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(Error::ToolFailed {
            program,
            status: output.status.to_string(),
            diagnostics: combined_output(&output),
        });
    }

    Ok(output)
}

/// Runs a tool, forwarding stdout and stderr lines to the log as they arrive.
///
/// pip and PyInstaller report progress on stderr. It is also captured, and
/// its tail is returned in the error on failure.
pub async fn run_streamed(command: &mut Command, label: &str) -> Result<()> {
    let program = program_name(command);
    log::info!("{label}: {}", describe(command));

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| Error::ToolSpawn {
            program: program.clone(),
            source,
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // Drain both pipes together so neither can fill up and block the child.
    let (_, stderr_lines) = tokio::join!(
        async move {
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    log::info!("  [{label}] {line}");
                }
            }
        },
        async move {
            let mut captured = Vec::new();
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    log::info!("  [{label}] {line}");
                    captured.push(line);
                }
            }
            captured
        }
    );

    let status = child.wait().await.map_err(|source| Error::ToolSpawn {
        program: program.clone(),
        source,
    })?;

    if !status.success() {
        let skip = stderr_lines.len().saturating_sub(STDERR_TAIL_LINES);
        return Err(Error::ToolFailed {
            program,
            status: status.to_string(),
            diagnostics: stderr_lines[skip..].join("\n"),
        });
    }

    Ok(())
}

/// stderr followed by stdout, trimmed.
pub fn combined_output(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    match (stderr.trim(), stdout.trim()) {
        ("", out) => out.to_string(),
        (err, "") => err.to_string(),
        (err, out) => format!("{err}\n{out}"),
    }
}
