//! Styled terminal output for the release CLI.
//!
//! Library code logs through `log`; this is only for the headers and the
//! summary a person reads at the end of a run.

use console::{Style, Term};
use std::io;

/// Writes styled messages to stdout, warnings and errors to stderr.
#[derive(Debug, Clone)]
pub struct OutputManager {
    quiet: bool,
    stdout: Term,
    stderr: Term,
}

impl OutputManager {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            stdout: Term::stdout(),
            stderr: Term::stderr(),
        }
    }

    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout.write_line(&format!(
            "{} {}",
            Style::new().cyan().bold().apply_to("▶"),
            message
        ))
    }

    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout.write_line(&format!(
            "{} {}",
            Style::new().green().bold().apply_to("✓"),
            message
        ))
    }

    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stderr.write_line(&format!(
            "{} {}",
            Style::new().yellow().bold().apply_to("⚠"),
            message
        ))
    }

    /// Always printed, even in quiet mode.
    pub fn error(&self, message: &str) -> io::Result<()> {
        self.stderr.write_line(&format!(
            "{} {}",
            Style::new().red().bold().apply_to("✗"),
            message
        ))
    }

    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout.write_line("")?;
        self.stdout
            .write_line(&Style::new().bold().underlined().apply_to(title).to_string())
    }

    pub fn indent(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        for line in message.lines() {
            self.stdout.write_line(&format!("  {line}"))?;
        }
        Ok(())
    }

    /// Plain text, no styling, respects quiet mode.
    pub fn plain(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout.write_line(message)
    }
}
