//! PsydeKick release pipeline.
//!
//! Builds, signs, packages and notarizes the Apple Silicon and Intel macOS
//! bundles. Exit code 0 only when every step of the requested target
//! succeeded.

use psydekick_bundler_release::cli;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            for suggestion in e.recovery_suggestions() {
                eprintln!("  → {suggestion}");
            }
            1
        }
    };

    process::exit(exit_code);
}
