//! Architecture-pinned Python environment provisioning.
//!
//! Environments are never updated in place: every request destroys the
//! previous tree and builds a fresh one from the pinned requirements, so two
//! runs can't drift apart through leftover packages.

use crate::bundler::{
    Arch, Error, Result, Settings,
    error::{Stage, StageExt},
    utils::{fs, process},
};
use std::path::PathBuf;

/// Provision the environment for `arch` and return its directory.
///
/// # Process
/// 1. Check the requirements manifest and the host interpreter exist
/// 2. Remove any previous environment
/// 3. `arch -<arch> <interpreter> -m venv <env>`
/// 4. Upgrade pip inside the environment
/// 5. Install the pinned requirements
///
/// Any failure is fatal for this architecture and is not retried.
pub async fn provision(settings: &Settings, arch: Arch) -> Result<PathBuf> {
    provision_inner(settings, arch)
        .await
        .in_stage(Stage::Provisioning, arch)
}

async fn provision_inner(settings: &Settings, arch: Arch) -> Result<PathBuf> {
    let requirements = settings.requirements();
    if !requirements.is_file() {
        return Err(Error::Precondition(format!(
            "pinned requirements not found: {}",
            requirements.display()
        )));
    }

    let interpreter = resolve_interpreter(&settings.interpreter(arch))?;
    let env_dir = settings.env_dir(arch);
    let arch_tool = &settings.tools().arch;

    log::info!(
        "Provisioning {} environment at {} with {}",
        arch,
        env_dir.display(),
        interpreter.display()
    );

    fs::ensure_absent(&env_dir).await.into_result(&env_dir)?;

    process::run_streamed(
        process::pinned(arch_tool, arch, &interpreter)
            .args(["-m", "venv"])
            .arg(&env_dir),
        &format!("venv {arch}"),
    )
    .await?;

    let env_python = settings.env_python(arch);
    if !env_python.exists() {
        return Err(Error::GenericError(format!(
            "environment created but {} is missing",
            env_python.display()
        )));
    }

    process::run_streamed(
        process::pinned(arch_tool, arch, &env_python).args([
            "-m",
            "pip",
            "install",
            "--upgrade",
            "pip",
        ]),
        &format!("pip {arch}"),
    )
    .await?;

    process::run_streamed(
        process::pinned(arch_tool, arch, &env_python)
            .args(["-m", "pip", "install", "-r"])
            .arg(requirements),
        &format!("pip {arch}"),
    )
    .await?;

    log::info!("✓ {} environment ready", arch);
    Ok(env_dir)
}

/// Locates the interpreter, accepting a bare name on `PATH` or a path.
fn resolve_interpreter(interpreter: &str) -> Result<PathBuf> {
    which::which(interpreter).map_err(|e| {
        Error::Precondition(format!(
            "interpreter `{interpreter}` is not available: {e}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{ErrorKind, SettingsBuilder, test_spec};

    #[tokio::test]
    async fn missing_requirements_fails_before_touching_environment() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsBuilder::new()
            .workspace(dir.path())
            .spec(test_spec("PsydeKick"))
            .build()
            .unwrap();

        std::fs::create_dir_all(settings.env_dir(Arch::Arm64)).unwrap();
        std::fs::write(settings.env_dir(Arch::Arm64).join("marker"), b"old").unwrap();

        let err = provision(&settings, Arch::Arm64).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Provisioning);
        assert!(err.to_string().contains("requirements"));
        assert!(settings.env_dir(Arch::Arm64).join("marker").exists());
    }

    #[test]
    fn unknown_interpreter_is_reported() {
        let err = resolve_interpreter("/nonexistent/python3-4f1c").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/python3-4f1c"));
    }
}
