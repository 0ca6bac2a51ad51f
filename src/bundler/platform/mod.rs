//! External collaborators driven by the pipeline.
//!
//! - `python` - Environment provisioning
//! - `freezer` - PyInstaller invocation
//! - `macos` - Signing, disk images, notarization and inspection

pub mod freezer;
pub mod macos;
pub mod python;
