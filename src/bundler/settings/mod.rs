//! Configuration structures for pipeline operations.
//!
//! The build specification, workspace layout, external tool names and the
//! process-wide signing configuration.

mod arch;
mod builder;
mod core;
mod credentials;
mod macos;
mod spec;

pub use arch::Arch;
pub use builder::SettingsBuilder;
pub use self::core::Settings;
pub use credentials::{NotaryCredentials, ReleaseConfig, SIGNING_IDENTITY_VAR, SigningIdentity};
pub use macos::{ArchitectureSettings, DmgSettings, SigningSettings, ToolSettings};
pub use spec::{BuildSpecification, ResourceMapping};

#[cfg(test)]
pub(crate) use self::core::tests::spec as test_spec;
