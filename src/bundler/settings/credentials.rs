//! Process-wide release configuration and scoped notary credentials.

use std::fmt;
use zeroize::Zeroizing;

/// Environment variable holding the code-signing identity.
pub const SIGNING_IDENTITY_VAR: &str = "CODESIGN_IDENTITY";

/// Code-signing identity, e.g. `Developer ID Application: Name (TEAMID)`.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningIdentity(String);

impl SigningIdentity {
    /// Returns `None` for blank values.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningIdentity").field(&self.0).finish()
    }
}

/// Immutable configuration resolved once at process start.
///
/// Only the signer reads the identity; nothing mutates it after
/// construction.
#[derive(Clone, Debug, Default)]
pub struct ReleaseConfig {
    signing_identity: Option<SigningIdentity>,
}

impl ReleaseConfig {
    pub fn new(signing_identity: Option<SigningIdentity>) -> Self {
        Self { signing_identity }
    }

    /// Reads [`SIGNING_IDENTITY_VAR`] from the process environment.
    ///
    /// Call after `.env` has been loaded.
    pub fn from_env() -> Self {
        let signing_identity = std::env::var(SIGNING_IDENTITY_VAR)
            .ok()
            .and_then(SigningIdentity::new);
        Self { signing_identity }
    }

    pub fn signing_identity(&self) -> Option<&SigningIdentity> {
        self.signing_identity.as_ref()
    }

    /// The identity, or a precondition error naming the variable.
    pub fn require_signing_identity(&self) -> crate::bundler::Result<&SigningIdentity> {
        self.signing_identity.as_ref().ok_or_else(|| {
            crate::bundler::Error::Precondition(format!(
                "{SIGNING_IDENTITY_VAR} is not set; signing requires a code-signing identity"
            ))
        })
    }
}

/// Notary service credentials, held only for one `notarize` invocation.
///
/// The password is zeroed when the value is dropped, on success, error and
/// unwinding alike.
pub struct NotaryCredentials {
    apple_id: String,
    team_id: String,
    password: Zeroizing<String>,
}

impl NotaryCredentials {
    pub fn new(apple_id: impl Into<String>, team_id: impl Into<String>, password: String) -> Self {
        Self {
            apple_id: apple_id.into(),
            team_id: team_id.into(),
            password: Zeroizing::new(password),
        }
    }

    pub fn apple_id(&self) -> &str {
        &self.apple_id
    }

    pub fn team_id(&self) -> &str {
        &self.team_id
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for NotaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotaryCredentials")
            .field("apple_id", &self.apple_id)
            .field("team_id", &self.team_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn blank_identity_is_absent() {
        assert!(SigningIdentity::new("   ").is_none());
        assert_eq!(
            SigningIdentity::new(" Developer ID Application: X (T) ").map(|i| i.0),
            Some("Developer ID Application: X (T)".to_string())
        );
    }

    #[test]
    #[serial]
    fn from_env_reads_identity() {
        // SAFETY: serialized with every other test touching the environment.
        unsafe { std::env::set_var(SIGNING_IDENTITY_VAR, "Developer ID Application: Test") };
        let config = ReleaseConfig::from_env();
        unsafe { std::env::remove_var(SIGNING_IDENTITY_VAR) };

        assert_eq!(
            config.signing_identity().map(SigningIdentity::as_str),
            Some("Developer ID Application: Test")
        );
        assert!(ReleaseConfig::from_env().require_signing_identity().is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let creds = NotaryCredentials::new("dev@example.com", "TEAM123", "hunter2".into());
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("TEAM123"));
    }
}
