//! Interactive notary credential capture.

use crate::bundler::NotaryCredentials;
use crate::error::{CliError, Result};
use inquire::{Password, PasswordDisplayMode, Text};
use zeroize::Zeroizing;

/// Ask for whatever was not given on the command line.
///
/// The identifiers are checked before the password is asked for. The
/// password is never echoed and is zeroed on drop from the moment the prompt
/// returns it.
pub fn prompt_credentials(
    apple_id: Option<String>,
    team_id: Option<String>,
) -> Result<NotaryCredentials> {
    let apple_id = match apple_id {
        Some(id) => id,
        None => Text::new("Apple ID:").prompt()?,
    };
    let apple_id = required("Apple ID", &apple_id)?;

    let team_id = match team_id {
        Some(id) => id,
        None => Text::new("Team ID:")
            .with_help_message("10-character developer team identifier")
            .prompt()?,
    };
    let team_id = required("team ID", &team_id)?;

    let password = Zeroizing::new(
        Password::new("App-specific password:")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Hidden)
            .prompt()?,
    );

    credentials(apple_id, team_id, password)
}

fn required<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CliError::InvalidArguments {
            reason: format!("{what} must not be empty"),
        }
        .into());
    }
    Ok(value)
}

/// Moves the password buffer into the credentials without copying it.
fn credentials(
    apple_id: &str,
    team_id: &str,
    mut password: Zeroizing<String>,
) -> Result<NotaryCredentials> {
    if password.is_empty() {
        return Err(CliError::InvalidArguments {
            reason: "app-specific password must not be empty".into(),
        }
        .into());
    }
    Ok(NotaryCredentials::new(
        apple_id,
        team_id,
        std::mem::take(&mut *password),
    ))
}
