use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "fixboard";

/// Optional saved login in the OS keychain, so a protected command can
/// re-authenticate without prompting after the server session expires.
pub struct SavedLogin;

impl SavedLogin {
    /// Store the admin password in the OS keychain, keyed by email
    pub fn store(email: &str, password: &str) -> Result<()> {
        let entry =
            Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Retrieve the saved password for an email from the OS keychain
    pub fn get_password(email: &str) -> Result<String> {
        let entry =
            Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Delete the saved login for an email
    pub fn delete(email: &str) -> Result<()> {
        let entry =
            Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    /// Check whether a saved login exists for an email
    pub fn exists(email: &str) -> bool {
        if let Ok(entry) = Entry::new(SERVICE_NAME, email) {
            entry.get_password().is_ok()
        } else {
            false
        }
    }
}
