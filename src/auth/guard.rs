//! App-start auth check.
//!
//! Validates the persisted credential record structurally before protected
//! views are entered. Purely local: an expired-but-well-formed token passes
//! here and is caught on the first real API call instead.

use tracing::{debug, warn};

use super::store::{CredentialStore, StoreError, UserIdentity};

/// Outcome of the local auth check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCheck {
    Authenticated(UserIdentity),
    Anonymous,
}

/// Check the stored credential record. A malformed remnant is cleared on the
/// way out so it cannot shadow a future login.
pub fn check_auth(store: &dyn CredentialStore) -> AuthCheck {
    match store.load() {
        Ok(Some(record)) => {
            debug!(user = %record.user.name, "auth check passed");
            AuthCheck::Authenticated(record.user)
        }
        Ok(None) => {
            debug!("no stored credential");
            AuthCheck::Anonymous
        }
        Err(StoreError::Malformed { reason }) => {
            warn!(reason = %reason, "clearing malformed credential record");
            if let Err(e) = store.clear() {
                warn!(error = %e, "failed to clear malformed credential record");
            }
            AuthCheck::Anonymous
        }
        Err(e) => {
            warn!(error = %e, "credential storage unavailable");
            AuthCheck::Anonymous
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::{
        CredentialRecord, CredentialStore, FileCredentialStore, MemoryCredentialStore,
    };

    #[test]
    fn test_check_auth_absent_is_anonymous() {
        let store = MemoryCredentialStore::new();
        assert_eq!(check_auth(&store), AuthCheck::Anonymous);
    }

    #[test]
    fn test_check_auth_valid_record() {
        let store = MemoryCredentialStore::new();
        store
            .save(&CredentialRecord {
                token: "abc".to_string(),
                user: UserIdentity {
                    id: "1".to_string(),
                    name: "Admin".to_string(),
                },
            })
            .unwrap();

        match check_auth(&store) {
            AuthCheck::Authenticated(user) => assert_eq!(user.name, "Admin"),
            AuthCheck::Anonymous => panic!("expected authenticated"),
        }
    }

    #[test]
    fn test_check_auth_clears_malformed_remnant() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().to_path_buf());
        std::fs::write(dir.path().join("auth.json"), r#"{"data":{}}"#).unwrap();

        assert_eq!(check_auth(&store), AuthCheck::Anonymous);
        // The malformed remnant is gone, not just ignored
        assert!(store.load().unwrap().is_none());
    }
}
