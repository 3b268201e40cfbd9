//! Login flow state machine.
//!
//! `Anonymous -> Authenticating -> Authenticated`, with an error edge back to
//! `Anonymous` on invalid credentials and a forced edge to `Anonymous` on
//! logout or a server-side auth rejection. The credential record is persisted
//! only on the success edge; no partial state survives a failed login.

use tracing::info;

use crate::api::{ApiError, Gateway};

use super::guard::{check_auth, AuthCheck};
use super::store::UserIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated,
}

pub struct Session {
    gateway: Gateway,
    state: SessionState,
}

impl Session {
    /// Wrap a gateway, picking up any session persisted by a previous run.
    pub fn new(gateway: Gateway) -> Self {
        let state = match check_auth(gateway.store().as_ref()) {
            AuthCheck::Authenticated(_) => SessionState::Authenticated,
            AuthCheck::Anonymous => SessionState::Anonymous,
        };
        Self { gateway, state }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Submit email/password to the login endpoint. On success the credential
    /// record is persisted and the session becomes `Authenticated`; every
    /// error edge lands back on `Anonymous`.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserIdentity, ApiError> {
        self.state = SessionState::Authenticating;

        let record = match self.gateway.authenticate(email, password).await {
            Ok(record) => record,
            Err(e) => {
                self.state = SessionState::Anonymous;
                return Err(e);
            }
        };

        if let Err(e) = self.gateway.store().save(&record) {
            self.state = SessionState::Anonymous;
            return Err(e.into());
        }

        info!(user = %record.user.name, "logged in");
        self.state = SessionState::Authenticated;
        Ok(record.user)
    }

    /// End the session. The server logout is best-effort; the local record is
    /// cleared and the state returns to `Anonymous` regardless.
    pub async fn logout(&mut self) -> Result<(), ApiError> {
        let result = self.gateway.logout().await;
        self.state = SessionState::Anonymous;
        if result.is_ok() {
            info!("logged out");
        }
        result
    }

    /// Identity from the stored record, if a structurally valid one exists.
    pub fn identity(&self) -> Option<UserIdentity> {
        match check_auth(self.gateway.store().as_ref()) {
            AuthCheck::Authenticated(user) => Some(user),
            AuthCheck::Anonymous => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::store::{CredentialRecord, CredentialStore, MemoryCredentialStore};
    use httpmock::{Method as MockMethod, MockServer};

    fn session_for(server: &MockServer) -> (Session, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::new());
        let gateway = Gateway::new(server.base_url(), store.clone()).unwrap();
        (Session::new(gateway), store)
    }

    #[tokio::test]
    async fn test_login_success_persists_record() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(MockMethod::POST)
                    .path("/auth/login")
                    .json_body(serde_json::json!({
                        "email": "admin@x.com",
                        "password": "right"
                    }));
                then.status(200).body(
                    r#"{"data":{"token":"abc","user":{"id":"1","name":"Admin"}}}"#,
                );
            })
            .await;

        let (mut session, store) = session_for(&server);
        assert_eq!(session.state(), SessionState::Anonymous);

        let user = session.login("admin@x.com", "right").await.unwrap();
        assert_eq!(user.id, "1");
        assert_eq!(user.name, "Admin");
        assert_eq!(session.state(), SessionState::Authenticated);

        let record = store.load().unwrap().expect("record persisted");
        assert_eq!(record.token, "abc");
    }

    #[tokio::test]
    async fn test_login_wrong_password_leaves_store_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(MockMethod::POST).path("/auth/login");
                then.status(401);
            })
            .await;

        let (mut session, store) = session_for(&server);
        let result = session.login("admin@x.com", "wrong").await;

        assert!(matches!(result, Err(ApiError::InvalidCredentials)));
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_malformed_body_persists_nothing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(MockMethod::POST).path("/auth/login");
                then.status(200).body(r#"{"data":{"user":{"id":"1","name":"Admin"}}}"#);
            })
            .await;

        let (mut session, store) = session_for(&server);
        let result = session.login("admin@x.com", "right").await;

        assert!(matches!(result, Err(ApiError::UnexpectedResponse(_))));
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_network_is_down() {
        // No server listening at this origin, so the logout POST fails
        let store = Arc::new(MemoryCredentialStore::new());
        store
            .save(&CredentialRecord {
                token: "abc".to_string(),
                user: UserIdentity {
                    id: "1".to_string(),
                    name: "Admin".to_string(),
                },
            })
            .unwrap();

        let gateway = Gateway::new("http://127.0.0.1:9", store.clone()).unwrap();
        let mut session = Session::new(gateway);
        assert_eq!(session.state(), SessionState::Authenticated);

        session.logout().await.unwrap();
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_resumes_from_persisted_record() {
        let store = Arc::new(MemoryCredentialStore::new());
        store
            .save(&CredentialRecord {
                token: "abc".to_string(),
                user: UserIdentity {
                    id: "1".to_string(),
                    name: "Admin".to_string(),
                },
            })
            .unwrap();

        let gateway = Gateway::new("http://localhost:5000/api", store).unwrap();
        let session = Session::new(gateway);

        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.identity().unwrap().name, "Admin");
    }
}
