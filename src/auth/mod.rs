//! Authentication module for managing the admin session.
//!
//! This module provides:
//! - `CredentialStore`: durable storage for the login result (token + identity)
//! - `Session`: the login/logout flow state machine
//! - `check_auth`: the app-start structural auth check
//! - `SavedLogin`: optional OS-keychain storage of the login password
//!
//! The stored record has no client-side expiry; a stale token is caught when
//! the server rejects it and the session gateway clears the record.

pub mod credentials;
pub mod guard;
pub mod session;
pub mod store;

pub use credentials::SavedLogin;
pub use guard::{check_auth, AuthCheck};
pub use session::{Session, SessionState};
pub use store::{
    CredentialRecord, CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError,
    UserIdentity,
};
