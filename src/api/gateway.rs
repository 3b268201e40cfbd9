//! Session gateway for the FixBoard marketplace API.
//!
//! Every network call the application makes goes through [`Gateway`]: it
//! decides which header set a request gets, attaches the stored bearer token
//! where required, and classifies responses so callers branch on a typed
//! outcome instead of inspecting status codes themselves.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{CredentialRecord, CredentialStore, StoreError, UserIdentity};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Login endpoint, relative to the API base origin
const LOGIN_ENDPOINT: &str = "/auth/login";

/// Logout endpoint, relative to the API base origin
const LOGOUT_ENDPOINT: &str = "/auth/logout";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    data: LoginPayload,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    token: String,
    user: LoginUser,
}

#[derive(Debug, Deserialize)]
struct LoginUser {
    id: String,
    name: String,
}

/// Per-call options: an optional JSON body and extra headers.
/// Caller-supplied headers take precedence over the defaults, so a multipart
/// upload can replace the JSON content type.
#[derive(Debug, Default)]
pub struct CallOptions {
    pub headers: header::HeaderMap,
    pub body: Option<Value>,
}

impl CallOptions {
    pub fn json(body: Value) -> Self {
        Self {
            headers: header::HeaderMap::new(),
            body: Some(body),
        }
    }

    pub fn with_header(mut self, name: header::HeaderName, value: header::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Gateway for all marketplace API calls.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct Gateway {
    client: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
}

impl Gateway {
    /// Create a gateway for the given API origin, reading and clearing
    /// credentials through the injected store.
    pub fn new(
        base_url: impl Into<String>,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Mutating methods require a bearer token; reads do not.
    fn requires_auth(method: &Method) -> bool {
        matches!(method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE")
    }

    /// Read the stored bearer token. A malformed record is cleared and
    /// treated as absent, so it cannot wedge every subsequent call.
    fn stored_token(&self) -> Result<Option<String>, ApiError> {
        match self.store.load() {
            Ok(record) => Ok(record.map(|r| r.token)),
            Err(StoreError::Malformed { reason }) => {
                warn!(reason = %reason, "clearing malformed credential record");
                self.store.clear()?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Header set for a request with the given method.
    ///
    /// Mutating methods fail with `MissingCredential` when no token is
    /// stored, before any network I/O. Read methods attach the token only
    /// when one is present.
    pub fn headers_for(&self, method: &Method) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        match self.stored_token()? {
            Some(token) => {
                let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| StoreError::Malformed {
                        reason: format!("token is not a valid header value: {}", e),
                    })?;
                headers.insert(header::AUTHORIZATION, value);
            }
            None if Self::requires_auth(method) => return Err(ApiError::MissingCredential),
            None => {}
        }

        Ok(headers)
    }

    /// Perform a call against the API, classifying the outcome.
    ///
    /// Success returns the raw response for the caller to consume. A 401/403
    /// clears the stored session before `AuthRejected` is returned, so a
    /// rejected credential never survives the call. Navigation back to the
    /// login screen is the caller's concern, not the gateway's.
    pub async fn call(
        &self,
        method: Method,
        endpoint: &str,
        options: CallOptions,
    ) -> Result<Response, ApiError> {
        let mut headers = self.headers_for(&method)?;
        for (name, value) in options.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        let url = self.url_for(endpoint);
        debug!(method = %method, url = %url, "api call");

        let mut request = self.client.request(method, &url).headers(headers);
        if let Some(ref body) = options.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        self.classify(response).await
    }

    async fn classify(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(status = %status, "authentication rejected, clearing stored session");
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "failed to clear credential store after rejection");
            }
            return Err(ApiError::AuthRejected { status });
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    /// Log in with email and password. The one unauthenticated POST in the
    /// system; the resulting record is returned, not persisted here.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CredentialRecord, ApiError> {
        let url = self.url_for(LOGIN_ENDPOINT);
        debug!(url = %url, "login request");

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::InvalidCredentials);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Failed { status, body });
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::UnexpectedResponse(e.to_string()))?;

        if body.data.token.is_empty() {
            return Err(ApiError::UnexpectedResponse(
                "login response contained an empty token".to_string(),
            ));
        }

        Ok(CredentialRecord {
            token: body.data.token,
            user: UserIdentity {
                id: body.data.user.id,
                name: body.data.user.name,
            },
        })
    }

    /// Best-effort logout POST, then an unconditional local clear.
    /// A dead network must never leave the session stuck.
    pub async fn logout(&self) -> Result<(), ApiError> {
        match self.headers_for(&Method::POST) {
            Ok(headers) => {
                let url = self.url_for(LOGOUT_ENDPOINT);
                match self.client.post(&url).headers(headers).send().await {
                    Ok(response) => debug!(status = %response.status(), "logout response"),
                    Err(e) => debug!(error = %e, "logout request failed, clearing anyway"),
                }
            }
            Err(e) => debug!(error = %e, "no usable credential for logout request"),
        }

        self.store.clear()?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
