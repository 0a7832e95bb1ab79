//! Token lifecycle and authorized request plumbing.
//!
//! [`SessionGuard`] owns the stored credential pair and is the only writer
//! to the credential store. Every authorized request flows through it: it
//! refuses to send locally-expired tokens, refreshes at most once per
//! failure, replays exactly once on a recoverable auth error, and tears
//! the session down (clear plus a single login redirect) on terminal auth
//! errors.

use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, Response};
use serde_json::Value;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_AUTH_RETRIES, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, SESSION_REFRESH_FAILURES,
    SESSION_REFRESHES, SESSION_REFRESHES_COALESCED, SESSION_TEARDOWNS, SESSION_VERIFIES,
};
use crate::storage::{CredentialStore, MemoryStore, Navigator, RecordingNavigator, keys};
use crate::token;
use crate::types::{ErrorCode, TokenResponse, UserProfile};

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(8);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Guards the session's credential pair and performs authorized requests.
///
/// Clones share one credential store, one refresh gate, and one
/// verified-token memo, so concurrent callers coordinate instead of racing
/// each other to the refresh endpoint.
#[derive(Clone)]
pub struct SessionGuard {
    client: ReqwestClient,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    logger: Option<Arc<dyn ClientLogger>>,
    refresh_gate: Arc<tokio::sync::Mutex<()>>,
    verified: Arc<Mutex<Option<String>>>,
    auth_timeout: Duration,
    request_timeout: Duration,
}

impl SessionGuard {
    /// Create a new session guard.
    ///
    /// The base URL can be provided directly or read from the
    /// POLARIS_BASE_URL environment variable, falling back to a localhost
    /// default.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var("POLARIS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };
        url::Url::parse(&base_url)?;

        let client = ReqwestClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store: Arc::new(MemoryStore::new()),
            navigator: Arc::new(RecordingNavigator::new()),
            logger: None,
            refresh_gate: Arc::new(tokio::sync::Mutex::new(())),
            verified: Arc::new(Mutex::new(None)),
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Replace the credential store.
    pub fn with_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = store;
        self
    }

    /// Replace the navigator invoked on session teardown.
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Attach a logger for request outcomes and teardowns.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Bound verify and refresh calls. Defaults to 8 seconds.
    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    /// Bound other JSON requests. Defaults to 30 seconds.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The credential store backing this session.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// The logger attached to this session, if any.
    pub(crate) fn logger(&self) -> Option<&Arc<dyn ClientLogger>> {
        self.logger.as_ref()
    }

    /// The currently stored access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.store.get(keys::ACCESS_TOKEN)
    }

    /// True if the store holds anything this guard could authorize with,
    /// even an access token that would need a refresh first.
    pub fn is_authenticated(&self) -> bool {
        self.store.get(keys::ACCESS_TOKEN).is_some()
            || self.store.get(keys::REFRESH_TOKEN).is_some()
    }

    /// Store a credential pair obtained outside the login endpoint, such
    /// as tokens handed to a CLI through its environment.
    pub fn adopt_tokens(&self, access_token: &str, refresh_token: Option<&str>) {
        self.store.set(keys::ACCESS_TOKEN, access_token);
        if let Some(refresh_token) = refresh_token {
            self.store.set(keys::REFRESH_TOKEN, refresh_token);
        }
        *self.verified.lock().unwrap() = None;
    }

    /// Exchange a Google auth code for a credential pair and persist it.
    ///
    /// The OAuth redirect dance happens outside this client; only the code
    /// exchange crosses the wire here.
    pub async fn login_with_code(&self, code: &str) -> Result<TokenResponse> {
        let body = serde_json::json!({ "code": code });
        let response = self
            .execute(
                Method::POST,
                "auth/google/callback",
                None,
                Some(&body),
                self.auth_timeout,
                false,
            )
            .await?;
        if !response.status().is_success() {
            return Err(self.process_error_response(response).await);
        }
        let tokens: TokenResponse = response.json().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse token response: {}", e),
                Some(Box::new(e)),
            )
        })?;
        self.persist_tokens(&tokens);
        Ok(tokens)
    }

    /// Tell the server goodbye, then clear local identity regardless of
    /// what it answered.
    pub async fn logout(&self) -> Result<()> {
        let bearer = self.store.get(keys::ACCESS_TOKEN);
        let result = self
            .execute(
                Method::POST,
                "auth/logout",
                bearer.as_deref(),
                None,
                self.auth_timeout,
                false,
            )
            .await;
        self.clear_identity();
        // Best effort: a dead server must not trap the user in a session.
        drop(result);
        Ok(())
    }

    /// Ensure the stored access token is good for at least one request.
    ///
    /// With no stored token the session is over: identity is cleared and
    /// the call fails. A locally-valid token is optimistically verified
    /// against the server; any verification failure falls through to one
    /// unconditional refresh. If that refresh cannot produce a token the
    /// identity is cleared and the call fails.
    ///
    /// A token that just passed verification is memoized, so an
    /// immediately repeated call makes no second network request.
    pub async fn verify_and_refresh(&self) -> Result<()> {
        let Some(access) = self.store.get(keys::ACCESS_TOKEN) else {
            self.clear_identity();
            return Err(Error::session_expired("no access token in storage"));
        };

        if !token::is_expired(&access) {
            if self.verified.lock().unwrap().as_deref() == Some(access.as_str()) {
                return Ok(());
            }
            SESSION_VERIFIES.click();
            if let Ok(response) = self
                .execute(
                    Method::GET,
                    "auth/verify",
                    Some(&access),
                    None,
                    self.auth_timeout,
                    false,
                )
                .await
                && response.status().is_success()
            {
                *self.verified.lock().unwrap() = Some(access);
                return Ok(());
            }
        }

        match self.refresh().await {
            Ok(_) => Ok(()),
            Err(err) if err.is_session_expired() => Err(err),
            Err(err) => {
                self.clear_identity();
                Err(Error::session_expired(format!(
                    "session could not be refreshed: {}",
                    err
                )))
            }
        }
    }

    /// Trade the stored refresh token for a fresh access token.
    ///
    /// Concurrent callers serialize on the refresh gate; a caller that
    /// waited while another rotated the credential adopts the rotated
    /// token instead of issuing its own network call. Terminal rejections
    /// tear the session down.
    pub async fn refresh(&self) -> Result<String> {
        let before = self.store.get(keys::ACCESS_TOKEN);
        let _gate = self.refresh_gate.lock().await;
        if let Some(current) = self.store.get(keys::ACCESS_TOKEN)
            && before.as_deref() != Some(current.as_str())
            && !token::is_expired(&current)
        {
            SESSION_REFRESHES_COALESCED.click();
            return Ok(current);
        }
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<String> {
        let Some(refresh_token) = self.store.get(keys::REFRESH_TOKEN) else {
            return Err(Error::no_credential("no refresh token in storage"));
        };
        SESSION_REFRESHES.click();
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let response = match self
            .execute(
                Method::POST,
                "auth/refresh",
                None,
                Some(&body),
                self.auth_timeout,
                false,
            )
            .await
        {
            Ok(response) => response,
            Err(err) => {
                SESSION_REFRESH_FAILURES.click();
                return Err(err);
            }
        };

        if !response.status().is_success() {
            SESSION_REFRESH_FAILURES.click();
            let err = self.process_error_response(response).await;
            if err.is_terminal_auth() {
                self.tear_down("refresh token rejected");
                return Err(Error::session_expired(format!(
                    "refresh token rejected: {}",
                    err
                )));
            }
            return Err(err);
        }

        let tokens: TokenResponse = response.json().await.map_err(|e| {
            SESSION_REFRESH_FAILURES.click();
            Error::serialization(
                format!("Failed to parse token response: {}", e),
                Some(Box::new(e)),
            )
        })?;
        self.persist_tokens(&tokens);
        Ok(tokens.access_token)
    }

    /// Perform an authorized JSON request against a path relative to the
    /// base URL.
    ///
    /// The current bearer is attached when present; a locally-expired one
    /// is refreshed before it ever leaves the process. One recoverable
    /// auth rejection triggers exactly one refresh and one replay.
    pub async fn authorized_fetch(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response> {
        self.request_with_auth(method, path, body, false).await
    }

    /// Like [`authorized_fetch`], but accepts a server-sent event stream
    /// in the response.
    ///
    /// [`authorized_fetch`]: SessionGuard::authorized_fetch
    pub async fn authorized_stream(&self, path: &str, body: &Value) -> Result<Response> {
        self.request_with_auth(Method::POST, path, Some(body), true)
            .await
    }

    async fn request_with_auth(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        sse: bool,
    ) -> Result<Response> {
        let mut bearer = self.store.get(keys::ACCESS_TOKEN);
        if let Some(current) = &bearer
            && token::is_expired(current)
        {
            bearer = Some(self.refresh_or_tear_down().await?);
        }

        let response = self
            .execute(
                method.clone(),
                path,
                bearer.as_deref(),
                body,
                self.request_timeout,
                sse,
            )
            .await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let err = self.process_error_response(response).await;
        if err.is_recoverable_auth() {
            CLIENT_AUTH_RETRIES.click();
            let fresh = self.refresh_or_tear_down().await?;
            let retry = self
                .execute(method, path, Some(&fresh), body, self.request_timeout, sse)
                .await?;
            if retry.status().is_success() {
                return Ok(retry);
            }
            let retry_err = self.process_error_response(retry).await;
            if retry_err.is_terminal_auth() {
                self.tear_down("authorization failed after refresh");
                return Err(Error::session_expired(format!(
                    "request failed after refresh: {}",
                    retry_err
                )));
            }
            return Err(retry_err);
        }
        if err.is_terminal_auth() {
            self.tear_down("terminal auth failure");
            return Err(Error::session_expired(format!("{}", err)));
        }
        Err(err)
    }

    async fn refresh_or_tear_down(&self) -> Result<String> {
        match self.refresh().await {
            Ok(access) => Ok(access),
            Err(err) if err.is_session_expired() => Err(err),
            Err(err) => {
                self.tear_down("token refresh failed");
                Err(Error::session_expired(format!(
                    "token refresh failed: {}",
                    err
                )))
            }
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        bearer: Option<&str>,
        body: Option<&Value>,
        timeout: Duration,
        sse: bool,
    ) -> Result<Response> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(bearer) = bearer {
            request = request.bearer_auth(bearer);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if sse {
            request = request.header(reqwest::header::ACCEPT, "text/event-stream");
        }

        CLIENT_REQUESTS.click();
        let response = match tokio::time::timeout(timeout, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                CLIENT_REQUEST_ERRORS.click();
                return Err(if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                });
            }
            Err(_) => {
                CLIENT_REQUEST_ERRORS.click();
                return Err(Error::timeout(
                    format!("Request to {} timed out", path),
                    Some(timeout.as_secs_f64()),
                ));
            }
        };

        if let Some(logger) = &self.logger {
            logger.log_request(method.as_str(), path, response.status().as_u16());
        }
        Ok(response)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(&self, response: Response) -> Error {
        let status_code = response.status().as_u16();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let (error_code, message) = match serde_json::from_str::<Value>(&error_body) {
            Ok(value) => {
                let error_code = value
                    .get("error_code")
                    .and_then(|v| v.as_str())
                    .map(|s| s.parse().unwrap_or(ErrorCode::Unknown))
                    .unwrap_or(ErrorCode::Unknown);
                let message = value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(String::from)
                    .or_else(|| {
                        // FastAPI validation failures come back as {"detail": ...}
                        value.get("detail").map(|detail| match detail.as_str() {
                            Some(s) => s.to_string(),
                            None => detail.to_string(),
                        })
                    })
                    .unwrap_or_else(|| error_body.clone());
                (error_code, message)
            }
            Err(_) => {
                let message = if error_body.is_empty() {
                    "Unknown error".to_string()
                } else {
                    error_body.clone()
                };
                (ErrorCode::Unknown, message)
            }
        };

        CLIENT_REQUEST_ERRORS.click();
        Error::api(status_code, error_code, message)
    }

    fn persist_tokens(&self, tokens: &TokenResponse) {
        self.store.set(keys::ACCESS_TOKEN, &tokens.access_token);
        if let Some(refresh_token) = &tokens.refresh_token {
            self.store.set(keys::REFRESH_TOKEN, refresh_token);
        }
        *self.verified.lock().unwrap() = Some(tokens.access_token.clone());
    }

    /// Cache the profile display fields the header renders from.
    pub(crate) fn cache_profile(&self, profile: &UserProfile) {
        self.store.set(keys::USER_NAME, profile.display_name());
        match &profile.profile_picture {
            Some(picture) => self.store.set(keys::PROFILE_PICTURE, picture),
            None => self.store.remove(keys::PROFILE_PICTURE),
        }
    }

    fn clear_identity(&self) {
        for key in keys::IDENTITY {
            self.store.remove(key);
        }
        *self.verified.lock().unwrap() = None;
    }

    fn tear_down(&self, reason: &str) {
        self.clear_identity();
        SESSION_TEARDOWNS.click();
        if let Some(logger) = &self.logger {
            logger.log_teardown(reason);
        }
        self.navigator.redirect_to_login();
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("base_url", &self.base_url)
            .field("auth_timeout", &self.auth_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}
