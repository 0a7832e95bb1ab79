use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{STREAM_ERRORS, STREAM_EVENTS, STREAM_TOKENS};
use crate::session::SessionGuard;
use crate::sse::process_sse;
use crate::storage::{CredentialStore, Navigator};
use crate::types::{AskParams, ChatMessage, ChatRoom, ChatStreamEvent, UserProfile, UserUpdate};

/// Client for the Polaris API.
///
/// All requests flow through the [`SessionGuard`], which attaches the
/// bearer token, refreshes it when needed, and tears the session down on
/// terminal auth failures.
#[derive(Debug, Clone)]
pub struct Polaris {
    session: SessionGuard,
}

impl Polaris {
    /// Create a new Polaris client.
    ///
    /// The base URL can be provided directly or read from the
    /// POLARIS_BASE_URL environment variable.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Ok(Self {
            session: SessionGuard::new(base_url)?,
        })
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        base_url: Option<String>,
        auth_timeout: Option<Duration>,
        request_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut session = SessionGuard::new(base_url)?;
        if let Some(timeout) = auth_timeout {
            session = session.with_auth_timeout(timeout);
        }
        if let Some(timeout) = request_timeout {
            session = session.with_request_timeout(timeout);
        }
        Ok(Self { session })
    }

    /// Replace the credential store.
    pub fn with_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.session = self.session.with_store(store);
        self
    }

    /// Replace the navigator invoked on session teardown.
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.session = self.session.with_navigator(navigator);
        self
    }

    /// Attach a logger for request outcomes and stream events.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.session = self.session.with_logger(logger);
        self
    }

    /// The session guard behind this client, for login, logout,
    /// verification, and direct credential access.
    pub fn session(&self) -> &SessionGuard {
        &self.session
    }

    /// Fetch the signed-in user's profile and cache its display fields.
    pub async fn me(&self) -> Result<UserProfile> {
        let profile: UserProfile = self.fetch_json(Method::GET, "users/me", None).await?;
        self.session.cache_profile(&profile);
        Ok(profile)
    }

    /// Update the signed-in user's profile; unset fields are untouched.
    pub async fn update_me(&self, update: &UserUpdate) -> Result<UserProfile> {
        let body = serde_json::to_value(update)?;
        let profile: UserProfile = self
            .fetch_json(Method::PATCH, "users/me", Some(body))
            .await?;
        self.session.cache_profile(&profile);
        Ok(profile)
    }

    /// List the user's chat rooms, newest first, without their histories.
    pub async fn rooms(&self) -> Result<Vec<ChatRoom>> {
        self.fetch_json(Method::GET, "chat/rooms", None).await
    }

    /// Create a chat room.
    pub async fn create_room(&self, title: &str) -> Result<ChatRoom> {
        let body = serde_json::json!({ "title": title });
        self.fetch_json(Method::POST, "chat/rooms", Some(body)).await
    }

    /// Fetch one room with its full message history, oldest first.
    pub async fn room_history(&self, room_id: i64) -> Result<ChatRoom> {
        self.fetch_json(Method::GET, &format!("chat/rooms/{}", room_id), None)
            .await
    }

    /// Append a message to a room without asking for an answer.
    pub async fn create_message(&self, params: &AskParams) -> Result<ChatMessage> {
        let body = serde_json::to_value(params)?;
        self.fetch_json(Method::POST, "chat/messages", Some(body))
            .await
    }

    /// Set or clear the bookmark on a message.
    pub async fn set_bookmark(&self, message_id: i64, bookmark: bool) -> Result<ChatMessage> {
        let path = format!("chat/messages/{}/bookmark?bookmark={}", message_id, bookmark);
        self.fetch_json(Method::PATCH, &path, None).await
    }

    /// Ask a question and stream the answer.
    ///
    /// Returns the turn's event stream: step notifications, token
    /// fragments, and a terminal done or error event. The request is
    /// authorized like any other, including the refresh-and-replay dance,
    /// before the first event arrives.
    pub async fn ask_stream(
        &self,
        params: &AskParams,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<ChatStreamEvent>> + Send>>> {
        if params.message.trim().is_empty() {
            return Err(Error::validation(
                "message must not be empty",
                Some("message".to_string()),
            ));
        }
        let path = format!("chat/rooms/{}/ask/stream", params.room_id);
        let body = serde_json::to_value(params)?;
        let response = self.session.authorized_stream(&path, &body).await?;

        let logger = self.session.logger().cloned();
        let stream = process_sse(response.bytes_stream()).map(move |event| {
            match &event {
                Ok(event) => {
                    STREAM_EVENTS.click();
                    if matches!(event, ChatStreamEvent::Token(_)) {
                        STREAM_TOKENS.click();
                    }
                    if let Some(logger) = &logger {
                        logger.log_stream_event(event);
                    }
                }
                Err(_) => {
                    STREAM_ERRORS.click();
                }
            }
            event
        });
        Ok(Box::pin(stream))
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let response = self
            .session
            .authorized_fetch(method, path, body.as_ref())
            .await?;
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_construction_with_explicit_base_url() {
        let client = Polaris::new(Some("http://localhost:8000/api".to_string())).unwrap();
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn ask_stream_rejects_empty_messages() {
        let client = Polaris::new(Some("http://localhost:9/api".to_string())).unwrap();
        let params = AskParams::new(1, "   ");
        let err = client.ask_stream(&params).await.err().unwrap();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
