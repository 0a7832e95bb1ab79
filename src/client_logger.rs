//! Logging trait for Polaris client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all API interactions passing through the [`Polaris`] client.
//!
//! [`Polaris`]: crate::Polaris

use crate::types::{ChatMessage, ChatStreamEvent};

/// A trait for logging Polaris client operations.
///
/// Implement this trait to capture and record API interactions: request
/// outcomes, individual streaming events, and session teardowns.
///
/// # Example
///
/// ```rust,ignore
/// use polaris::{ChatMessage, ChatStreamEvent, ClientLogger};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, method: &str, path: &str, status: u16) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "{method} {path} -> {status}").unwrap();
///     }
///
///     fn log_stream_event(&self, event: &ChatStreamEvent) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Stream event: {}", serde_json::to_string(event).unwrap()).unwrap();
///     }
///
///     fn log_stream_message(&self, message: &ChatMessage) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Answer {}: {}", message.id, message.message).unwrap();
///     }
///
///     fn log_teardown(&self, reason: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Session torn down: {reason}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log the outcome of one HTTP request.
    ///
    /// Called once per completed request with the method, the path
    /// relative to the base URL, and the response status. Replays after a
    /// token refresh are logged as separate requests.
    fn log_request(&self, method: &str, path: &str, status: u16);

    /// Log an individual streaming event.
    ///
    /// Called for each [`ChatStreamEvent`] received during a streaming
    /// ask, including the terminal done or error event.
    fn log_stream_event(&self, event: &ChatStreamEvent);

    /// Log the finalized assistant message from a completed stream.
    ///
    /// Called once when a turn finalizes, with the reconciled
    /// [`ChatMessage`] carrying its server-assigned id.
    fn log_stream_message(&self, message: &ChatMessage);

    /// Log a session teardown.
    ///
    /// Called when credentials are cleared and the user is sent back to
    /// login, with a short reason string.
    fn log_teardown(&self, reason: &str);
}
