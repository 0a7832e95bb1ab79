//! Capability traits for the host's persistence and navigation.
//!
//! The browser build of this product kept credentials in local storage and
//! bounced to the login page on terminal auth failures. Both capabilities
//! are injected here so other hosts can supply their own and tests can
//! assert on the exact read/write/redirect sequence.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Store keys this client persists.
pub mod keys {
    /// The short-lived bearer token.
    pub const ACCESS_TOKEN: &str = "access_token";

    /// The long-lived refresh token.
    pub const REFRESH_TOKEN: &str = "refresh_token";

    /// Cached display name for instant header rendering.
    pub const USER_NAME: &str = "user_name";

    /// Cached avatar URL.
    pub const PROFILE_PICTURE: &str = "profile_picture";

    /// Every key that identifies the signed-in user. Session teardown
    /// removes all of them.
    pub const IDENTITY: [&str; 4] = [ACCESS_TOKEN, REFRESH_TOKEN, USER_NAME, PROFILE_PICTURE];
}

/// String key-value persistence, in the shape of browser local storage.
///
/// Implementations must be safe to call from multiple tasks; the session
/// guard is the only writer but readers are unrestricted.
pub trait CredentialStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);

    /// Removes `key` if present.
    fn remove(&self, key: &str);
}

/// Where the host sends the user when the session cannot continue.
pub trait Navigator: Send + Sync {
    /// Sends the user to the login entry point.
    fn redirect_to_login(&self);
}

/// In-memory [`CredentialStore`], the default for non-browser hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.lock().unwrap().remove(key);
    }
}

/// [`Navigator`] that only counts redirects. The default for hosts with
/// no navigation surface, and what tests assert against.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: AtomicUsize,
}

impl RecordingNavigator {
    /// Creates a navigator with no redirects recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the user was sent to login.
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}
