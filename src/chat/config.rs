//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use arrrg_derive::CommandLine;

/// Default title for a room created at startup.
const DEFAULT_ROOM_TITLE: &str = "New conversation";

/// Command-line arguments for the polaris-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the API server.
    #[arrrg(optional, "API base URL (default: $POLARIS_BASE_URL)", "URL")]
    pub base_url: Option<String>,

    /// Existing room to open instead of creating a new one.
    #[arrrg(optional, "Open an existing room by id", "ROOM")]
    pub room: Option<i64>,

    /// Title for the room created at startup.
    #[arrrg(optional, "Title for a newly created room", "TITLE")]
    pub title: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL of the API server. `None` falls back to the
    /// POLARIS_BASE_URL environment variable.
    pub base_url: Option<String>,

    /// Existing room to open. `None` creates a new room at startup.
    pub room: Option<i64>,

    /// Title used when creating a new room.
    pub title: String,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: taken from the environment
    /// - Room: create a new one
    /// - Title: "New conversation"
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: None,
            room: None,
            title: DEFAULT_ROOM_TITLE.to_string(),
            use_color: true,
        }
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the room to open at startup.
    pub fn with_room(mut self, room: i64) -> Self {
        self.room = Some(room);
        self
    }

    /// Sets the title used when creating a new room.
    pub fn with_title(mut self, title: String) -> Self {
        self.title = title;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            base_url: args.base_url,
            room: args.room,
            title: args.title.unwrap_or_else(|| DEFAULT_ROOM_TITLE.to_string()),
            use_color: !args.no_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert!(config.base_url.is_none());
        assert!(config.room.is_none());
        assert_eq!(config.title, "New conversation");
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_defaults() {
        let args = ChatArgs::default();
        let config = ChatConfig::from(args);
        assert!(config.base_url.is_none());
        assert!(config.room.is_none());
        assert_eq!(config.title, "New conversation");
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            base_url: Some("https://api.example.com/api".to_string()),
            room: Some(12),
            title: Some("Jeju in May".to_string()),
            no_color: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(
            config.base_url.as_deref(),
            Some("https://api.example.com/api")
        );
        assert_eq!(config.room, Some(12));
        assert_eq!(config.title, "Jeju in May");
        assert!(!config.use_color);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_base_url("http://localhost:8000/api".to_string())
            .with_room(3)
            .with_title("Busan food tour".to_string())
            .without_color();

        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8000/api"));
        assert_eq!(config.room, Some(3));
        assert_eq!(config.title, "Busan food tour");
        assert!(!config.use_color);
    }
}
