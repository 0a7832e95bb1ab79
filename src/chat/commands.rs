//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending questions
//! to the server.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the server
/// as questions.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// List the user's chat rooms.
    Rooms,

    /// Open an existing room by id.
    Open(i64),

    /// Create a new room. `None` uses the default title.
    NewRoom(Option<String>),

    /// Print the open room's message history.
    History,

    /// Set or clear a message's bookmark flag.
    Bookmark(i64, bool),

    /// Attach a GPS fix to outgoing questions.
    Location(f64, f64),

    /// Stop attaching a GPS fix.
    ClearLocation,

    /// Show the signed-in user's profile.
    Profile,

    /// Change the signed-in user's nickname.
    Nickname(String),

    /// Verify the session against the server, refreshing if needed.
    Verify,

    /// Sign out and clear stored credentials.
    Logout,

    /// Display session statistics (message count, turn timings, etc.).
    Stats,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular question.
///
/// # Examples
///
/// ```
/// # use polaris::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/open 12").is_some());
/// assert!(parse_command("What should I eat in Busan?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "rooms" => ChatCommand::Rooms,
        "open" => match argument.map(str::parse::<i64>) {
            Some(Ok(room_id)) => ChatCommand::Open(room_id),
            Some(Err(_)) => ChatCommand::Invalid("/open expects a room id".to_string()),
            None => ChatCommand::Invalid("/open requires a room id".to_string()),
        },
        "new" => ChatCommand::NewRoom(argument.map(|s| s.to_string())),
        "history" => ChatCommand::History,
        "bookmark" => parse_bookmark_command(argument),
        "location" => parse_location_command(argument),
        "profile" | "me" => ChatCommand::Profile,
        "nickname" => match argument {
            Some(nickname) => ChatCommand::Nickname(nickname.to_string()),
            None => ChatCommand::Invalid("/nickname requires a name".to_string()),
        },
        "verify" => ChatCommand::Verify,
        "logout" => ChatCommand::Logout,
        "stats" | "status" => ChatCommand::Stats,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_bookmark_command(argument: Option<&str>) -> ChatCommand {
    let Some(arg) = argument else {
        return ChatCommand::Invalid("/bookmark requires a message id".to_string());
    };

    let mut parts = arg.split_whitespace();
    let message_id = match parts.next().map(str::parse::<i64>) {
        Some(Ok(message_id)) => message_id,
        _ => return ChatCommand::Invalid("/bookmark expects a message id".to_string()),
    };
    match parts.next() {
        None => ChatCommand::Bookmark(message_id, true),
        Some(flag) => match parse_on_off(flag) {
            Some(value) => ChatCommand::Bookmark(message_id, value),
            None => ChatCommand::Invalid("/bookmark expects 'on' or 'off'".to_string()),
        },
    }
}

fn parse_location_command(argument: Option<&str>) -> ChatCommand {
    let Some(arg) = argument else {
        return ChatCommand::Invalid(
            "/location requires '<latitude> <longitude>' or 'clear'".to_string(),
        );
    };
    if arg.eq_ignore_ascii_case("clear") {
        return ChatCommand::ClearLocation;
    }

    let mut parts = arg.split_whitespace();
    let latitude = parts.next().and_then(|s| s.parse::<f64>().ok());
    let longitude = parts.next().and_then(|s| s.parse::<f64>().ok());
    match (latitude, longitude, parts.next()) {
        (Some(latitude), Some(longitude), None)
            if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) =>
        {
            ChatCommand::Location(latitude, longitude)
        }
        _ => ChatCommand::Invalid(
            "/location expects a latitude -90..90 and a longitude -180..180".to_string(),
        ),
    }
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /rooms                 List your chat rooms
  /open <id>             Open an existing room
  /new [title]           Create a new room and switch to it
  /history               Print the open room's messages
  /bookmark <id> [on|off] Set or clear a message's bookmark
  /location <lat> <lon>  Attach a GPS fix to questions (or 'clear')
  /profile               Show your profile
  /nickname <name>       Change your nickname
  /verify                Verify the session, refreshing if needed
  /logout                Sign out and clear stored credentials
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_rooms_and_open() {
        assert_eq!(parse_command("/rooms"), Some(ChatCommand::Rooms));
        assert_eq!(parse_command("/open 12"), Some(ChatCommand::Open(12)));
        assert_eq!(
            parse_command("/open twelve"),
            Some(ChatCommand::Invalid("/open expects a room id".to_string()))
        );
        assert_eq!(
            parse_command("/open"),
            Some(ChatCommand::Invalid("/open requires a room id".to_string()))
        );
    }

    #[test]
    fn parse_new_room() {
        assert_eq!(parse_command("/new"), Some(ChatCommand::NewRoom(None)));
        assert_eq!(
            parse_command("/new Jeju in May"),
            Some(ChatCommand::NewRoom(Some("Jeju in May".to_string())))
        );
    }

    #[test]
    fn parse_bookmark() {
        assert_eq!(
            parse_command("/bookmark 42"),
            Some(ChatCommand::Bookmark(42, true))
        );
        assert_eq!(
            parse_command("/bookmark 42 off"),
            Some(ChatCommand::Bookmark(42, false))
        );
        assert!(matches!(
            parse_command("/bookmark forty-two"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects")
        ));
    }

    #[test]
    fn parse_location() {
        assert_eq!(
            parse_command("/location 37.5665 126.9780"),
            Some(ChatCommand::Location(37.5665, 126.9780))
        );
        assert_eq!(
            parse_command("/location clear"),
            Some(ChatCommand::ClearLocation)
        );
        assert!(matches!(
            parse_command("/location 137.0 126.0"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("latitude")
        ));
        assert!(matches!(
            parse_command("/location 37.5"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_profile_and_nickname() {
        assert_eq!(parse_command("/profile"), Some(ChatCommand::Profile));
        assert_eq!(parse_command("/me"), Some(ChatCommand::Profile));
        assert_eq!(
            parse_command("/nickname mina"),
            Some(ChatCommand::Nickname("mina".to_string()))
        );
        assert!(matches!(
            parse_command("/nickname"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_session_commands() {
        assert_eq!(parse_command("/verify"), Some(ChatCommand::Verify));
        assert_eq!(parse_command("/logout"), Some(ChatCommand::Logout));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/status"), Some(ChatCommand::Stats));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("What should I eat in Busan?"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(!help.is_empty());
        assert!(help.contains("/quit"));
        assert!(help.contains("/rooms"));
        assert!(help.contains("/bookmark"));
        assert!(help.contains("/location"));
    }
}
