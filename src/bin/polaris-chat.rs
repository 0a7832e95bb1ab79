//! Interactive travel chat for talking to the trip-planning service.
//!
//! This binary provides a streaming REPL interface over the polaris
//! client library.
//!
//! # Usage
//!
//! ```bash
//! # Sign in with tokens from the environment and start a new room
//! POLARIS_ACCESS_TOKEN=... POLARIS_REFRESH_TOKEN=... polaris-chat
//!
//! # Open an existing room
//! polaris-chat --room 12
//!
//! # Point at a different server
//! polaris-chat --base-url https://api.example.com/api
//!
//! # Disable colors (useful for piping output)
//! polaris-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/rooms` - List your chat rooms
//! - `/open <id>` - Switch to another room
//! - `/bookmark <id>` - Bookmark an answer
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use polaris::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use polaris::types::{MessageRole, UserUpdate};
use polaris::{Error, Polaris};

/// Main entry point for the polaris-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("polaris-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let client = Polaris::new(config.base_url.clone())?;
    authenticate(&client).await?;

    let mut session = match config.room {
        Some(room_id) => ChatSession::open(client, room_id).await?,
        None => ChatSession::create(client, &config.title).await?,
    };
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("Polaris Chat (room {}: {})", session.room_id(), session.room_title());
    println!("Type /help for commands, /quit to exit\n");

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Rooms => match session.client().rooms().await {
                            Ok(rooms) => {
                                for room in rooms {
                                    println!("    [{}] {}", room.id, room.title);
                                }
                            }
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Open(room_id) => match session.switch_room(room_id).await {
                            Ok(()) => renderer.print_info(&format!(
                                "Opened room {}: {}",
                                session.room_id(),
                                session.room_title()
                            )),
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::NewRoom(title) => {
                            let title = title.unwrap_or_else(|| config.title.clone());
                            match session.client().create_room(&title).await {
                                Ok(room) => match session.switch_room(room.id).await {
                                    Ok(()) => renderer.print_info(&format!(
                                        "Created room {}: {}",
                                        room.id, title
                                    )),
                                    Err(err) => renderer.print_error(&err.to_string()),
                                },
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::History => {
                            print_history(&session);
                        }
                        ChatCommand::Bookmark(message_id, bookmark) => {
                            match session.bookmark(message_id, bookmark).await {
                                Ok(updated) => renderer.print_info(&format!(
                                    "Message {} bookmark {}",
                                    message_id,
                                    if updated.bookmark_yn { "set" } else { "cleared" }
                                )),
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::Location(latitude, longitude) => {
                            session.set_location(Some((latitude, longitude)));
                            renderer.print_info(&format!(
                                "Questions now carry location {:.4}, {:.4}",
                                latitude, longitude
                            ));
                        }
                        ChatCommand::ClearLocation => {
                            session.set_location(None);
                            renderer.print_info("Location cleared.");
                        }
                        ChatCommand::Profile => match session.client().me().await {
                            Ok(profile) => {
                                println!("    [{}] {}", profile.id, profile.display_name());
                                println!("      Email: {}", profile.email);
                                match profile.nickname.as_deref() {
                                    Some(nickname) => println!("      Nickname: {}", nickname),
                                    None => println!("      Nickname: (none)"),
                                }
                            }
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Nickname(nickname) => {
                            let update = UserUpdate {
                                nickname: Some(nickname.clone()),
                                ..UserUpdate::default()
                            };
                            match session.client().update_me(&update).await {
                                Ok(profile) => renderer.print_info(&format!(
                                    "Nickname changed to: {}",
                                    profile.display_name()
                                )),
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::Verify => {
                            match session.client().session().verify_and_refresh().await {
                                Ok(()) => renderer.print_info("Session verified."),
                                Err(err) => {
                                    renderer.print_error(&err.to_string());
                                    if err.is_session_expired() {
                                        break;
                                    }
                                }
                            }
                        }
                        ChatCommand::Logout => {
                            if let Err(err) = session.client().session().logout().await {
                                renderer.print_error(&err.to_string());
                            }
                            println!("Signed out.");
                            break;
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular question - send to the server
                println!("Guide:");
                if let Err(e) = session
                    .send_streaming(line, &mut renderer, interrupted.clone())
                    .await
                {
                    renderer.print_error(&e.to_string());
                    if e.is_session_expired() {
                        renderer.print_info("Session ended. Sign in again to continue.");
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

/// Signs in from the environment.
///
/// POLARIS_AUTH_CODE exchanges a Google auth code for tokens;
/// POLARIS_ACCESS_TOKEN (plus optional POLARIS_REFRESH_TOKEN) adopts
/// tokens directly. Either way the session is verified before use.
async fn authenticate(client: &Polaris) -> Result<(), Error> {
    let guard = client.session();
    if let Ok(code) = env::var("POLARIS_AUTH_CODE") {
        guard.login_with_code(&code).await?;
    } else if let Ok(access_token) = env::var("POLARIS_ACCESS_TOKEN") {
        let refresh_token = env::var("POLARIS_REFRESH_TOKEN").ok();
        guard.adopt_tokens(&access_token, refresh_token.as_deref());
    } else {
        return Err(Error::no_credential(
            "set POLARIS_AUTH_CODE or POLARIS_ACCESS_TOKEN to sign in",
        ));
    }
    guard.verify_and_refresh().await
}

fn print_history(session: &ChatSession) {
    if session.messages().is_empty() {
        println!("    (no messages)");
        return;
    }
    for message in session.messages() {
        let who = match message.role {
            MessageRole::Human => "You",
            MessageRole::Ai => "Guide",
        };
        let star = if message.bookmark_yn { " *" } else { "" };
        println!("    [{}] {}{}: {}", message.id, who, star, message.message);
    }
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Room: [{}] {}", stats.room_id, stats.room_title);
    println!("      Messages: {}", stats.message_count);
    println!(
        "      Turns: {} completed / {} failed / {} interrupted",
        stats.completed_turns, stats.failed_turns, stats.interrupted_turns
    );
    match stats.last_ttft_seconds {
        Some(seconds) => println!("      Last first-token latency: {:.2}s", seconds),
        None => println!("      Last first-token latency: (none)"),
    }
    match stats.last_turn_seconds {
        Some(seconds) => println!("      Last turn duration: {:.2}s", seconds),
        None => println!("      Last turn duration: (none)"),
    }
    match stats.location {
        Some((latitude, longitude)) => {
            println!("      Location: {:.4}, {:.4}", latitude, longitude)
        }
        None => println!("      Location: (not set)"),
    }
}
