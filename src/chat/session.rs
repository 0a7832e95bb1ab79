//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the open
//! room's message list and drives one ask turn at a time against the
//! streaming endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures::StreamExt;

use crate::chat::render::Renderer;
use crate::chat::turn::{Applied, Turn, TurnPhase};
use crate::client::Polaris;
use crate::error::{Error, Result};
use crate::observability::{STREAM_TTFT, TURN_DURATION};
use crate::types::{AskParams, ChatMessage, ChatRoom, MessageId, MessageRole};

/// A chat session bound to one room.
///
/// The session keeps a local mirror of the room's messages. Sending a
/// question appends it and an empty answer placeholder immediately; the
/// placeholder fills in as tokens stream and is stamped with the server's
/// message id when the turn finalizes. Because a turn runs to completion
/// inside [`send_streaming`], a session never has two turns in flight.
///
/// [`send_streaming`]: ChatSession::send_streaming
pub struct ChatSession {
    client: Polaris,
    room_id: i64,
    room_title: String,
    messages: Vec<ChatMessage>,
    location: Option<(f64, f64)>,
    completed_turns: u64,
    failed_turns: u64,
    interrupted_turns: u64,
    last_ttft_seconds: Option<f64>,
    last_turn_seconds: Option<f64>,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The open room's id.
    pub room_id: i64,
    /// The open room's title.
    pub room_title: String,
    /// The number of messages in the local mirror.
    pub message_count: usize,
    /// Turns that finalized with a server message id.
    pub completed_turns: u64,
    /// Turns that errored.
    pub failed_turns: u64,
    /// Turns the user interrupted.
    pub interrupted_turns: u64,
    /// Seconds to first token for the most recent turn, if one streamed.
    pub last_ttft_seconds: Option<f64>,
    /// Total seconds for the most recent turn.
    pub last_turn_seconds: Option<f64>,
    /// The GPS fix attached to questions, if set.
    pub location: Option<(f64, f64)>,
}

impl ChatSession {
    /// Creates a session over an already-fetched room.
    pub fn new(client: Polaris, room: ChatRoom) -> Self {
        Self {
            client,
            room_id: room.id,
            room_title: room.title,
            messages: room.messages,
            location: None,
            completed_turns: 0,
            failed_turns: 0,
            interrupted_turns: 0,
            last_ttft_seconds: None,
            last_turn_seconds: None,
        }
    }

    /// Opens an existing room by id, loading its history.
    pub async fn open(client: Polaris, room_id: i64) -> Result<Self> {
        let room = client.room_history(room_id).await?;
        Ok(Self::new(client, room))
    }

    /// Creates a new room and binds the session to it.
    pub async fn create(client: Polaris, title: &str) -> Result<Self> {
        let room = client.create_room(title).await?;
        Ok(Self::new(client, room))
    }

    /// The client this session talks through.
    pub fn client(&self) -> &Polaris {
        &self.client
    }

    /// The open room's id.
    pub fn room_id(&self) -> i64 {
        self.room_id
    }

    /// The open room's title.
    pub fn room_title(&self) -> &str {
        &self.room_title
    }

    /// The local mirror of the room's messages.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The number of messages in the local mirror.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Sets or clears the GPS fix attached to outgoing questions.
    pub fn set_location(&mut self, location: Option<(f64, f64)>) {
        self.location = location;
    }

    /// Switches to another room, replacing the local message mirror.
    pub async fn switch_room(&mut self, room_id: i64) -> Result<()> {
        let room = self.client.room_history(room_id).await?;
        self.room_id = room.id;
        self.room_title = room.title;
        self.messages = room.messages;
        Ok(())
    }

    /// Toggles the bookmark flag on a message and mirrors the change.
    pub async fn bookmark(&mut self, message_id: i64, bookmark: bool) -> Result<ChatMessage> {
        let updated = self.client.set_bookmark(message_id, bookmark).await?;
        if let Some(local) = self
            .messages
            .iter_mut()
            .find(|m| m.id.remote() == Some(message_id))
        {
            local.bookmark_yn = updated.bookmark_yn;
        }
        Ok(updated)
    }

    /// Sends a question and streams the answer.
    ///
    /// This method:
    /// 1. Appends the question and an empty answer placeholder locally
    /// 2. Persists the question, then opens the answer stream
    /// 3. Renders progress and tokens as they arrive
    /// 4. Stamps the placeholder with the server's id on completion
    ///
    /// Setting `interrupted` cancels the turn at the next event; text
    /// streamed up to that point is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the question cannot be persisted, the stream
    /// cannot be opened, or the turn fails mid-stream. The placeholder
    /// keeps any partial answer with a notice folded in after it.
    pub async fn send_streaming(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
        interrupted: Arc<AtomicBool>,
    ) -> Result<()> {
        let started = Instant::now();
        let mut turn = Turn::new();

        let mut params = AskParams::new(self.room_id, user_input);
        if let Some((latitude, longitude)) = self.location {
            params = params.with_location(latitude, longitude);
        }

        // Optimistic: both sides of the exchange appear before the server
        // has said anything.
        self.messages
            .push(ChatMessage::local(self.room_id, MessageRole::Human, user_input));
        self.messages
            .push(ChatMessage::local(self.room_id, MessageRole::Ai, ""));
        let question = self.messages.len() - 2;
        let placeholder = self.messages.len() - 1;

        // The stream endpoint only saves the answer; the question is
        // persisted through the plain message endpoint first.
        match self.client.create_message(&params).await {
            Ok(saved) => self.messages[question] = saved,
            Err(err) => return self.fail_turn(&mut turn, placeholder, err, renderer),
        }

        let mut stream = match self.client.ask_stream(&params).await {
            Ok(stream) => stream,
            Err(err) => return self.fail_turn(&mut turn, placeholder, err, renderer),
        };

        let mut first_token_seconds: Option<f64> = None;
        let mut finalized = None;
        let mut error = None;
        while let Some(item) = stream.next().await {
            if interrupted.load(Ordering::Relaxed) {
                turn.cancel();
                break;
            }
            let event = match item {
                Ok(event) => event,
                Err(err) => {
                    turn.fail(err.to_string());
                    error = Some(err);
                    break;
                }
            };
            match turn.apply(event) {
                Applied::Token(fragment) => {
                    if first_token_seconds.is_none() {
                        let elapsed = started.elapsed().as_secs_f64();
                        first_token_seconds = Some(elapsed);
                        STREAM_TTFT.add(elapsed);
                    }
                    renderer.print_text(&fragment);
                }
                Applied::Step(step, state) => renderer.print_step(step, state),
                Applied::Finished(done) => {
                    finalized = Some(done);
                    break;
                }
                Applied::Failed(detail) => {
                    error = Some(Error::streaming(detail, None));
                    break;
                }
                Applied::Ignored => {}
            }
        }
        drop(stream);

        // A stream that just stops, with no done and no error event, is a
        // failure too.
        if turn.is_active() {
            let detail = "stream ended without completion";
            turn.fail(detail);
            error = Some(Error::streaming(detail, None));
        }

        self.messages[placeholder].message = turn.text().to_string();
        self.last_ttft_seconds = first_token_seconds;
        self.last_turn_seconds = Some(started.elapsed().as_secs_f64());

        if let Some(done) = finalized {
            TURN_DURATION.add(started.elapsed().as_secs_f64());
            self.messages[placeholder].id = MessageId::from(done.message_id);
            self.messages[placeholder].created_at = done.created_at;
            self.completed_turns += 1;
            if let Some(logger) = self.client.session().logger() {
                logger.log_stream_message(&self.messages[placeholder]);
            }
            renderer.finish_response();
            return Ok(());
        }

        if turn.phase() == TurnPhase::Cancelled {
            self.interrupted_turns += 1;
            renderer.print_interrupted();
            return Ok(());
        }

        self.failed_turns += 1;
        renderer.finish_response();
        Err(error.unwrap_or_else(|| Error::streaming("stream ended without completion", None)))
    }

    fn fail_turn(
        &mut self,
        turn: &mut Turn,
        placeholder: usize,
        err: Error,
        renderer: &mut dyn Renderer,
    ) -> Result<()> {
        turn.fail(err.to_string());
        self.messages[placeholder].message = turn.text().to_string();
        self.failed_turns += 1;
        renderer.finish_response();
        Err(err)
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            room_id: self.room_id,
            room_title: self.room_title.clone(),
            message_count: self.messages.len(),
            completed_turns: self.completed_turns,
            failed_turns: self.failed_turns,
            interrupted_turns: self.interrupted_turns,
            last_ttft_seconds: self.last_ttft_seconds,
            last_turn_seconds: self.last_turn_seconds,
            location: self.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn room_with_messages(count: usize) -> ChatRoom {
        let messages = (0..count)
            .map(|i| ChatMessage {
                id: MessageId::from(i as i64 + 1),
                room_id: 7,
                message: format!("message {i}"),
                role: if i % 2 == 0 {
                    MessageRole::Human
                } else {
                    MessageRole::Ai
                },
                created_at: OffsetDateTime::now_utc(),
                latitude: None,
                longitude: None,
                image_path: None,
                bookmark_yn: false,
            })
            .collect();
        ChatRoom {
            id: 7,
            user_id: 1,
            title: "Seoul weekend".to_string(),
            created_at: OffsetDateTime::now_utc(),
            messages,
        }
    }

    #[test]
    fn new_session_mirrors_room_history() {
        let client = Polaris::new(Some("http://localhost:9/api".to_string())).unwrap();
        let session = ChatSession::new(client, room_with_messages(4));
        assert_eq!(session.room_id(), 7);
        assert_eq!(session.room_title(), "Seoul weekend");
        assert_eq!(session.message_count(), 4);
    }

    #[test]
    fn location_shows_up_in_stats() {
        let client = Polaris::new(Some("http://localhost:9/api".to_string())).unwrap();
        let mut session = ChatSession::new(client, room_with_messages(0));
        assert!(session.stats().location.is_none());

        session.set_location(Some((37.5665, 126.9780)));
        assert_eq!(session.stats().location, Some((37.5665, 126.9780)));
        assert_eq!(session.stats().room_title, "Seoul weekend");
    }
}
