//! Server-Sent Events (SSE) processing for streaming answers.
//!
//! This module handles parsing and processing of SSE streams from the
//! Polaris API, converting raw byte streams into structured
//! [`ChatStreamEvent`] objects.
//!
//! The server frames every event as a `data: {json}` line terminated by a
//! blank line (LF framing); there are no `event:` lines. Comment lines
//! (leading `:`) are keep-alives and produce nothing.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::types::ChatStreamEvent;
use crate::{Error, Result};

/// Process a stream of bytes into a stream of chat events.
///
/// This function takes a byte stream from an HTTP response and converts it
/// into a stream of parsed [`ChatStreamEvent`] objects, handling SSE
/// framing, buffering, and error conditions. The buffer holds raw bytes so
/// a chunk boundary in the middle of a multi-byte character cannot corrupt
/// a frame.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatStreamEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let buffer: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer),
        move |(mut stream, mut buffer)| async move {
            loop {
                // Drain complete frames before reading more
                while let Some(frame) = take_frame(&mut buffer) {
                    if let Some(event) = decode_frame(&frame) {
                        return Some((event, (stream, buffer)));
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => buffer.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, buffer)));
                    }
                    None => {
                        // End of stream; flush a final unterminated frame
                        if !buffer.is_empty() {
                            let frame = std::mem::take(&mut buffer);
                            if let Some(event) = decode_frame(&frame) {
                                return Some((event, (stream, buffer)));
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

/// Remove and return the first blank-line-terminated frame in the buffer.
fn take_frame(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let pos = buffer.windows(2).position(|w| w == b"\n\n")?;
    let mut frame: Vec<u8> = buffer.drain(..pos + 2).collect();
    frame.truncate(pos);
    Some(frame)
}

/// Decode one frame into an event.
///
/// Returns None for frames with nothing to dispatch (comments and blank
/// lines only).
fn decode_frame(frame: &[u8]) -> Option<Result<ChatStreamEvent>> {
    let text = match std::str::from_utf8(frame) {
        Ok(text) => text,
        Err(e) => {
            return Some(Err(Error::streaming(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            )));
        }
    };

    let mut data_lines = Vec::new();
    let mut saw_field = false;
    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        saw_field = true;
        if let Some(data) = line.strip_prefix("data:") {
            data_lines.push(data.trim());
        }
    }

    if data_lines.is_empty() {
        if saw_field {
            return Some(Err(Error::serialization(
                format!("Malformed SSE frame: missing 'data:' prefix in '{text}'"),
                None,
            )));
        }
        return None;
    }

    let payload = data_lines.join("\n");
    match serde_json::from_str::<ChatStreamEvent>(&payload) {
        Ok(event) => Some(Ok(event)),
        Err(e) => Some(Err(e.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StepStatus, TokenEvent};
    use futures::stream;

    #[tokio::test]
    async fn parse_token_event() {
        let data = b"data: {\"token\": \"Hello\"}\n\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap();

        assert_eq!(event.unwrap(), ChatStreamEvent::token("Hello"));
    }

    #[tokio::test]
    async fn parse_full_turn_in_one_chunk() {
        let data = b"data: {\"step\": \"intent\", \"status\": \"start\"}\n\n\
                     data: {\"step\": \"intent\", \"status\": \"done\"}\n\n\
                     data: {\"token\": \"Try \"}\n\n\
                     data: {\"done\": true, \"message_id\": 501}\n\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let sse_stream = Box::pin(process_sse(stream));
        let events: Vec<_> = sse_stream.collect().await;

        assert_eq!(events.len(), 4);
        assert_eq!(
            *events[0].as_ref().unwrap(),
            ChatStreamEvent::step("intent", StepStatus::Start)
        );
        assert_eq!(
            *events[1].as_ref().unwrap(),
            ChatStreamEvent::step("intent", StepStatus::Done)
        );
        assert_eq!(*events[2].as_ref().unwrap(), ChatStreamEvent::token("Try "));
        assert!(events[3].as_ref().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn handle_split_event() {
        // Simulate an event split across multiple chunks, with the cut in
        // the middle of a multi-byte character.
        let data = "data: {\"token\": \"광장시장\"}\n\n".as_bytes();
        let cut = data.iter().position(|&b| b >= 0x80).unwrap() + 1;

        let stream = Box::pin(stream::iter(vec![
            Ok(Bytes::copy_from_slice(&data[..cut])),
            Ok(Bytes::copy_from_slice(&data[cut..])),
        ]));

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap();

        assert_eq!(
            event.unwrap(),
            ChatStreamEvent::Token(TokenEvent {
                token: "광장시장".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn handle_malformed_frame() {
        let data = b"malformed data without proper format\n\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap();

        assert!(event.is_err());
    }

    #[tokio::test]
    async fn handle_unparseable_payload() {
        let data = b"data: {\"shape\": \"unrecognized\"}\n\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap();

        assert!(event.is_err());
    }

    #[tokio::test]
    async fn comment_frames_are_skipped() {
        let data = b": keep-alive\n\ndata: {\"token\": \"x\"}\n\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let sse_stream = Box::pin(process_sse(stream));
        let events: Vec<_> = sse_stream.collect().await;

        assert_eq!(events.len(), 1);
        assert_eq!(*events[0].as_ref().unwrap(), ChatStreamEvent::token("x"));
    }

    #[tokio::test]
    async fn final_frame_without_terminator_is_flushed() {
        let data = b"data: {\"done\": true, \"message_id\": 7}\n";
        let stream = Box::pin(stream::once(async { Ok(Bytes::from(&data[..])) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap();

        assert_eq!(event.unwrap(), ChatStreamEvent::done(7));
        assert!(sse_stream.next().await.is_none());
    }
}
