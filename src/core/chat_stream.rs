//! Streaming decode of `text/event-stream` completion bodies.
//!
//! The gateway frames a streaming completion as SSE `data:` lines, one JSON
//! chunk per line, terminated by the literal payload `[DONE]`. [`ChatStream`]
//! turns the raw response body into a pull-based stream of [`StreamChunk`]s:
//! nothing is read from the connection until the consumer asks for the next
//! chunk, and at most one line is buffered at a time beyond the transport's
//! own chunking.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use memchr::memchr;
use tracing::debug;

use crate::api::StreamChunk;
use crate::error::ClientError;

/// Outcome of decoding a single SSE line.
#[derive(Debug, PartialEq)]
enum LineEvent {
    /// The line carried a JSON payload.
    Chunk(StreamChunk),
    /// The line carried the `[DONE]` sentinel; the stream is over.
    Done,
    /// Keep-alive, non-`data:` field, or malformed payload. Not yielded.
    Skip,
}

/// Decodes one line of the event stream.
///
/// Only lines starting with the exact prefix `"data: "` carry events; blank
/// keep-alives and other SSE fields (`event:`, `id:`, `:` comments) are
/// ignored. A payload that fails to parse as JSON is skipped rather than
/// surfaced, so a partial frame from the gateway never kills the stream.
fn decode_sse_line(line: &str) -> LineEvent {
    let Some(payload) = line.strip_prefix("data: ") else {
        return LineEvent::Skip;
    };
    if payload == "[DONE]" {
        return LineEvent::Done;
    }
    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(value) => LineEvent::Chunk(StreamChunk::from(value)),
        Err(err) => {
            debug!("skipping malformed stream payload: {err}");
            LineEvent::Skip
        }
    }
}

type ByteSource = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// A lazy stream of completion chunks bound to one response body.
///
/// Chunks are yielded strictly in wire order. The stream ends on the
/// `[DONE]` sentinel or when the connection closes, and the consumer cannot
/// tell the two apart. Dropping the stream early releases the underlying
/// connection. A transport read error is yielded once and then the stream
/// ends; chunks already consumed remain valid.
pub struct ChatStream {
    body: ByteSource,
    buffer: Vec<u8>,
    done: bool,
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("buffer", &self.buffer)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl ChatStream {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self::from_byte_source(Box::pin(
            response.bytes_stream().map_err(ClientError::Transport),
        ))
    }

    fn from_byte_source(body: ByteSource) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            done: false,
        }
    }

    #[cfg(test)]
    fn from_lines(lines: &[&str]) -> Self {
        let joined = lines
            .iter()
            .map(|line| format!("{line}\n"))
            .collect::<String>();
        Self::from_byte_source(Box::pin(futures_util::stream::iter([Ok(Bytes::from(
            joined,
        ))])))
    }

    /// Pops the next complete line out of the buffer, without its newline.
    /// A trailing `\r` is stripped so `\r\n`-framed streams decode the same.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let newline_pos = memchr(b'\n', &self.buffer)?;
        let mut line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }
}

impl Stream for ChatStream {
    type Item = Result<StreamChunk, ClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.done {
                return Poll::Ready(None);
            }

            // Drain complete lines already buffered before touching the
            // transport again.
            while let Some(raw) = this.take_line() {
                let Ok(line) = std::str::from_utf8(&raw) else {
                    debug!("skipping invalid UTF-8 line in stream");
                    continue;
                };
                match decode_sse_line(line) {
                    LineEvent::Chunk(chunk) => return Poll::Ready(Some(Ok(chunk))),
                    LineEvent::Done => {
                        this.done = true;
                        return Poll::Ready(None);
                    }
                    LineEvent::Skip => {}
                }
            }

            match this.body.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.buffer.extend_from_slice(&bytes);
                }
                Poll::Ready(Some(Err(err))) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    // Implicit termination: the gateway closed the
                    // connection without `[DONE]`. A final line may still
                    // sit in the buffer without its newline.
                    this.done = true;
                    if this.buffer.is_empty() {
                        return Poll::Ready(None);
                    }
                    let raw = std::mem::take(&mut this.buffer);
                    if let Ok(line) = std::str::from_utf8(&raw) {
                        let line = line.strip_suffix('\r').unwrap_or(line);
                        if let LineEvent::Chunk(chunk) = decode_sse_line(line) {
                            return Poll::Ready(Some(Ok(chunk)));
                        }
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use serde_json::json;

    async fn collect_chunks(lines: &[&str]) -> Vec<StreamChunk> {
        ChatStream::from_lines(lines)
            .map(|item| item.expect("no transport errors in fixture streams"))
            .collect()
            .await
    }

    #[test]
    fn decode_recognizes_data_chunks() {
        let event = decode_sse_line(r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#);
        match event {
            LineEvent::Chunk(chunk) => assert_eq!(chunk.delta_content(), Some("Hello")),
            other => panic!("expected chunk, got {other:?}"),
        }
    }

    #[test]
    fn decode_recognizes_sentinel() {
        assert_eq!(decode_sse_line("data: [DONE]"), LineEvent::Done);
    }

    #[test]
    fn decode_skips_non_data_lines() {
        assert_eq!(decode_sse_line(""), LineEvent::Skip);
        assert_eq!(decode_sse_line("event: ping"), LineEvent::Skip);
        assert_eq!(decode_sse_line("id: 42"), LineEvent::Skip);
        assert_eq!(decode_sse_line(": keep-alive comment"), LineEvent::Skip);
        // Missing the space after the colon, so not a data line here.
        assert_eq!(decode_sse_line("data:{\"x\":1}"), LineEvent::Skip);
    }

    #[test]
    fn decode_skips_malformed_payloads() {
        assert_eq!(decode_sse_line("data: {not valid json"), LineEvent::Skip);
        assert_eq!(decode_sse_line("data: "), LineEvent::Skip);
    }

    #[tokio::test]
    async fn yields_chunk_then_ends_on_sentinel() {
        let chunks = collect_chunks(&[
            r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#,
            "data: [DONE]",
        ])
        .await;

        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].as_value(),
            &json!({"choices":[{"delta":{"content":"Hi"}}]})
        );
    }

    #[tokio::test]
    async fn blank_lines_yield_nothing() {
        let chunks = collect_chunks(&["", "data: [DONE]"]).await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn non_data_only_input_yields_empty_stream() {
        let chunks = collect_chunks(&["event: ping", ": comment", "id: 7", ""]).await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn malformed_line_is_skipped_and_stream_continues() {
        let chunks = collect_chunks(&["data: bad", r#"data: {"x":1}"#]).await;

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_value(), &json!({"x": 1}));
    }

    #[tokio::test]
    async fn nothing_after_sentinel_is_yielded() {
        let chunks = collect_chunks(&[
            r#"data: {"x":1}"#,
            "data: [DONE]",
            r#"data: {"x":2}"#,
        ])
        .await;

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_value(), &json!({"x": 1}));
    }

    #[tokio::test]
    async fn stream_ends_when_body_closes_without_sentinel() {
        let chunks = collect_chunks(&[
            r#"data: {"choices":[{"delta":{"content":"partial"}}]}"#,
        ])
        .await;

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].delta_content(), Some("partial"));
    }

    #[tokio::test]
    async fn decoding_the_same_lines_twice_is_identical() {
        let lines = [
            r#"data: {"choices":[{"delta":{"content":"a"}}]}"#,
            "",
            r#"data: {"choices":[{"delta":{"content":"b"}}]}"#,
            "data: [DONE]",
        ];
        let first = collect_chunks(&lines).await;
        let second = collect_chunks(&lines).await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn lines_split_across_transport_chunks_are_reassembled() {
        let body: ByteSource = Box::pin(futures_util::stream::iter([
            Ok(Bytes::from_static(b"data: {\"choices\":[{\"del")),
            Ok(Bytes::from_static(b"ta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n")),
        ]));
        let chunks: Vec<StreamChunk> = ChatStream::from_byte_source(body)
            .map(|item| item.expect("fixture stream has no errors"))
            .collect()
            .await;

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].delta_content(), Some("Hi"));
    }

    #[tokio::test]
    async fn crlf_framing_decodes_the_same() {
        let body: ByteSource = Box::pin(futures_util::stream::iter([Ok(Bytes::from_static(
            b"data: {\"x\":1}\r\n\r\ndata: [DONE]\r\n",
        ))]));
        let chunks: Vec<StreamChunk> = ChatStream::from_byte_source(body)
            .map(|item| item.expect("fixture stream has no errors"))
            .collect()
            .await;

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_value(), &json!({"x": 1}));
    }

    #[tokio::test]
    async fn trailing_line_without_newline_is_decoded() {
        let body: ByteSource = Box::pin(futures_util::stream::iter([Ok(Bytes::from_static(
            b"data: {\"x\":1}",
        ))]));
        let chunks: Vec<StreamChunk> = ChatStream::from_byte_source(body)
            .map(|item| item.expect("fixture stream has no errors"))
            .collect()
            .await;

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_value(), &json!({"x": 1}));
    }
}
