//! Incremental reader for the session event stream.
//!
//! Wire format, as emitted by Agent Runner:
//!
//! ```text
//! event: {type}\ndata: {json}\n\n
//! ```
//!
//! with optional `:`-prefixed comment lines (heartbeats) interspersed.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use agent_runner_core::types::StreamEvent;
use bytes::Bytes;
use futures::{Stream, StreamExt, stream::BoxStream};
use serde_json::{Map, Value};

use crate::error::StreamError;

/// Incremental SSE frame decoder.
///
/// Keeps a rolling buffer across arbitrary chunk boundaries from the
/// transport; a complete frame can be taken out as soon as its terminating
/// blank line has arrived, and any trailing partial frame is retained for
/// the next chunk. Splitting the input at any byte offset never changes
/// the decoded event sequence.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
}

impl FrameDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of bytes from the transport.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
    }

    /// Take the next complete event out of the buffer, if any.
    ///
    /// Frames that parse to nothing (comment-only frames, frames missing a
    /// type or payload, malformed JSON payloads) are skipped; they never
    /// abort consumption.
    pub fn next_event(&mut self) -> Option<StreamEvent> {
        while let Some(pos) = self.buffer.find("\n\n") {
            let frame: String = self.buffer.drain(..pos + 2).collect();
            if let Some(event) = parse_frame(&frame[..pos]) {
                return Some(event);
            }
        }
        None
    }
}

/// Parse one raw frame into an event.
///
/// A frame must yield both a type and a data payload to produce an event.
fn parse_frame(raw: &str) -> Option<StreamEvent> {
    let mut event_type = None;
    let mut data = None;

    for line in raw.lines() {
        let line = line.trim();
        if line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("event:") {
            event_type = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data = Some(rest.trim().to_string());
        }
    }

    let (event_type, data) = (event_type?, data?);

    match serde_json::from_str::<Value>(&data) {
        Ok(Value::Object(map)) => Some(StreamEvent::new(event_type, map)),
        Ok(_) => Some(StreamEvent::new(event_type, Map::new())),
        Err(e) => {
            tracing::debug!("dropping malformed '{event_type}' frame: {e}");
            None
        }
    }
}

/// Lazy, non-restartable sequence of session events.
///
/// The `done` event is terminal: once yielded, the underlying transport is
/// never polled again, so buffered trailing bytes and late transport errors
/// (connection teardown races after a completed run) are both ignored. A
/// transport failure before that surfaces as [`StreamError`]. Dropping the
/// stream releases the connection.
pub struct EventStream {
    inner: BoxStream<'static, Result<Bytes, StreamError>>,
    decoder: FrameDecoder,
    finished: bool,
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl EventStream {
    /// Wrap a raw byte stream from the transport.
    #[must_use]
    pub fn new<S>(bytes: S) -> Self
    where
        S: Stream<Item = Result<Bytes, StreamError>> + Send + 'static,
    {
        Self {
            inner: bytes.boxed(),
            decoder: FrameDecoder::new(),
            finished: false,
        }
    }
}

impl Stream for EventStream {
    type Item = Result<StreamEvent, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            if let Some(event) = this.decoder.next_event() {
                if event.is_done() {
                    this.finished = true;
                }
                return Poll::Ready(Some(Ok(event)));
            }

            match this.inner.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(chunk))) => this.decoder.feed(&chunk),
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
                // EOF discards any trailing partial frame.
                Poll::Ready(None) => {
                    this.finished = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
