// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

// Stream types
//
// Records produced by the SSE parser, the limits that bound it, and
// the errors it can raise.

use std::fmt;

// ---------------------------------------------------------------------------
// SSE record representation
// ---------------------------------------------------------------------------

/// The `event:` name of a server-sent record.
///
/// The chat backend emits `message`, `done` and `error`. Anything else is
/// kept verbatim so callers can decide what to do with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Message,
    Done,
    Error,
    Other(String),
}

impl EventKind {
    /// Map an `event:` field value to a kind. Matching is exact.
    pub fn from_name(name: &str) -> Self {
        match name {
            "message" => EventKind::Message,
            "done" => EventKind::Done,
            "error" => EventKind::Error,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Message => "message",
            EventKind::Done => "done",
            EventKind::Error => "error",
            EventKind::Other(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed record from a `text/event-stream` body.
///
/// A record is everything between two blank-line boundaries. Every field
/// is optional on the wire; a record with none of them is never produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerSentEvent {
    /// The `id:` field, if present.
    pub id: Option<String>,
    /// The `event:` field, if present.
    pub event: Option<EventKind>,
    /// The `data:` payload. Multiple `data:` lines are joined with `\n`.
    pub data: Option<String>,
}

impl ServerSentEvent {
    /// The record the reader synthesizes when the body ends.
    pub fn done() -> Self {
        Self {
            id: None,
            event: Some(EventKind::Done),
            data: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.event == Some(EventKind::Done)
    }
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum size of a single unterminated record in bytes.
pub const DEFAULT_MAX_RECORD_BYTES: usize = 1_048_576; // 1 MB

/// Capacity of the channel between the reader task and its consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Bounds applied while reading a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLimits {
    pub max_record_bytes: usize,
    pub channel_capacity: usize,
}

impl Default for StreamLimits {
    fn default() -> Self {
        Self {
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while reading an SSE stream.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamError {
    /// The buffered, not yet terminated record outgrew the limit.
    #[error("stream record exceeded {limit} byte limit without a blank-line boundary")]
    RecordTooLarge { limit: usize },

    /// The underlying body failed mid-stream.
    #[error("stream transport failed: {0}")]
    Transport(String),
}
