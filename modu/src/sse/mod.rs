// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

// Server-sent event stream parsing
//
// Responsibilities:
// - Split a chunked `text/event-stream` body at blank-line boundaries
// - Parse `id:`, `event:` and `data:` fields into records
// - Yield exactly one terminal `done` record, after all data records
// - Memory-bounded: 1MB max per unterminated record by default
// - Detect non-SSE bodies from their content type

mod parser;
mod reader;
mod types;

pub use parser::{is_event_stream, parse_record, EventParser};
pub use reader::EventReader;
pub use types::{
    EventKind, ServerSentEvent, StreamError, StreamLimits, DEFAULT_CHANNEL_CAPACITY,
    DEFAULT_MAX_RECORD_BYTES,
};

#[cfg(test)]
mod tests;
