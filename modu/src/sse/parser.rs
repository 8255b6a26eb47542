// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

// Incremental SSE record parser
//
// Buffers raw body bytes, cuts them at blank-line boundaries, and parses
// each record's `id:`, `event:` and `data:` fields. Bytes are only decoded
// once a whole record is available, so a multi-byte character split across
// network chunks decodes the same as if it had arrived in one piece.

use super::types::{EventKind, ServerSentEvent, StreamError, DEFAULT_MAX_RECORD_BYTES};

/// Splits a growing byte buffer into [`ServerSentEvent`] records.
#[derive(Debug)]
pub struct EventParser {
    buffer: Vec<u8>,
    /// Offset from which the next boundary search starts. Everything before
    /// it is known not to contain a boundary.
    scan_from: usize,
    max_record_bytes: usize,
    done_seen: bool,
}

impl Default for EventParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECORD_BYTES)
    }
}

impl EventParser {
    pub fn new(max_record_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scan_from: 0,
            max_record_bytes,
            done_seen: false,
        }
    }

    /// Append a chunk and add every record it completes to `out`, in order.
    ///
    /// Records completed by the chunk are always added, even when the
    /// unterminated tail left behind outgrows the configured limit. That
    /// case is then reported as an error, and the parser should be
    /// discarded.
    pub fn push(
        &mut self,
        chunk: &[u8],
        out: &mut Vec<ServerSentEvent>,
    ) -> Result<(), StreamError> {
        self.buffer.extend_from_slice(chunk);

        let mut start = 0;
        let mut scan_from = self.scan_from;
        while let Some((end, boundary_len)) = find_boundary(&self.buffer, scan_from) {
            let text = String::from_utf8_lossy(&self.buffer[start..end]);
            if let Some(record) = parse_record(&text) {
                self.done_seen |= record.is_done();
                out.push(record);
            }
            start = end + boundary_len;
            scan_from = start;
        }
        if start > 0 {
            self.buffer.drain(..start);
        }
        // A boundary needs a newline plus up to two more bytes, so only the
        // last two bytes can still start one.
        self.scan_from = self.buffer.len().saturating_sub(2);

        if self.buffer.len() > self.max_record_bytes {
            return Err(StreamError::RecordTooLarge {
                limit: self.max_record_bytes,
            });
        }
        Ok(())
    }

    /// Close the stream: flush an unterminated trailing record and append
    /// the terminal `done` record unless one was already produced.
    pub fn finish(self) -> Vec<ServerSentEvent> {
        let mut records = Vec::new();
        let mut done_seen = self.done_seen;

        if !self.buffer.is_empty() {
            if let Some(record) = parse_record(&String::from_utf8_lossy(&self.buffer)) {
                done_seen |= record.is_done();
                records.push(record);
            }
        }
        if !done_seen {
            records.push(ServerSentEvent::done());
        }
        records
    }

    /// Whether a `done` record has already been produced by [`push`](Self::push).
    pub fn done_seen(&self) -> bool {
        self.done_seen
    }

    /// Parse a body that is already fully in memory.
    pub fn parse_complete(body: &[u8]) -> Result<Vec<ServerSentEvent>, StreamError> {
        let mut parser = Self::new(body.len().max(DEFAULT_MAX_RECORD_BYTES));
        let mut records = Vec::new();
        parser.push(body, &mut records)?;
        records.extend(parser.finish());
        Ok(records)
    }
}

/// Locate the first blank-line boundary at or after `from`.
///
/// Returns the offset where the boundary starts and the length of the
/// boundary itself (`\n\n` or `\n\r\n`).
fn find_boundary(buffer: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut pos = from;
    while pos < buffer.len() {
        let newline = pos + buffer[pos..].iter().position(|&b| b == b'\n')?;
        let rest = &buffer[newline + 1..];
        if rest.starts_with(b"\n") {
            return Some((newline, 2));
        }
        if rest.starts_with(b"\r\n") {
            return Some((newline, 3));
        }
        pos = newline + 1;
    }
    None
}

// ---------------------------------------------------------------------------
// Record parsing
// ---------------------------------------------------------------------------

/// Parse the text of one record (the bytes between two boundaries).
///
/// ```text
/// id: 7
/// event: message
/// data: {"message_uid":"m1", ...}
/// ```
///
/// Comment lines start with `:`. Unknown fields are ignored. Returns `None`
/// when the record carries none of `id`, `event` or `data`.
pub fn parse_record(text: &str) -> Option<ServerSentEvent> {
    let mut record = ServerSentEvent::default();
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => data_lines.push(value),
            "event" if !value.is_empty() => record.event = Some(EventKind::from_name(value)),
            "id" => record.id = Some(value.to_string()),
            _ => {}
        }
    }

    if !data_lines.is_empty() {
        record.data = Some(data_lines.join("\n"));
    }

    if record.id.is_none() && record.event.is_none() && record.data.is_none() {
        return None;
    }
    Some(record)
}

/// Whether a `Content-Type` header value denotes an SSE body.
///
/// Parameters such as `charset` are ignored, as is case.
pub fn is_event_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|media| media.trim().eq_ignore_ascii_case("text/event-stream"))
        .unwrap_or(false)
}
