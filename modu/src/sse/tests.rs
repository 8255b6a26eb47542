// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

// Tests for SSE record parsing and the async stream reader
//
// Tests cover:
//  1. Field parsing: id, event, data, multi-line data, comments
//  2. Boundary handling: LF and CRLF blank lines, trailing partial records
//  3. Chunk-boundary independence, including split UTF-8 characters
//  4. Exactly one terminal done record
//  5. Memory bound on unterminated records
//  6. Content-type detection
//  7. Reader task: ordering, early close on done, transport errors, abort

use super::*;
use bytes::Bytes;
use std::convert::Infallible;
use tokio::time::{self, Duration};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const CHAT_BODY: &str = concat!(
    "id: 1\n",
    "event: message\n",
    "data: {\"message_uid\":\"m1\",\"content\":\"Hel\"}\n",
    "\n",
    ": keep-alive\n",
    "\n",
    "id: 2\n",
    "event: message\n",
    "data: {\"message_uid\":\"m1\",\"content\":\"lo — ünïcödé ✓\"}\n",
    "\n",
    "event: error\n",
    "data: quota exceeded\n",
    "\n",
);

fn message(id: &str, data: &str) -> ServerSentEvent {
    ServerSentEvent {
        id: Some(id.to_string()),
        event: Some(EventKind::Message),
        data: Some(data.to_string()),
    }
}

/// Feed `chunks` through a fresh parser and close it.
fn parse_chunks(chunks: &[&[u8]]) -> Vec<ServerSentEvent> {
    let mut parser = EventParser::default();
    let mut records = Vec::new();
    for chunk in chunks {
        parser.push(chunk, &mut records).expect("push should succeed");
    }
    records.extend(parser.finish());
    records
}

/// In-memory body whose items are the given chunks.
fn body(
    chunks: Vec<&str>,
) -> impl tokio_stream::Stream<Item = Result<Bytes, Infallible>> + Unpin + Send + 'static {
    let chunks: Vec<Result<Bytes, Infallible>> = chunks
        .into_iter()
        .map(|c| Ok(Bytes::from(c.to_string())))
        .collect();
    tokio_stream::iter(chunks)
}

/// Body backed by a channel for tests that control timing.
fn channel_body() -> (
    tokio::sync::mpsc::Sender<Result<Bytes, String>>,
    ReceiverStream<Result<Bytes, String>>,
) {
    let (tx, rx) = tokio::sync::mpsc::channel(16);
    (tx, ReceiverStream::new(rx))
}

async fn collect(reader: EventReader) -> Vec<Result<ServerSentEvent, StreamError>> {
    reader.collect::<Vec<_>>().await
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

#[test]
fn parses_id_event_and_data() {
    let record = parse_record("id: 42\nevent: message\ndata: {\"a\":1}").expect("record");
    assert_eq!(record, message("42", "{\"a\":1}"));
}

#[test]
fn data_without_space_after_colon() {
    let record = parse_record("data:payload").expect("record");
    assert_eq!(record.data.as_deref(), Some("payload"));
    assert_eq!(record.event, None);
    assert_eq!(record.id, None);
}

#[test]
fn only_one_leading_space_is_stripped() {
    let record = parse_record("data:   indented").expect("record");
    assert_eq!(record.data.as_deref(), Some("  indented"));
}

#[test]
fn multiple_data_lines_are_joined_with_newline() {
    let record = parse_record("data: first\ndata: second\ndata:").expect("record");
    assert_eq!(record.data.as_deref(), Some("first\nsecond\n"));
}

#[test]
fn unknown_event_name_is_preserved() {
    let record = parse_record("event: heartbeat").expect("record");
    assert_eq!(record.event, Some(EventKind::Other("heartbeat".into())));
    assert_eq!(record.event.as_ref().map(|e| e.to_string()).as_deref(), Some("heartbeat"));
}

#[test]
fn comment_only_record_is_skipped() {
    assert_eq!(parse_record(": ping"), None);
    assert_eq!(parse_record("retry: 1000"), None);
    assert_eq!(parse_record(""), None);
}

#[test]
fn data_containing_colons_is_kept_whole() {
    let record = parse_record("data: {\"url\":\"https://modu.example\"}").expect("record");
    assert_eq!(record.data.as_deref(), Some("{\"url\":\"https://modu.example\"}"));
}

// ---------------------------------------------------------------------------
// Boundaries
// ---------------------------------------------------------------------------

#[test]
fn parses_full_body_in_one_chunk() {
    let records = parse_chunks(&[CHAT_BODY.as_bytes()]);

    assert_eq!(records.len(), 4);
    assert_eq!(records[0], message("1", "{\"message_uid\":\"m1\",\"content\":\"Hel\"}"));
    assert_eq!(
        records[1],
        message("2", "{\"message_uid\":\"m1\",\"content\":\"lo — ünïcödé ✓\"}")
    );
    assert_eq!(records[2].event, Some(EventKind::Error));
    assert_eq!(records[2].data.as_deref(), Some("quota exceeded"));
    assert!(records[3].is_done());
}

#[test]
fn crlf_boundaries_are_recognised() {
    let body = "event: message\r\ndata: one\r\n\r\nevent: message\r\ndata: two\r\n\r\n";
    let records = parse_chunks(&[body.as_bytes()]);

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].data.as_deref(), Some("one"));
    assert_eq!(records[1].data.as_deref(), Some("two"));
    assert!(records[2].is_done());
}

#[test]
fn record_is_not_emitted_before_its_boundary() {
    let mut parser = EventParser::default();
    let mut records = Vec::new();
    parser.push(b"data: partial\n", &mut records).unwrap();
    assert!(records.is_empty());
    parser.push(b"\n", &mut records).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].data.as_deref(), Some("partial"));
}

#[test]
fn trailing_unterminated_record_is_flushed_before_done() {
    let records = parse_chunks(&[b"data: a\n\ndata: tail"]);

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].data.as_deref(), Some("a"));
    assert_eq!(records[1].data.as_deref(), Some("tail"));
    assert!(records[2].is_done());
}

// ---------------------------------------------------------------------------
// Chunk-boundary independence
// ---------------------------------------------------------------------------

#[test]
fn every_two_way_split_yields_the_same_records() {
    let bytes = CHAT_BODY.as_bytes();
    let expected = parse_chunks(&[bytes]);

    for split in 0..=bytes.len() {
        let (head, tail) = bytes.split_at(split);
        assert_eq!(
            parse_chunks(&[head, tail]),
            expected,
            "split at byte {split} changed the parsed records"
        );
    }
}

#[test]
fn byte_at_a_time_yields_the_same_records() {
    let bytes = CHAT_BODY.as_bytes();
    let expected = parse_chunks(&[bytes]);
    let singles: Vec<&[u8]> = bytes.chunks(1).collect();

    assert_eq!(parse_chunks(&singles), expected);
}

#[test]
fn split_inside_crlf_boundary_is_handled() {
    let body = b"data: x\r\n\r\ndata: y\r\n\r\n";
    let expected = parse_chunks(&[body]);
    for split in 0..=body.len() {
        let (head, tail) = body.split_at(split);
        assert_eq!(parse_chunks(&[head, tail]), expected, "split at {split}");
    }
}

#[test]
fn split_multibyte_character_decodes_intact() {
    let body = "data: ✓\n\n".as_bytes();
    // '✓' is three bytes starting at offset 6
    let records = parse_chunks(&[&body[..7], &body[7..8], &body[8..]]);
    assert_eq!(records[0].data.as_deref(), Some("✓"));
}

// ---------------------------------------------------------------------------
// Terminal done record
// ---------------------------------------------------------------------------

#[test]
fn empty_body_yields_only_done() {
    let records = parse_chunks(&[]);
    assert_eq!(records, vec![ServerSentEvent::done()]);
}

#[test]
fn whitespace_only_body_yields_only_done() {
    let records = parse_chunks(&[b"\n\n\n"]);
    assert_eq!(records, vec![ServerSentEvent::done()]);
}

#[test]
fn server_sent_done_is_not_duplicated() {
    let records = parse_chunks(&[b"data: a\n\nevent: done\ndata: {}\n\n"]);

    let done_count = records.iter().filter(|r| r.is_done()).count();
    assert_eq!(done_count, 1);
    assert!(records.last().unwrap().is_done());
    assert_eq!(records.last().unwrap().data.as_deref(), Some("{}"));
}

#[test]
fn done_is_last_after_data_records() {
    let records = parse_chunks(&[b"data: 1\n\ndata: 2\n\n"]);
    let done_positions: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_done())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(done_positions, vec![records.len() - 1]);
}

#[test]
fn parse_complete_matches_incremental_parsing() {
    let records = EventParser::parse_complete(CHAT_BODY.as_bytes()).unwrap();
    assert_eq!(records, parse_chunks(&[CHAT_BODY.as_bytes()]));
}

// ---------------------------------------------------------------------------
// Memory bound
// ---------------------------------------------------------------------------

#[test]
fn oversized_unterminated_record_is_rejected() {
    let mut parser = EventParser::new(16);
    let mut records = Vec::new();
    parser.push(b"data: 0123", &mut records).unwrap();
    let err = parser.push(b"456789abcdef", &mut records).unwrap_err();
    assert_eq!(err, StreamError::RecordTooLarge { limit: 16 });
    assert!(records.is_empty());
}

#[test]
fn completed_records_do_not_count_against_the_limit() {
    let mut parser = EventParser::new(16);
    let mut records = Vec::new();
    for n in 1..=10 {
        parser.push(b"data: 01234\n\n", &mut records).unwrap();
        assert_eq!(records.len(), n);
    }
}

/// Push each chunk into a parser limited to 16 bytes, stopping at the
/// first error.
fn push_until_error(chunks: &[&[u8]]) -> (Vec<ServerSentEvent>, Option<StreamError>) {
    let mut parser = EventParser::new(16);
    let mut records = Vec::new();
    for chunk in chunks {
        if let Err(e) = parser.push(chunk, &mut records) {
            return (records, Some(e));
        }
    }
    (records, None)
}

#[test]
fn records_completed_before_an_oversized_tail_are_kept() {
    let (records, err) = push_until_error(&[b"data: ok\n\ndata: 0123456789abcdef"]);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].data.as_deref(), Some("ok"));
    assert_eq!(err, Some(StreamError::RecordTooLarge { limit: 16 }));
}

#[test]
fn oversized_tail_yields_the_same_result_for_every_split() {
    let body: &[u8] = b"data: ok\n\ndata: second\n\ndata: 0123456789abcdef";
    let expected = push_until_error(&[body]);
    assert_eq!(expected.0.len(), 2);
    assert!(expected.1.is_some());

    for split in 0..=body.len() {
        let (head, tail) = body.split_at(split);
        assert_eq!(push_until_error(&[head, tail]), expected, "split at {split}");
    }
}

#[test]
fn many_records_in_one_chunk_are_all_parsed() {
    let body: String = (0..5_000)
        .map(|i| format!("id: {i}\ndata: {{\"n\":{i}}}\n\n"))
        .collect();

    let records = EventParser::parse_complete(body.as_bytes()).unwrap();
    assert_eq!(records.len(), 5_001);
    assert_eq!(records[4_999].id.as_deref(), Some("4999"));
    assert_eq!(records[4_999].data.as_deref(), Some("{\"n\":4999}"));
    assert!(records[5_000].is_done());
}

// ---------------------------------------------------------------------------
// Content-type detection
// ---------------------------------------------------------------------------

#[test]
fn detects_event_stream_content_type() {
    assert!(is_event_stream("text/event-stream"));
    assert!(is_event_stream("text/event-stream; charset=utf-8"));
    assert!(is_event_stream("Text/Event-Stream"));
    assert!(!is_event_stream("application/json"));
    assert!(!is_event_stream("text/plain"));
    assert!(!is_event_stream(""));
}

// ---------------------------------------------------------------------------
// Reader task
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reader_yields_records_in_order_then_done() {
    let reader = EventReader::spawn(
        body(vec!["data: a\n", "\ndata: b", "\n\n"]),
        StreamLimits::default(),
    );

    let items: Vec<ServerSentEvent> = collect(reader)
        .await
        .into_iter()
        .map(|r| r.expect("no stream errors"))
        .collect();

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].data.as_deref(), Some("a"));
    assert_eq!(items[1].data.as_deref(), Some("b"));
    assert!(items[2].is_done());
}

#[tokio::test]
async fn reader_on_empty_body_yields_single_done() {
    let reader = EventReader::spawn(body(vec![]), StreamLimits::default());
    let items = collect(reader).await;
    assert_eq!(items, vec![Ok(ServerSentEvent::done())]);
}

#[tokio::test]
async fn reader_stops_after_server_done() {
    let reader = EventReader::spawn(
        body(vec!["data: a\n\nevent: done\n\n", "data: late\n\n"]),
        StreamLimits::default(),
    );

    let items = collect(reader).await;
    assert_eq!(items.len(), 2);
    assert!(items[1].as_ref().unwrap().is_done());
}

#[tokio::test]
async fn reader_reports_transport_failure_last() {
    let (tx, rx) = channel_body();
    let reader = EventReader::spawn(rx, StreamLimits::default());

    tx.send(Ok(Bytes::from("data: a\n\n"))).await.unwrap();
    tx.send(Err("connection reset".to_string())).await.unwrap();
    drop(tx);

    let items = collect(reader).await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().data.as_deref(), Some("a"));
    assert_eq!(
        items[1],
        Err(StreamError::Transport("connection reset".to_string()))
    );
}

#[tokio::test]
async fn reader_reports_oversized_record() {
    let limits = StreamLimits {
        max_record_bytes: 8,
        channel_capacity: 4,
    };
    let reader = EventReader::spawn(body(vec!["data: way too long"]), limits);

    let items = collect(reader).await;
    assert_eq!(items, vec![Err(StreamError::RecordTooLarge { limit: 8 })]);
}

#[tokio::test]
async fn reader_forwards_records_completed_before_oversize() {
    let limits = StreamLimits {
        max_record_bytes: 8,
        channel_capacity: 4,
    };
    let reader = EventReader::spawn(body(vec!["data: a\n\ndata: way too long"]), limits);

    let items = collect(reader).await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().data.as_deref(), Some("a"));
    assert_eq!(items[1], Err(StreamError::RecordTooLarge { limit: 8 }));
}

#[tokio::test]
async fn reader_delivers_records_before_body_ends() {
    let (tx, rx) = channel_body();
    let mut reader = EventReader::spawn(rx, StreamLimits::default());

    tx.send(Ok(Bytes::from("data: early\n\n"))).await.unwrap();

    let first = time::timeout(Duration::from_secs(1), reader.next())
        .await
        .expect("record should arrive while the body is still open")
        .expect("stream should not be finished");
    assert_eq!(first.unwrap().data.as_deref(), Some("early"));

    drop(tx);
    let rest = collect(reader).await;
    assert_eq!(rest, vec![Ok(ServerSentEvent::done())]);
}

#[tokio::test]
async fn abort_ends_the_stream_without_done() {
    let (tx, rx) = channel_body();
    let mut reader = EventReader::spawn(rx, StreamLimits::default());

    tx.send(Ok(Bytes::from("data: a\n\n"))).await.unwrap();
    let first = reader.next().await.unwrap().unwrap();
    assert_eq!(first.data.as_deref(), Some("a"));

    reader.abort();

    let next = time::timeout(Duration::from_secs(1), reader.next())
        .await
        .expect("aborted reader should end promptly");
    assert_eq!(next, None);
    // The body was still open; only the abort ended the stream.
    drop(tx);
}
