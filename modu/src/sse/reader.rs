// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

// Stream reader
//
// Drives an `EventParser` over a response body on a background task and
// hands the parsed records to the consumer through a bounded channel.
// The consumer sees a lazy, finite stream that ends right after `done`.

use super::parser::EventParser;
use super::types::{ServerSentEvent, StreamError, StreamLimits};
use bytes::Bytes;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};

type Item = Result<ServerSentEvent, StreamError>;

/// Async stream of parsed records backed by a reader task.
///
/// Dropping the reader, or calling [`abort`](Self::abort), tears the task
/// down together with the underlying body. Records already delivered are
/// not rolled back.
pub struct EventReader {
    rx: ReceiverStream<Item>,
    task: JoinHandle<()>,
}

impl EventReader {
    /// Start reading `body` on a new tokio task.
    ///
    /// Guarantees for the produced stream:
    /// - records arrive in body order, independent of chunk boundaries;
    /// - exactly one `done` record is yielded, after every data record,
    ///   and nothing follows it;
    /// - a transport failure or an oversized record is yielded as the last
    ///   item, in place of `done`.
    pub fn spawn<S, E>(body: S, limits: StreamLimits) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin + Send + 'static,
        E: Display + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Item>(limits.channel_capacity.max(1));
        let task = tokio::spawn(read_body(body, limits, tx));
        Self {
            rx: ReceiverStream::new(rx),
            task,
        }
    }

    /// Stop reading. The stream ends after whatever is already buffered.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Stream for EventReader {
    type Item = Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

impl std::fmt::Debug for EventReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventReader")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Reader task
// ---------------------------------------------------------------------------

async fn read_body<S, E>(mut body: S, limits: StreamLimits, tx: mpsc::Sender<Item>)
where
    S: Stream<Item = Result<Bytes, E>> + Unpin + Send + 'static,
    E: Display + Send + 'static,
{
    let mut parser = EventParser::new(limits.max_record_bytes);
    let mut forwarded = 0usize;

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(error = %e, forwarded, "stream body failed");
                let _ = tx.send(Err(StreamError::Transport(e.to_string()))).await;
                return;
            }
        };

        let mut records = Vec::new();
        let overflow = parser.push(&chunk, &mut records).err();

        for record in records {
            let done = record.is_done();
            if tx.send(Ok(record)).await.is_err() {
                return; // Consumer went away
            }
            forwarded += 1;
            if done {
                tracing::debug!(forwarded, "done record received, closing stream");
                return;
            }
        }

        if let Some(e) = overflow {
            tracing::warn!(error = %e, forwarded, "stream aborted");
            let _ = tx.send(Err(e)).await;
            return;
        }
    }

    for record in parser.finish() {
        if tx.send(Ok(record)).await.is_err() {
            return;
        }
        forwarded += 1;
    }
    tracing::debug!(forwarded, "stream body ended");
}
