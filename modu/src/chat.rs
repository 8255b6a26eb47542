// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

// Conversation driver
//
// Ties the pieces together for one conversation: sends the user's
// message, consumes the response records in arrival order, folds message
// events into the transcript, finalizes it on `done`, and surfaces
// server-reported failures as user-facing notices.

use crate::client::{ChatClient, ChatRequest, ChatResponse, ClientError, ResponseBody};
use crate::message::{decode, error_text, DecodeError, MessageBlock, Role, Sender, StreamUpdate};
use crate::sse::{ServerSentEvent, StreamError};
use crate::transcript::{Change, MessageContent, Transcript};
use futures_util::{Stream, StreamExt};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A message meant for the person using the client, not for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Receives user-facing notices.
///
/// A UI would show a toast; the CLI writes them to the log.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Emits notices as log events.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Warning => tracing::warn!(notice = %notice.text, "notice"),
            NoticeLevel::Error => tracing::error!(notice = %notice.text, "notice"),
        }
    }
}

/// Keeps every notice in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

// ---------------------------------------------------------------------------
// Errors and summary
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Counters for one consumed response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Records read from the stream, `done` included.
    pub records: usize,
    /// Message events folded into the transcript.
    pub applied: usize,
    /// Message events dropped because their turn was already finished.
    pub dropped: usize,
    /// `error` records reported by the server.
    pub errors: usize,
    /// Whether the response ran to completion (`done` or a full text body).
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

pub struct Conversation {
    transcript: Transcript,
    bot_uid: Option<String>,
    notifier: Arc<dyn Notifier>,
}

impl Conversation {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_transcript(Transcript::new(), notifier)
    }

    pub fn with_transcript(transcript: Transcript, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            transcript,
            bot_uid: None,
            notifier,
        }
    }

    /// Address later messages to a specific bot.
    pub fn with_bot(mut self, bot_uid: impl Into<String>) -> Self {
        self.bot_uid = Some(bot_uid.into());
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Send `content` as the user and consume the reply.
    ///
    /// The user's turn is recorded once the server accepted the request.
    pub async fn send(
        &mut self,
        client: &ChatClient,
        content: impl Into<String>,
    ) -> Result<Summary, ChatError> {
        let content = content.into();
        let request = ChatRequest {
            conversation_uid: self.transcript.conversation_uid().map(str::to_string),
            bot_uid: self.bot_uid.clone(),
            content: content.clone(),
        };

        let response = client.send(&request).await.map_err(|e| {
            self.notifier.notify(Notice::error(e.to_string()));
            e
        })?;

        let user_turn = MessageContent {
            message_uid: response.request_id.clone(),
            sender: Sender::new("", Role::User),
            blocks: vec![MessageBlock::text("user", content)],
            finished: true,
        };
        self.transcript = std::mem::take(&mut self.transcript).push_turn(user_turn);

        self.consume_response(response).await
    }

    /// Consume a response from [`ChatClient::send`].
    pub async fn consume_response(&mut self, response: ChatResponse) -> Result<Summary, ChatError> {
        if let Some(notice) = &response.status_notice {
            self.notifier.notify(Notice::error(notice.clone()));
        }

        match response.body {
            ResponseBody::Events(reader) => self.consume(reader).await,
            ResponseBody::Text(text) => {
                if response.status.is_success() && !text.trim().is_empty() {
                    let turn = MessageContent {
                        message_uid: response.request_id,
                        sender: Sender::default(),
                        blocks: vec![MessageBlock::text("text", text)],
                        finished: true,
                    };
                    self.transcript = std::mem::take(&mut self.transcript).push_turn(turn);
                } else if !response.status.is_success() && !text.trim().is_empty() {
                    self.notifier.notify(Notice::error(error_text(Some(&text))));
                } else {
                    tracing::debug!(request_id = %response.request_id, "empty response body");
                }
                Ok(Summary {
                    completed: true,
                    ..Summary::default()
                })
            }
        }
    }

    /// Fold a stream of parsed records into the transcript.
    ///
    /// Stops at the first `done`, which finalizes every open turn. A stream
    /// failure is reported to the user and returned; a malformed message
    /// payload is returned as is. The transcript keeps whatever was applied
    /// before either.
    pub async fn consume<S>(&mut self, mut records: S) -> Result<Summary, ChatError>
    where
        S: Stream<Item = Result<ServerSentEvent, StreamError>> + Unpin,
    {
        let mut summary = Summary::default();

        while let Some(record) = records.next().await {
            let record = record.map_err(|e| {
                self.notifier.notify(Notice::error(e.to_string()));
                e
            })?;
            summary.records += 1;

            match decode(&record)? {
                StreamUpdate::Message(event) => {
                    let (transcript, reduction) =
                        std::mem::take(&mut self.transcript).reduce(event);
                    self.transcript = transcript;

                    if reduction.change == Change::Ignored {
                        summary.dropped += 1;
                        // Warn once per response.
                        if summary.dropped == 1 {
                            self.notifier.notify(Notice::warning(
                                "Ignored an update for a message that had already finished",
                            ));
                        }
                    } else {
                        summary.applied += 1;
                    }
                    if let Some(uid) = reduction.conversation_switched {
                        tracing::info!(conversation_uid = %uid, "conversation started");
                    }
                }
                StreamUpdate::Done => {
                    self.transcript = std::mem::take(&mut self.transcript).finish();
                    summary.completed = true;
                    break;
                }
                StreamUpdate::Error(text) => {
                    summary.errors += 1;
                    self.notifier.notify(Notice::error(text));
                }
                StreamUpdate::Ignored(event) => {
                    tracing::debug!(event = %event, "unhandled stream event");
                }
            }
        }

        tracing::debug!(
            records = summary.records,
            applied = summary.applied,
            dropped = summary.dropped,
            errors = summary.errors,
            completed = summary.completed,
            "stream consumed"
        );
        Ok(summary)
    }
}
