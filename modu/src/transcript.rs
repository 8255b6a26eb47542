// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

// Conversation transcript and the reducer that builds it
//
// A transcript is an ordered list of turns. Each turn is one sender's
// message, made of ordered content blocks (sections). Streamed
// `MessageEvent`s are folded in with `Transcript::reduce`, a pure
// `(state, event) -> state` step:
// - unseen message_uid          -> new turn
// - section_uid differs from the turn's last block -> new block
// - section_uid matches         -> text appended to the last block
// Events apply in arrival order. There is no deduplication and no
// reordering.

use crate::message::{MessageBlock, MessageEvent, Sender};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Transcript types
// ---------------------------------------------------------------------------

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageContent {
    pub message_uid: String,
    pub sender: Sender,
    /// Content blocks in arrival order.
    pub blocks: Vec<MessageBlock>,
    /// Set once the stream carrying this turn reported `done`.
    /// A finished turn is never mutated again.
    pub finished: bool,
}

impl MessageContent {
    /// Start a turn from its first event.
    pub fn new(message_uid: impl Into<String>, sender: Sender, first: MessageBlock) -> Self {
        Self {
            message_uid: message_uid.into(),
            sender,
            blocks: vec![first],
            finished: false,
        }
    }

    /// All block content concatenated in order.
    pub fn text(&self) -> String {
        self.blocks.iter().map(|b| b.content.as_str()).collect()
    }
}

/// The ordered turns of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    conversation_uid: Option<String>,
    turns: Vec<MessageContent>,
}

/// What a single `reduce` step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    NewTurn,
    NewSection,
    Appended,
    /// The event targeted a finished turn and was dropped.
    Ignored,
}

/// Outcome of one `reduce` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub change: Change,
    /// Index of the turn the event was applied to.
    pub turn_index: usize,
    /// The new conversation id, when the event moved the transcript to one.
    pub conversation_switched: Option<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conversation(conversation_uid: impl Into<String>) -> Self {
        Self {
            conversation_uid: Some(conversation_uid.into()),
            turns: Vec::new(),
        }
    }

    pub fn conversation_uid(&self) -> Option<&str> {
        self.conversation_uid.as_deref()
    }

    pub fn turns(&self) -> &[MessageContent] {
        &self.turns
    }

    pub fn last(&self) -> Option<&MessageContent> {
        self.turns.last()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Fold one streamed event into the transcript.
    ///
    /// An event aimed at a finished turn leaves the transcript untouched,
    /// conversation id included.
    pub fn reduce(mut self, event: MessageEvent) -> (Self, Reduction) {
        let MessageEvent {
            conversation_uid,
            message_uid,
            sender,
            message,
        } = event;

        let existing = self
            .turns
            .iter()
            .rposition(|turn| turn.message_uid == message_uid);

        if let Some(index) = existing.filter(|&i| self.turns[i].finished) {
            tracing::warn!(
                message_uid = %message_uid,
                section_uid = %message.section_uid,
                "event for finished message dropped"
            );
            let reduction = Reduction {
                change: Change::Ignored,
                turn_index: index,
                conversation_switched: None,
            };
            return (self, reduction);
        }

        let conversation_switched = match conversation_uid {
            Some(uid) if self.conversation_uid.as_deref() != Some(uid.as_str()) => {
                tracing::debug!(
                    from = ?self.conversation_uid,
                    to = %uid,
                    "conversation id changed"
                );
                self.conversation_uid = Some(uid.clone());
                Some(uid)
            }
            _ => None,
        };

        let (change, turn_index) = match existing {
            None => {
                self.turns
                    .push(MessageContent::new(message_uid, sender, message));
                (Change::NewTurn, self.turns.len() - 1)
            }
            Some(index) => (append_block(&mut self.turns[index], message), index),
        };

        (
            self,
            Reduction {
                change,
                turn_index,
                conversation_switched,
            },
        )
    }

    /// Fold a sequence of events, in order.
    pub fn fold(self, events: impl IntoIterator<Item = MessageEvent>) -> Self {
        events
            .into_iter()
            .fold(self, |transcript, event| transcript.reduce(event).0)
    }

    /// Append a complete turn that did not arrive as a stream.
    pub fn push_turn(mut self, turn: MessageContent) -> Self {
        self.turns.push(turn);
        self
    }

    /// Mark every open turn finished. Called when the stream reports `done`.
    pub fn finish(mut self) -> Self {
        for turn in self.turns.iter_mut().filter(|t| !t.finished) {
            turn.finished = true;
        }
        self
    }
}

fn append_block(turn: &mut MessageContent, block: MessageBlock) -> Change {
    match turn.blocks.last_mut() {
        Some(last) if last.section_uid == block.section_uid => {
            last.content.push_str(&block.content);
            Change::Appended
        }
        _ => {
            turn.blocks.push(block);
            Change::NewSection
        }
    }
}
