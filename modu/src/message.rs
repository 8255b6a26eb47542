// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

// Message events carried by the chat stream
//
// The backend sends one `MessageEvent` per `message` record, JSON-encoded
// in the `data:` field. Each event names its conversation, its sender, the
// message it belongs to, and one content block tagged with a section id.
// `decode` turns a parsed SSE record into a `StreamUpdate` the transcript
// reducer can act on.

use crate::sse::{EventKind, ServerSentEvent};
use serde::{Deserialize, Serialize};

/// The role of a message sender.
///
/// Roles this client does not know decode as `Unknown` rather than failing
/// the whole message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Assistant,
    System,
    #[serde(other)]
    Unknown,
}

/// Who produced a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl Sender {
    pub fn new(uid: impl Into<String>, role: Role) -> Self {
        Self {
            uid: uid.into(),
            name: None,
            avatar: None,
            role,
        }
    }
}

/// What a content block holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[default]
    Text,
    /// Model reasoning shown separately from the answer.
    Thinking,
    #[serde(other)]
    Other,
}

/// One section of a message's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBlock {
    pub section_uid: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub block_type: BlockType,
}

impl MessageBlock {
    pub fn text(section_uid: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            section_uid: section_uid.into(),
            content: content.into(),
            block_type: BlockType::Text,
        }
    }
}

/// A single streamed message fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_uid: Option<String>,
    pub message_uid: String,
    #[serde(default)]
    pub sender: Sender,
    pub message: MessageBlock,
}

impl MessageEvent {
    /// An assistant text fragment, the common case on the wire.
    pub fn text(
        conversation_uid: impl Into<String>,
        message_uid: impl Into<String>,
        section_uid: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            conversation_uid: Some(conversation_uid.into()),
            message_uid: message_uid.into(),
            sender: Sender::default(),
            message: MessageBlock::text(section_uid, content),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// What a parsed SSE record means to the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    /// A message fragment to fold into the transcript.
    Message(MessageEvent),
    /// The stream is complete.
    Done,
    /// The server reported a failure; the text is meant for the user.
    Error(String),
    /// A record with an event name the client does not handle.
    Ignored(String),
}

/// Errors that can occur while decoding a record payload.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("message record has no data payload")]
    MissingData,

    #[error("message payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode one parsed record.
///
/// Records without an `event:` field are treated as `message` records.
/// Malformed message payloads are reported, never skipped.
pub fn decode(record: &ServerSentEvent) -> Result<StreamUpdate, DecodeError> {
    match record.event.as_ref().unwrap_or(&EventKind::Message) {
        EventKind::Done => Ok(StreamUpdate::Done),
        EventKind::Error => Ok(StreamUpdate::Error(error_text(record.data.as_deref()))),
        EventKind::Message => {
            let data = record.data.as_deref().ok_or(DecodeError::MissingData)?;
            Ok(StreamUpdate::Message(serde_json::from_str(data)?))
        }
        EventKind::Other(name) => Ok(StreamUpdate::Ignored(name.clone())),
    }
}

/// Pull a human-readable message out of an `error` record payload.
///
/// Accepts `{"message": ".."}`, `{"error": ".."}` and
/// `{"error": {"message": ".."}}`; anything else is shown verbatim.
pub(crate) fn error_text(data: Option<&str>) -> String {
    let Some(data) = data.map(str::trim).filter(|d| !d.is_empty()) else {
        return "unknown stream error".to_string();
    };

    let Ok(json) = serde_json::from_str::<serde_json::Value>(data) else {
        return data.to_string();
    };

    json.get("message")
        .and_then(|m| m.as_str())
        .or_else(|| json.get("error").and_then(|e| e.as_str()))
        .or_else(|| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
        })
        .map(str::to_string)
        .unwrap_or_else(|| data.to_string())
}
