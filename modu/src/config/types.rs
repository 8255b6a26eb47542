// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

use crate::sse::StreamLimits;

/// Chat endpoint used when `server.chat_path` is not set.
pub const DEFAULT_CHAT_PATH: &str = "/api/v1/chat";

/// Parsed and validated `modu.yaml`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Config format version. Always "v1".
    pub version: String,
    pub server: ServerConfig,
    pub stream: StreamLimits,
}

/// Where and how to reach the chat backend.
#[derive(Clone, PartialEq)]
pub struct ServerConfig {
    /// Scheme and host, optionally with a path prefix. No trailing slash.
    pub base_url: String,
    /// Path of the streaming chat endpoint, starting with `/`.
    pub chat_path: String,
    /// Bearer token sent as `Authorization`, if any.
    pub token: Option<String>,
    /// Whole-request timeout. `None` waits as long as the stream runs.
    pub timeout_ms: Option<u64>,
}

impl ServerConfig {
    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_url, self.chat_path)
    }
}

// Hand-written so the token never ends up in logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("base_url", &self.base_url)
            .field("chat_path", &self.chat_path)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
