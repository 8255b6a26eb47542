// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

// Raw YAML deserialization types (internal)
//
// Kept apart from the public `Config` so interpolation and validation
// happen between the two, and defaults live in one place (the loader).

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub modu: String,
    pub server: RawServerConfig,
    pub stream: Option<RawStreamConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawServerConfig {
    pub base_url: String,
    pub chat_path: Option<String>,
    pub token: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawStreamConfig {
    pub max_record_bytes: Option<usize>,
    pub channel_capacity: Option<usize>,
}
