// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

use crate::sse::StreamLimits;

use super::error::ConfigError;
use super::interpolation::resolve_variables;
use super::raw;
use super::source::ConfigSource;
use super::types::{Config, ServerConfig, DEFAULT_CHAT_PATH};

/// Load and validate a modu config from the given source.
///
/// Steps:
/// 1. Read raw YAML from source
/// 2. Parse YAML into raw deserialization types
/// 3. Validate the version
/// 4. Resolve `${VAR}` interpolation in server strings
/// 5. Validate URLs, paths and limits, apply defaults
pub fn load_config(source: &dyn ConfigSource) -> Result<Config, ConfigError> {
    let raw_yaml = source.load()?;
    let raw: raw::RawConfig = serde_yaml::from_str(&raw_yaml)?;

    if raw.modu != "v1" {
        return Err(ConfigError::invalid(
            "modu",
            format!(
                "unsupported config version \"{}\", expected \"v1\"",
                raw.modu
            ),
        ));
    }

    let server = build_server_config(raw.server)?;
    let stream = build_stream_limits(raw.stream)?;

    Ok(Config {
        version: raw.modu,
        server,
        stream,
    })
}

fn build_server_config(raw: raw::RawServerConfig) -> Result<ServerConfig, ConfigError> {
    let base_url = resolve_variables(&raw.base_url)?;
    let base_url = base_url.trim().trim_end_matches('/').to_string();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::invalid(
            "server.base_url",
            format!("must start with http:// or https://, got \"{base_url}\""),
        ));
    }

    let chat_path = match raw.chat_path {
        Some(path) => resolve_variables(&path)?,
        None => DEFAULT_CHAT_PATH.to_string(),
    };
    if !chat_path.starts_with('/') {
        return Err(ConfigError::invalid(
            "server.chat_path",
            format!("must start with '/', got \"{chat_path}\""),
        ));
    }

    let token = raw
        .token
        .map(|t| resolve_variables(&t))
        .transpose()?
        .filter(|t| !t.trim().is_empty());

    if raw.timeout_ms == Some(0) {
        return Err(ConfigError::invalid("server.timeout_ms", "must be greater than 0"));
    }

    Ok(ServerConfig {
        base_url,
        chat_path,
        token,
        timeout_ms: raw.timeout_ms,
    })
}

fn build_stream_limits(raw: Option<raw::RawStreamConfig>) -> Result<StreamLimits, ConfigError> {
    let defaults = StreamLimits::default();
    let Some(raw) = raw else {
        return Ok(defaults);
    };

    let max_record_bytes = raw.max_record_bytes.unwrap_or(defaults.max_record_bytes);
    if max_record_bytes == 0 {
        return Err(ConfigError::invalid("stream.max_record_bytes", "must be greater than 0"));
    }

    let channel_capacity = raw.channel_capacity.unwrap_or(defaults.channel_capacity);
    if channel_capacity == 0 {
        return Err(ConfigError::invalid("stream.channel_capacity", "must be greater than 0"));
    }

    Ok(StreamLimits {
        max_record_bytes,
        channel_capacity,
    })
}
