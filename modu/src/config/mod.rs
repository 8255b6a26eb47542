// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

// Client configuration
//
// Loads modu.yaml, resolves `${VAR}` interpolation, validates the server
// endpoint and stream limits, and fills in defaults.

mod error;
mod interpolation;
mod loader;
mod raw;
mod source;
mod types;

pub use error::ConfigError;
pub use interpolation::resolve_variables;
pub use loader::load_config;
pub use source::{ConfigSource, FileSource, StringSource};
pub use types::{Config, ServerConfig, DEFAULT_CHAT_PATH};
