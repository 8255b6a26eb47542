// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use super::error::ConfigError;

/// Supplies the raw `modu.yaml` text.
pub trait ConfigSource {
    fn load(&self) -> Result<String, ConfigError>;
}

/// `modu.yaml` on disk. Read errors name the path.
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<String, ConfigError> {
        std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })
    }
}

/// Inline YAML text.
pub struct StringSource {
    pub content: String,
}

impl From<&str> for StringSource {
    fn from(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }
}

impl ConfigSource for StringSource {
    fn load(&self) -> Result<String, ConfigError> {
        Ok(self.content.clone())
    }
}
