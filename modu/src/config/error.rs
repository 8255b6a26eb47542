// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Errors raised while loading `modu.yaml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse modu.yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value parsed but is not usable. `field` is the dotted YAML path.
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("undefined variable ${{{name}}} in config (not set in environment)")]
    UndefinedVariable { name: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
