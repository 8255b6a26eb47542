// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

use super::error::ConfigError;

/// Replace every `${NAME}` in `input` with the value of environment
/// variable `NAME`.
///
/// An unterminated `${` or an empty name is copied through literally.
/// A well-formed reference to an unset variable is an error, so a missing
/// token never silently becomes an empty header.
pub fn resolve_variables(input: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(0) | None => {
                out.push_str("${");
                rest = after;
            }
            Some(end) => {
                let name = &after[..end];
                let value = std::env::var(name).map_err(|_| ConfigError::UndefinedVariable {
                    name: name.to_string(),
                })?;
                out.push_str(&value);
                rest = &after[end + 1..];
            }
        }
    }
    out.push_str(rest);

    Ok(out)
}
