// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec configuration.
//!
//! Supports both programmatic and file-based configuration. Files are
//! selected by extension: `.json`, `.yaml` or `.yml`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Protobuf caps any length-delimited payload at 2 GiB - 1.
pub const MAX_MESSAGE_SIZE: usize = i32::MAX as usize;

/// Default nesting depth accepted by the decoder.
pub const DEFAULT_RECURSION_LIMIT: u32 = 100;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported file extension: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// What the decoder does with field numbers absent from the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Keep the raw tag and payload on the message, re-emit them on encode.
    #[default]
    Preserve,
    /// Skip the payload using the wire type's length rule.
    Discard,
    /// Fail the decode with `WireError::UnknownFieldNumber`.
    Reject,
}

/// Options shared by encode and decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecOptions {
    /// Unknown field handling on decode.
    #[serde(default)]
    pub unknown_fields: UnknownFieldPolicy,

    /// Emit packable repeated fields in packed form.
    #[serde(default = "default_true")]
    pub pack_repeated: bool,

    /// Maximum message nesting depth on decode.
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: u32,

    /// Upper bound for a whole message or any length-delimited payload.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,

    /// Reject string fields that are not valid UTF-8.
    #[serde(default = "default_true")]
    pub validate_utf8: bool,
}

fn default_true() -> bool {
    true
}

fn default_recursion_limit() -> u32 {
    DEFAULT_RECURSION_LIMIT
}

fn default_max_message_size() -> usize {
    MAX_MESSAGE_SIZE
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFieldPolicy::default(),
            pack_repeated: true,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            max_message_size: MAX_MESSAGE_SIZE,
            validate_utf8: true,
        }
    }
}

impl CodecOptions {
    /// Load options from a JSON or YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let options: Self = load_document(path)?;
        options.validate()?;
        Ok(options)
    }

    /// Parse options from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Parse options from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_yaml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Set the unknown field policy.
    pub fn unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    /// Enable or disable packed encoding.
    pub fn pack_repeated(mut self, enabled: bool) -> Self {
        self.pack_repeated = enabled;
        self
    }

    /// Set the decode nesting limit.
    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Set the payload size limit.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recursion_limit == 0 {
            return Err(ConfigError::Invalid(
                "recursion_limit must be greater than zero".into(),
            ));
        }
        if self.max_message_size == 0 || self.max_message_size > MAX_MESSAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "max_message_size must be in 1..={}",
                MAX_MESSAGE_SIZE
            )));
        }
        Ok(())
    }
}

/// Read a serde document, picking the parser from the file extension.
pub(crate) fn load_document<T: DeserializeOwned, P: AsRef<Path>>(
    path: P,
) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let content = std::fs::read_to_string(path)?;
    match extension.as_str() {
        "json" => Ok(serde_json::from_str(&content)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
        _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
    }
}
