// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declarative schema input.
//!
//! A [`FileSchema`] carries the same information as a protobuf
//! `FileDescriptorProto`: package, message definitions with numbered and
//! typed fields, nested types and the map-entry marker. It is plain data and
//! can be written by hand, assembled with the [builders](crate::builder) or
//! loaded from JSON/YAML:
//!
//! ```yaml
//! name: example.proto
//! package: example
//! messages:
//!   - name: Foo
//!     fields:
//!       - { name: id, number: 1, type: int32 }
//!       - { name: title, number: 2, type: string }
//!   - name: Bar
//!     fields:
//!       - name: bar_map
//!         number: 1
//!         map: { key: string, value: message, value_type_name: Foo }
//! ```
//!
//! Nothing here is validated; [`build_file`](crate::build_file) does that.

use crate::config::{load_document, ConfigError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Only proto3 files are accepted.
pub const PROTO3: &str = "proto3";

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    /// Embedded message, `type_name` required.
    Message,
    /// Enumeration, `type_name` required.
    Enum,
}

impl FieldType {
    /// Name as written in a `.proto` file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Sint32 => "sint32",
            Self::Sint64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::Sfixed32 => "sfixed32",
            Self::Sfixed64 => "sfixed64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Message => "message",
            Self::Enum => "enum",
        }
    }

    /// True when the type needs a `type_name` reference.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Message | Self::Enum)
    }

    /// Scalar numeric types (and enums) may use packed repeated encoding.
    pub fn is_packable(&self) -> bool {
        !matches!(self, Self::String | Self::Bytes | Self::Message)
    }

    /// Integral and string types may key a map.
    pub fn is_valid_map_key(&self) -> bool {
        !matches!(
            self,
            Self::Double | Self::Float | Self::Bytes | Self::Message | Self::Enum
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldLabel {
    #[default]
    Optional,
    Repeated,
}

/// Shorthand for a map field; the registry synthesizes the entry message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSchema {
    /// Key type (integral, bool or string).
    pub key: FieldType,
    /// Value type (anything but another map).
    pub value: FieldType,
    /// Referenced type when `value` is `message` or `enum`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type_name: Option<String>,
}

/// A field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub number: u32,
    /// Defaults to the lowerCamelCase form of `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
    /// May be omitted for map shorthand fields.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub label: FieldLabel,
    /// Relative (`Foo`, `Outer.Inner`) or fully qualified (`.pkg.Foo`) name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Overrides the proto3 default (packed) for repeated scalar fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<MapSchema>,
}

impl FieldSchema {
    /// Singular field of the given type.
    pub fn new(name: impl Into<String>, number: u32, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            number,
            json_name: None,
            field_type: Some(field_type),
            label: FieldLabel::Optional,
            type_name: None,
            packed: None,
            map: None,
        }
    }

    /// Mark as repeated.
    pub fn repeated(mut self) -> Self {
        self.label = FieldLabel::Repeated;
        self
    }

    /// Set the referenced message or enum name.
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Override the JSON name.
    pub fn with_json_name(mut self, json_name: impl Into<String>) -> Self {
        self.json_name = Some(json_name.into());
        self
    }

    /// Force packed or unpacked encoding.
    pub fn with_packed(mut self, packed: bool) -> Self {
        self.packed = Some(packed);
        self
    }
}

/// A message definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSchema {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_messages: Vec<MessageSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_enums: Vec<EnumSchema>,
    /// `MessageOptions.map_entry`: the message is a synthesized key/value pair.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub map_entry: bool,
}

impl MessageSchema {
    /// Empty message definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            map_entry: false,
        }
    }
}

/// One enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueSchema {
    pub name: String,
    pub number: i32,
}

/// An enum definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumSchema {
    pub name: String,
    #[serde(default)]
    pub values: Vec<EnumValueSchema>,
}

/// A whole `.proto` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSchema {
    #[serde(default = "default_file_name")]
    pub name: String,
    #[serde(default)]
    pub package: String,
    #[serde(default = "default_syntax")]
    pub syntax: String,
    /// Names of files (already in the registry) whose types may be referenced.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub messages: Vec<MessageSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumSchema>,
}

fn default_file_name() -> String {
    "dynamic.proto".to_string()
}

fn default_syntax() -> String {
    PROTO3.to_string()
}

impl FileSchema {
    /// Empty proto3 file.
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            syntax: default_syntax(),
            dependencies: Vec::new(),
            messages: Vec::new(),
            enums: Vec::new(),
        }
    }

    /// Load a schema from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_document(path)
    }

    /// Parse a JSON schema document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a YAML schema document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
