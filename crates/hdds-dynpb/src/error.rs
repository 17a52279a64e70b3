// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for schema building, message access and wire encoding.

use thiserror::Error;

/// Errors raised while turning a [`FileSchema`](crate::FileSchema) into a
/// descriptor graph. Always fatal for the build call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("invalid identifier '{0}'")]
    InvalidName(String),

    #[error("duplicate type name '{0}'")]
    DuplicateTypeName(String),

    #[error("duplicate file '{0}' in registry")]
    DuplicateFile(String),

    #[error("file '{file}' depends on unknown file '{dependency}'")]
    UnknownDependency { file: String, dependency: String },

    #[error("field '{field}': number {number} is out of range or reserved")]
    InvalidFieldNumber { field: String, number: u32 },

    #[error("message '{message}': field number {number} used more than once")]
    DuplicateFieldNumber { message: String, number: u32 },

    #[error("message '{message}': field name '{field}' used more than once")]
    DuplicateFieldName { message: String, field: String },

    #[error("field '{field}': no type given")]
    MissingFieldType { field: String },

    #[error("field '{field}': {reason}")]
    InvalidFieldOption { field: String, reason: String },

    #[error("field '{field}': type_name is required for message and enum fields")]
    MissingTypeName { field: String },

    #[error("field '{field}': type_name '{type_name}' given for a scalar field")]
    UnexpectedTypeName { field: String, type_name: String },

    #[error("field '{field}': cannot resolve type '{type_name}'")]
    UnresolvedType { field: String, type_name: String },

    #[error("field '{field}': '{type_name}' is not {expected}")]
    WrongTypeKind {
        field: String,
        type_name: String,
        expected: &'static str,
    },

    #[error("map entry '{message}': {reason}")]
    InvalidMapEntry { message: String, reason: String },

    #[error("map field '{field}': {reason}")]
    InvalidMapField { field: String, reason: String },

    #[error("enum '{name}': {reason}")]
    InvalidEnum { name: String, reason: String },

    #[error("unsupported syntax '{0}' (only proto3 is supported)")]
    UnsupportedSyntax(String),
}

/// Errors raised by [`DynamicMessage`](crate::DynamicMessage),
/// [`List`](crate::List) and [`Map`](crate::Map) accessors.
///
/// A failing call never alters the state of the container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("message '{message}' has no field '{field}'")]
    UnknownField { message: String, field: String },

    #[error("type mismatch for '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    #[error("index out of bounds: {index} >= {length}")]
    IndexOutOfBounds { index: usize, length: usize },
}

/// Errors raised by the wire codec.
///
/// A failed decode may leave the destination message partially populated;
/// callers must discard it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("truncated input: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("varint overflow (more than 10 bytes or bits beyond u64)")]
    VarintOverflow,

    #[error("invalid wire type {wire_type} in tag for field {field_number}")]
    InvalidWireType { wire_type: u8, field_number: u32 },

    #[error("invalid field number {0} in tag")]
    InvalidFieldNumber(u64),

    #[error("field '{field}' holds invalid UTF-8")]
    InvalidUtf8 { field: String },

    #[error("recursion limit of {0} exceeded")]
    RecursionLimitExceeded(u32),

    #[error("message '{message}' has no field number {number}")]
    UnknownFieldNumber { message: String, number: u32 },

    #[error("{what} of {value} bytes exceeds the limit of {max}")]
    ValueRange { what: &'static str, value: usize, max: usize },

    #[error("invalid codec options: {0}")]
    InvalidOptions(String),

    #[error(transparent)]
    Message(#[from] MessageError),
}

impl WireError {
    /// True for errors caused by a truncated or corrupt byte stream.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. }
                | Self::Malformed(_)
                | Self::VarintOverflow
                | Self::InvalidWireType { .. }
                | Self::InvalidFieldNumber(_)
                | Self::InvalidUtf8 { .. }
                | Self::RecursionLimitExceeded(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_classification() {
        assert!(WireError::Truncated { need: 4, have: 1 }.is_format_error());
        assert!(WireError::VarintOverflow.is_format_error());
        assert!(!WireError::ValueRange {
            what: "message",
            value: 10,
            max: 5
        }
        .is_format_error());
        assert!(!WireError::UnknownFieldNumber {
            message: "example.Foo".into(),
            number: 9
        }
        .is_format_error());
    }

    #[test]
    fn test_display() {
        let err = MessageError::IndexOutOfBounds {
            index: 3,
            length: 3,
        };
        assert_eq!(err.to_string(), "index out of bounds: 3 >= 3");

        let err = SchemaError::UnresolvedType {
            field: "example.Bar.foo".into(),
            type_name: ".example.Missing".into(),
        };
        assert!(err.to_string().contains(".example.Missing"));
    }
}
