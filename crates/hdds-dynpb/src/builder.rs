// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for schema definitions.

use crate::schema::{
    EnumSchema, EnumValueSchema, FieldSchema, FieldType, FileSchema, MapSchema, MessageSchema,
};

/// Builder for a [`FileSchema`].
#[derive(Debug)]
pub struct FileSchemaBuilder {
    schema: FileSchema,
}

impl FileSchemaBuilder {
    /// Create a new builder for a proto3 file.
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            schema: FileSchema::new(name, package),
        }
    }

    /// Add a top-level message.
    pub fn message(mut self, message: MessageSchema) -> Self {
        self.schema.messages.push(message);
        self
    }

    /// Add a top-level enum.
    pub fn enum_type(mut self, enum_schema: EnumSchema) -> Self {
        self.schema.enums.push(enum_schema);
        self
    }

    /// Declare a dependency on another registered file.
    pub fn dependency(mut self, file_name: impl Into<String>) -> Self {
        self.schema.dependencies.push(file_name.into());
        self
    }

    /// Build the FileSchema.
    pub fn build(self) -> FileSchema {
        self.schema
    }
}

/// Builder for a [`MessageSchema`].
#[derive(Debug)]
pub struct MessageSchemaBuilder {
    message: MessageSchema,
}

impl MessageSchemaBuilder {
    /// Create a new builder for a message type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            message: MessageSchema::new(name),
        }
    }

    /// Add a singular scalar field.
    pub fn field(mut self, name: impl Into<String>, number: u32, field_type: FieldType) -> Self {
        self.message
            .fields
            .push(FieldSchema::new(name, number, field_type));
        self
    }

    /// Add a string field.
    pub fn string_field(self, name: impl Into<String>, number: u32) -> Self {
        self.field(name, number, FieldType::String)
    }

    /// Add a repeated scalar field.
    pub fn repeated_field(
        mut self,
        name: impl Into<String>,
        number: u32,
        field_type: FieldType,
    ) -> Self {
        self.message
            .fields
            .push(FieldSchema::new(name, number, field_type).repeated());
        self
    }

    /// Add a singular message field.
    pub fn message_field(
        mut self,
        name: impl Into<String>,
        number: u32,
        type_name: impl Into<String>,
    ) -> Self {
        self.message
            .fields
            .push(FieldSchema::new(name, number, FieldType::Message).with_type_name(type_name));
        self
    }

    /// Add a repeated message field.
    pub fn repeated_message_field(
        mut self,
        name: impl Into<String>,
        number: u32,
        type_name: impl Into<String>,
    ) -> Self {
        self.message.fields.push(
            FieldSchema::new(name, number, FieldType::Message)
                .repeated()
                .with_type_name(type_name),
        );
        self
    }

    /// Add a singular enum field.
    pub fn enum_field(
        mut self,
        name: impl Into<String>,
        number: u32,
        type_name: impl Into<String>,
    ) -> Self {
        self.message
            .fields
            .push(FieldSchema::new(name, number, FieldType::Enum).with_type_name(type_name));
        self
    }

    /// Add a map field with scalar values.
    pub fn map_field(
        self,
        name: impl Into<String>,
        number: u32,
        key: FieldType,
        value: FieldType,
    ) -> Self {
        self.push_map(name.into(), number, key, value, None)
    }

    /// Add a map field whose values are messages or enums.
    pub fn map_field_with_type(
        self,
        name: impl Into<String>,
        number: u32,
        key: FieldType,
        value: FieldType,
        value_type_name: impl Into<String>,
    ) -> Self {
        self.push_map(name.into(), number, key, value, Some(value_type_name.into()))
    }

    fn push_map(
        mut self,
        name: String,
        number: u32,
        key: FieldType,
        value: FieldType,
        value_type_name: Option<String>,
    ) -> Self {
        self.message.fields.push(FieldSchema {
            name,
            number,
            json_name: None,
            field_type: None,
            label: Default::default(),
            type_name: None,
            packed: None,
            map: Some(MapSchema {
                key,
                value,
                value_type_name,
            }),
        });
        self
    }

    /// Add a fully specified field.
    pub fn field_schema(mut self, field: FieldSchema) -> Self {
        self.message.fields.push(field);
        self
    }

    /// Add a nested message.
    pub fn nested(mut self, nested: MessageSchema) -> Self {
        self.message.nested_messages.push(nested);
        self
    }

    /// Add a nested enum.
    pub fn nested_enum(mut self, nested: EnumSchema) -> Self {
        self.message.nested_enums.push(nested);
        self
    }

    /// Mark the message as a map entry.
    pub fn map_entry(mut self) -> Self {
        self.message.map_entry = true;
        self
    }

    /// Build the MessageSchema.
    pub fn build(self) -> MessageSchema {
        self.message
    }
}

/// Builder for an [`EnumSchema`].
#[derive(Debug)]
pub struct EnumSchemaBuilder {
    name: String,
    values: Vec<EnumValueSchema>,
    next_number: i32,
}

impl EnumSchemaBuilder {
    /// Create a new enum builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            next_number: 0,
        }
    }

    /// Add a value with auto-incrementing number.
    pub fn value(mut self, name: impl Into<String>) -> Self {
        self.values.push(EnumValueSchema {
            name: name.into(),
            number: self.next_number,
        });
        self.next_number = self.next_number.saturating_add(1);
        self
    }

    /// Add a value with explicit number.
    pub fn value_number(mut self, name: impl Into<String>, number: i32) -> Self {
        self.values.push(EnumValueSchema {
            name: name.into(),
            number,
        });
        self.next_number = number.saturating_add(1);
        self
    }

    /// Build the EnumSchema.
    pub fn build(self) -> EnumSchema {
        EnumSchema {
            name: self.name,
            values: self.values,
        }
    }
}
