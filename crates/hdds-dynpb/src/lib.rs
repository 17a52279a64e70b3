// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # hdds-dynpb - Dynamic Protocol Buffers
//!
//! Define protobuf message schemas at run time, build and mutate messages
//! generically against them, and encode/decode the standard protobuf binary
//! wire format, with no generated code involved.
//!
//! # Features
//!
//! - **Schema input**: serde-friendly `FileSchema` (JSON/YAML) or fluent builders
//! - **Registry**: two-pass descriptor build with self/mutual references,
//!   nested types, enums, synthesized map entries and cross-file imports
//! - **DynamicMessage**: get/set/clear/range with proto3 implicit presence,
//!   field-bound `List` and `Map` containers
//! - **Wire codec**: byte-exact protobuf encoding, packed repeated fields,
//!   unknown-field preservation, merge semantics
//!
//! # Example
//!
//! ```rust
//! use hdds_dynpb::{build_file, marshal, unmarshal, new_message};
//! use hdds_dynpb::{FieldType, FileSchemaBuilder, MessageSchemaBuilder};
//!
//! let schema = FileSchemaBuilder::new("example.proto", "example")
//!     .message(
//!         MessageSchemaBuilder::new("Foo")
//!             .field("id", 1, FieldType::Int32)
//!             .string_field("title", 2)
//!             .build(),
//!     )
//!     .build();
//! let file = build_file(&schema).unwrap();
//! let foo = file.message_by_name("Foo").unwrap();
//!
//! let mut msg = new_message(&foo);
//! msg.set_by_name("id", 42).unwrap();
//! msg.set_by_name("title", "aloha").unwrap();
//!
//! let bytes = marshal(&msg).unwrap();
//! assert_eq!(bytes, b"\x08\x2a\x12\x05aloha");
//!
//! let decoded = unmarshal(&bytes, &foo).unwrap();
//! assert_eq!(decoded.get_by_name("title").unwrap().as_str(), Some("aloha"));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! FileSchema --build--> FileDescriptor (immutable arena, Arc-shared)
//!                            |
//!                 MessageDescriptor handles
//!                            |
//!     bytes <--codec--> DynamicMessage { field number -> Value }
//! ```

mod builder;
mod codec;
pub mod config;
mod descriptor;
mod error;
mod message;
mod registry;
mod schema;
mod value;
pub mod wire;

pub use builder::{EnumSchemaBuilder, FileSchemaBuilder, MessageSchemaBuilder};
pub use codec::{encoded_len, marshal, marshal_with, merge, unmarshal, unmarshal_with};
pub use config::{CodecOptions, ConfigError, UnknownFieldPolicy};
pub use descriptor::{
    Cardinality, EnumDescriptor, EnumValue, FieldDescriptor, FileDescriptor, Kind,
    MessageDescriptor,
};
pub use error::{MessageError, SchemaError, WireError};
pub use message::DynamicMessage;
pub use registry::{build_file, DescriptorRegistry};
pub use schema::{
    EnumSchema, EnumValueSchema, FieldLabel, FieldSchema, FieldType, FileSchema, MapSchema,
    MessageSchema,
};
pub use value::{List, Map, MapKey, Value};

/// Register `schemas` in order (dependencies first) into a new registry.
pub fn build_registry<'a, I>(schemas: I) -> Result<DescriptorRegistry, SchemaError>
where
    I: IntoIterator<Item = &'a FileSchema>,
{
    let mut registry = DescriptorRegistry::new();
    for schema in schemas {
        registry.register(schema)?;
    }
    Ok(registry)
}

/// Empty message of the given type.
pub fn new_message(descriptor: &MessageDescriptor) -> DynamicMessage {
    DynamicMessage::new(descriptor.clone())
}
