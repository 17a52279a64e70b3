// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor-bound dynamic message.
//!
//! A [`DynamicMessage`] stores only the fields that hold a non-default value,
//! keyed by field number. Reading any other field yields its zero value.
//! Repeated, map and message fields are edited through a handle obtained from
//! [`DynamicMessage::new_field`] (or a clone of the current value) and stored
//! back with [`DynamicMessage::set`]; a handle that is never set back has no
//! effect on the message.
//!
//! ```
//! use hdds_dynpb::{build_file, FieldType, FileSchemaBuilder, MessageSchemaBuilder};
//! use hdds_dynpb::{DynamicMessage, Value};
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
//! let mut msg = DynamicMessage::new(foo);
//! msg.set_by_name("id", 42).unwrap();
//! assert_eq!(msg.get_by_name("id").unwrap().as_i32(), Some(42));
//! assert_eq!(msg.get_by_name("title").unwrap().as_str(), Some(""));
//! ```

use crate::descriptor::{FieldDescriptor, MessageDescriptor};
use crate::error::MessageError;
use crate::value::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// A message instance whose structure is known only through its descriptor.
#[derive(Clone, PartialEq)]
pub struct DynamicMessage {
    descriptor: MessageDescriptor,
    fields: BTreeMap<u32, Value>,
    unknown: Vec<u8>,
}

impl DynamicMessage {
    /// Empty message: every field reads as its default.
    pub fn new(descriptor: MessageDescriptor) -> Self {
        Self {
            descriptor,
            fields: BTreeMap::new(),
            unknown: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    fn check_owner(&self, field: &FieldDescriptor) -> Result<(), MessageError> {
        if field.containing_message() == &self.descriptor {
            Ok(())
        } else {
            Err(self.unknown_field(&field.full_name()))
        }
    }

    fn unknown_field(&self, field: &str) -> MessageError {
        MessageError::UnknownField {
            message: self.descriptor.full_name().to_string(),
            field: field.to_string(),
        }
    }

    fn field_named(&self, name: &str) -> Result<FieldDescriptor, MessageError> {
        self.descriptor
            .field_by_name(name)
            .ok_or_else(|| self.unknown_field(name))
    }

    /// Stored value, or the field's default when absent.
    pub fn get(&self, field: &FieldDescriptor) -> Result<Cow<'_, Value>, MessageError> {
        self.check_owner(field)?;
        Ok(match self.fields.get(&field.number()) {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(Value::default_for(field)),
        })
    }

    pub fn get_by_name(&self, name: &str) -> Result<Cow<'_, Value>, MessageError> {
        let field = self.field_named(name)?;
        self.get(&field)
    }

    pub fn get_by_number(&self, number: u32) -> Result<Cow<'_, Value>, MessageError> {
        let field = self
            .descriptor
            .field_by_number(number)
            .ok_or_else(|| self.unknown_field(&number.to_string()))?;
        self.get(&field)
    }

    /// Store `value` in `field`.
    ///
    /// The value must match the field's declared type and cardinality; lists
    /// and maps must be bound to this very field and hold only elements of
    /// its element kinds. Zero scalars and empty
    /// containers clear the field. On error the message is left untouched.
    pub fn set(
        &mut self,
        field: &FieldDescriptor,
        value: impl Into<Value>,
    ) -> Result<(), MessageError> {
        self.check_owner(field)?;
        let value = value.into();
        value.check_for_field(field)?;
        self.store(field.number(), value);
        Ok(())
    }

    pub fn set_by_name(&mut self, name: &str, value: impl Into<Value>) -> Result<(), MessageError> {
        let field = self.field_named(name)?;
        self.set(&field, value)
    }

    /// Remove the field's entry.
    pub fn clear(&mut self, field: &FieldDescriptor) -> Result<(), MessageError> {
        self.check_owner(field)?;
        self.fields.remove(&field.number());
        Ok(())
    }

    /// Remove every field and the unknown bytes.
    pub fn clear_all(&mut self) {
        self.fields.clear();
        self.unknown.clear();
    }

    /// True when the field has a stored entry.
    pub fn has(&self, field: &FieldDescriptor) -> bool {
        field.containing_message() == &self.descriptor && self.fields.contains_key(&field.number())
    }

    /// Fresh value for `field`: an empty list, map or message bound to it,
    /// or the scalar default. The message itself is not modified.
    pub fn new_field(&self, field: &FieldDescriptor) -> Result<Value, MessageError> {
        self.check_owner(field)?;
        Ok(Value::default_for(field))
    }

    /// Visit present fields in ascending field-number order until `visitor`
    /// returns `false`.
    pub fn range<F>(&self, mut visitor: F)
    where
        F: FnMut(&FieldDescriptor, &Value) -> bool,
    {
        for (field, value) in self.fields() {
            if !visitor(&field, value) {
                break;
            }
        }
    }

    /// Present fields in ascending field-number order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldDescriptor, &Value)> + '_ {
        self.fields.iter().filter_map(move |(&number, value)| {
            self.descriptor
                .field_by_number(number)
                .map(|field| (field, value))
        })
    }

    /// Number of present fields.
    pub fn present_count(&self) -> usize {
        self.fields.len()
    }

    /// Raw bytes of fields the descriptor does not know, in arrival order.
    pub fn unknown_fields(&self) -> &[u8] {
        &self.unknown
    }

    pub fn clear_unknown_fields(&mut self) {
        self.unknown.clear();
    }

    /// Protobuf merge: scalars from `other` overwrite, messages merge
    /// recursively, lists are appended and map entries overwrite by key.
    pub fn merge_from(&mut self, other: &DynamicMessage) -> Result<(), MessageError> {
        if other.descriptor != self.descriptor {
            return Err(MessageError::TypeMismatch {
                field: self.descriptor.full_name().to_string(),
                expected: self.descriptor.full_name().to_string(),
                got: other.descriptor.full_name().to_string(),
            });
        }
        for (&number, incoming) in &other.fields {
            let merged = match (self.fields.remove(&number), incoming) {
                (Some(Value::Message(mut current)), Value::Message(next)) => {
                    current.merge_from(next)?;
                    Value::Message(current)
                }
                (Some(Value::List(mut current)), Value::List(next)) => {
                    current.items_mut().extend(next.iter().cloned());
                    Value::List(current)
                }
                (Some(Value::Map(mut current)), Value::Map(next)) => {
                    for (key, value) in next.iter() {
                        current.insert_unchecked(key.clone(), value.clone());
                    }
                    Value::Map(current)
                }
                (_, other_value) => other_value.clone(),
            };
            self.fields.insert(number, merged);
        }
        self.unknown.extend_from_slice(&other.unknown);
        Ok(())
    }

    // Decoder plumbing. Callers guarantee type correctness.

    /// Remove and return the current value, or the field default.
    pub(crate) fn take_or_default(&mut self, field: &FieldDescriptor) -> Value {
        self.fields
            .remove(&field.number())
            .unwrap_or_else(|| Value::default_for(field))
    }

    /// Store with implicit presence applied.
    pub(crate) fn store(&mut self, number: u32, value: Value) {
        if value.is_default() {
            self.fields.remove(&number);
        } else {
            self.fields.insert(number, value);
        }
    }

    pub(crate) fn push_unknown(&mut self, raw: &[u8]) {
        self.unknown.extend_from_slice(raw);
    }
}

impl fmt::Debug for DynamicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.descriptor.full_name());
        for (field, value) in self.fields() {
            out.field(field.name(), value);
        }
        if !self.unknown.is_empty() {
            out.field("unknown_bytes", &self.unknown.len());
        }
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{FileSchemaBuilder, MessageSchemaBuilder};
    use crate::descriptor::FileDescriptor;
    use crate::registry::build_file;
    use crate::schema::FieldType;
    use crate::value::MapKey;

    fn file() -> FileDescriptor {
        let schema = FileSchemaBuilder::new("example.proto", "example")
            .message(
                MessageSchemaBuilder::new("Foo")
                    .field("id", 1, FieldType::Int32)
                    .string_field("title", 2)
                    .build(),
            )
            .message(
                MessageSchemaBuilder::new("Bar")
                    .map_field_with_type("bar_map", 1, FieldType::String, FieldType::Message, "Foo")
                    .repeated_message_field("items", 2, "Foo")
                    .message_field("child", 3, "Bar")
                    .field("flag", 4, FieldType::Bool)
                    .build(),
            )
            .build();
        build_file(&schema).expect("build")
    }

    fn foo(file: &FileDescriptor, id: i32, title: &str) -> DynamicMessage {
        let mut msg = DynamicMessage::new(file.message_by_name("Foo").expect("Foo"));
        msg.set_by_name("id", id).expect("id");
        msg.set_by_name("title", title).expect("title");
        msg
    }

    #[test]
    fn test_defaults_are_not_present() {
        let file = file();
        let msg = DynamicMessage::new(file.message_by_name("Foo").expect("Foo"));
        assert_eq!(msg.get_by_name("id").expect("id").into_owned(), Value::I32(0));
        assert_eq!(msg.get_by_name("title").expect("title").as_str(), Some(""));
        let mut visited = 0;
        msg.range(|_, _| {
            visited += 1;
            true
        });
        assert_eq!(visited, 0);
    }

    #[test]
    fn test_set_get_clear() {
        let file = file();
        let mut msg = foo(&file, 42, "aloha");
        let id = msg.descriptor().field_by_name("id").expect("id");
        assert!(msg.has(&id));
        assert_eq!(msg.get(&id).expect("get").as_i32(), Some(42));

        msg.clear(&id).expect("clear");
        assert!(!msg.has(&id));
        assert_eq!(msg.get(&id).expect("get").as_i32(), Some(0));

        msg.set(&id, 7).expect("set");
        msg.set(&id, 0).expect("set zero");
        assert!(!msg.has(&id));
    }

    #[test]
    fn test_type_mismatch_is_all_or_nothing() {
        let file = file();
        let mut msg = foo(&file, 42, "aloha");
        let err = msg.set_by_name("id", "not a number").unwrap_err();
        assert!(matches!(err, MessageError::TypeMismatch { .. }));
        assert_eq!(msg.get_by_name("id").expect("id").as_i32(), Some(42));

        let bar = file.message_by_name("Bar").expect("Bar");
        let mut bar_msg = DynamicMessage::new(bar);
        assert!(matches!(
            bar_msg.set_by_name("child", foo(&file, 1, "x")),
            Err(MessageError::TypeMismatch { .. })
        ));
        assert!(matches!(
            bar_msg.set_by_name("items", 5),
            Err(MessageError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_field() {
        let file = file();
        let mut msg = foo(&file, 1, "a");
        assert!(matches!(
            msg.get_by_name("missing"),
            Err(MessageError::UnknownField { .. })
        ));
        assert!(matches!(
            msg.get_by_number(99),
            Err(MessageError::UnknownField { .. })
        ));

        let flag = file
            .message_by_name("Bar")
            .and_then(|m| m.field_by_name("flag"))
            .expect("flag");
        assert!(matches!(msg.set(&flag, true), Err(MessageError::UnknownField { .. })));
        assert!(!msg.has(&flag));
    }

    #[test]
    fn test_new_field_handles_must_be_set_back() {
        let file = file();
        let bar = file.message_by_name("Bar").expect("Bar");
        let mut msg = DynamicMessage::new(bar.clone());
        let items = bar.field_by_name("items").expect("items");

        let mut handle = msg.new_field(&items).expect("new_field");
        handle
            .as_list_mut()
            .expect("list")
            .append(foo(&file, 1, "one"))
            .expect("append");
        assert!(!msg.has(&items));

        msg.set(&items, handle).expect("set back");
        assert_eq!(msg.get(&items).expect("get").as_list().expect("list").len(), 1);
    }

    #[test]
    fn test_map_field_roundtrip_through_set() {
        let file = file();
        let bar = file.message_by_name("Bar").expect("Bar");
        let mut msg = DynamicMessage::new(bar.clone());
        let bar_map = bar.field_by_name("bar_map").expect("bar_map");

        let mut map = msg.new_field(&bar_map).expect("new_field");
        let entries = map.as_map_mut().expect("map");
        entries.insert("key1", foo(&file, 42, "aloha")).expect("insert");
        entries.insert("key1", foo(&file, 43, "again")).expect("insert");
        msg.set(&bar_map, map).expect("set");

        let value = msg.get(&bar_map).expect("get");
        let stored = value.as_map().expect("map");
        assert_eq!(stored.len(), 1);
        let entry = stored.get(&MapKey::from("key1")).expect("key1");
        assert_eq!(
            entry.as_message().expect("msg").get_by_name("id").expect("id").as_i32(),
            Some(43)
        );

        // an empty map clears the field
        let empty = msg.new_field(&bar_map).expect("new_field");
        msg.set(&bar_map, empty).expect("set empty");
        assert!(!msg.has(&bar_map));
    }

    #[test]
    fn test_list_from_other_field_rejected() {
        let file = file();
        let bar = file.message_by_name("Bar").expect("Bar");
        let mut msg = DynamicMessage::new(bar.clone());
        let items = bar.field_by_name("items").expect("items");
        let bar_map = bar.field_by_name("bar_map").expect("bar_map");
        let list = msg.new_field(&items).expect("list");
        assert!(matches!(
            msg.set(&bar_map, list),
            Err(MessageError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_message_field_is_present() {
        let file = file();
        let bar = file.message_by_name("Bar").expect("Bar");
        let mut msg = DynamicMessage::new(bar.clone());
        msg.set_by_name("child", DynamicMessage::new(bar.clone()))
            .expect("set child");
        assert!(msg.has(&bar.field_by_name("child").expect("child")));
    }

    #[test]
    fn test_range_order_and_early_stop() {
        let file = file();
        let bar = file.message_by_name("Bar").expect("Bar");
        let mut msg = DynamicMessage::new(bar.clone());
        msg.set_by_name("flag", true).expect("flag");
        msg.set_by_name("child", DynamicMessage::new(bar)).expect("child");

        let numbers: Vec<u32> = msg.fields().map(|(f, _)| f.number()).collect();
        assert_eq!(numbers, vec![3, 4]);

        let mut seen = Vec::new();
        msg.range(|field, _| {
            seen.push(field.number());
            false
        });
        assert_eq!(seen, vec![3]);
    }

    #[test]
    fn test_merge_from() {
        let file = file();
        let bar = file.message_by_name("Bar").expect("Bar");
        let items = bar.field_by_name("items").expect("items");

        let mut left = DynamicMessage::new(bar.clone());
        let mut list = left.new_field(&items).expect("list");
        list.as_list_mut().expect("list").append(foo(&file, 1, "a")).expect("append");
        left.set(&items, list.clone()).expect("set");
        let mut child = DynamicMessage::new(bar.clone());
        child.set_by_name("flag", true).expect("flag");
        left.set_by_name("child", child).expect("child");

        let mut right = DynamicMessage::new(bar.clone());
        right.set(&items, list).expect("set");
        let mut other_child = DynamicMessage::new(bar.clone());
        let mut l = other_child.new_field(&items).expect("list");
        l.as_list_mut().expect("list").append(foo(&file, 2, "b")).expect("append");
        other_child.set_by_name("items", l).expect("items");
        right.set_by_name("child", other_child).expect("child");

        left.merge_from(&right).expect("merge");
        assert_eq!(left.get(&items).expect("items").as_list().expect("list").len(), 2);
        let merged_child = left.get_by_name("child").expect("child").into_owned();
        let merged_child = merged_child.as_message().expect("message");
        assert_eq!(merged_child.get_by_name("flag").expect("flag").as_bool(), Some(true));
        assert_eq!(
            merged_child.get_by_name("items").expect("items").as_list().expect("list").len(),
            1
        );

        let foo_msg = foo(&file, 1, "x");
        assert!(left.merge_from(&foo_msg).is_err());
    }
}
