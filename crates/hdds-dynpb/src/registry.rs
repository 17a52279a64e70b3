// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor builder and multi-file registry.
//!
//! [`build_file`] turns a [`FileSchema`] into a [`FileDescriptor`] in three
//! passes:
//!
//! 1. every message and enum shell is registered under its full name, so
//!    forward, self and mutual references can be resolved;
//! 2. fields are populated and their `type_name` resolved with protobuf
//!    scoping rules;
//! 3. map entries and map fields are checked for structural well-formedness.
//!
//! Map shorthand fields (`FieldSchema::map`) are rewritten beforehand into a
//! nested `<FieldName>Entry` message carrying the map-entry marker, the same
//! shape `protoc` emits.

use std::collections::HashMap;

use crate::descriptor::{
    Cardinality, EnumDescriptor, EnumInner, EnumValue, FieldInner, FieldKind, FileDescriptor,
    FileInner, Kind, MessageDescriptor, MessageInner, TypeIndex, TypeRef,
};
use crate::error::SchemaError;
use crate::schema::{
    EnumSchema, FieldLabel, FieldSchema, FieldType, FileSchema, MessageSchema, PROTO3,
};
use crate::wire::is_valid_field_number;

/// Build a standalone file (no dependencies).
pub fn build_file(schema: &FileSchema) -> Result<FileDescriptor, SchemaError> {
    build_with_dependencies(schema, Vec::new())
}

fn build_with_dependencies(
    schema: &FileSchema,
    dependencies: Vec<FileDescriptor>,
) -> Result<FileDescriptor, SchemaError> {
    if schema.syntax != PROTO3 {
        return Err(SchemaError::UnsupportedSyntax(schema.syntax.clone()));
    }
    if !schema.package.is_empty() {
        for part in schema.package.split('.') {
            if !is_identifier(part) {
                return Err(SchemaError::InvalidName(schema.package.clone()));
            }
        }
    }

    let messages = schema
        .messages
        .iter()
        .map(expand_map_fields)
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = FileBuilder::new(dependencies);
    for message in &messages {
        let index = builder.register_message(message, None, &schema.package)?;
        builder.top_messages.push(index);
    }
    for enum_schema in &schema.enums {
        let index = builder.register_enum(enum_schema, None, &schema.package)?;
        builder.top_enums.push(index);
    }
    builder.populate_fields()?;
    builder.check_maps()?;

    log::debug!(
        "[registry] built file '{}' (package '{}'): {} messages, {} enums",
        schema.name,
        schema.package,
        builder.messages.len(),
        builder.enums.len()
    );

    Ok(FileDescriptor::from_inner(FileInner {
        name: schema.name.clone(),
        package: schema.package.clone(),
        dependencies: builder.dependencies,
        messages: builder.messages,
        enums: builder.enums,
        top_messages: builder.top_messages,
        top_enums: builder.top_enums,
        type_names: builder.type_names,
    }))
}

// ---------------------------------------------------------------------------
// Map shorthand expansion
// ---------------------------------------------------------------------------

/// Entry message name `protoc` derives from a map field name.
pub(crate) fn map_entry_name(field_name: &str) -> String {
    let mut out = String::with_capacity(field_name.len() + 5);
    let mut upper = true;
    for c in field_name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out.push_str("Entry");
    out
}

/// Default JSON name: lowerCamelCase, underscores dropped.
pub(crate) fn to_json_name(field_name: &str) -> String {
    let mut out = String::with_capacity(field_name.len());
    let mut upper = false;
    for c in field_name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn expand_map_fields(message: &MessageSchema) -> Result<MessageSchema, SchemaError> {
    let mut out = MessageSchema {
        name: message.name.clone(),
        fields: Vec::with_capacity(message.fields.len()),
        nested_messages: message
            .nested_messages
            .iter()
            .map(expand_map_fields)
            .collect::<Result<Vec<_>, _>>()?,
        nested_enums: message.nested_enums.clone(),
        map_entry: message.map_entry,
    };

    for field in &message.fields {
        let Some(map) = &field.map else {
            out.fields.push(field.clone());
            continue;
        };
        if !matches!(field.field_type, None | Some(FieldType::Message)) || field.type_name.is_some()
        {
            return Err(SchemaError::InvalidMapField {
                field: field.name.clone(),
                reason: "map shorthand cannot also declare a type".into(),
            });
        }

        let entry_name = map_entry_name(&field.name);
        let mut value = FieldSchema::new("value", 2, map.value);
        value.type_name = map.value_type_name.clone();
        let entry = MessageSchema {
            name: entry_name.clone(),
            fields: vec![FieldSchema::new("key", 1, map.key), value],
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            map_entry: true,
        };
        log::debug!(
            "[registry] synthesized map entry '{}.{}'",
            message.name,
            entry_name
        );
        out.nested_messages.push(entry);

        out.fields.push(FieldSchema {
            name: field.name.clone(),
            number: field.number,
            json_name: field.json_name.clone(),
            field_type: Some(FieldType::Message),
            label: FieldLabel::Repeated,
            type_name: Some(entry_name),
            packed: field.packed,
            map: None,
        });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// FileBuilder
// ---------------------------------------------------------------------------

struct FileBuilder<'a> {
    dependencies: Vec<FileDescriptor>,
    messages: Vec<MessageInner>,
    enums: Vec<EnumInner>,
    /// Schema source of each arena message, same indices as `messages`.
    message_schemas: Vec<&'a MessageSchema>,
    top_messages: Vec<usize>,
    top_enums: Vec<usize>,
    type_names: HashMap<String, TypeIndex>,
}

impl<'a> FileBuilder<'a> {
    fn new(dependencies: Vec<FileDescriptor>) -> Self {
        Self {
            dependencies,
            messages: Vec::new(),
            enums: Vec::new(),
            message_schemas: Vec::new(),
            top_messages: Vec::new(),
            top_enums: Vec::new(),
            type_names: HashMap::new(),
        }
    }

    fn claim_name(&mut self, full_name: &str, slot: TypeIndex) -> Result<(), SchemaError> {
        let taken = self.type_names.contains_key(full_name)
            || self
                .dependencies
                .iter()
                .any(|dep| dep.inner().type_names.contains_key(full_name));
        if taken {
            return Err(SchemaError::DuplicateTypeName(full_name.to_string()));
        }
        self.type_names.insert(full_name.to_string(), slot);
        Ok(())
    }

    // Pass 1: shells.

    fn register_message(
        &mut self,
        schema: &'a MessageSchema,
        parent: Option<usize>,
        scope: &str,
    ) -> Result<usize, SchemaError> {
        if !is_identifier(&schema.name) {
            return Err(SchemaError::InvalidName(schema.name.clone()));
        }
        let full_name = qualify(scope, &schema.name);
        let index = self.messages.len();
        self.claim_name(&full_name, TypeIndex::Message(index))?;

        self.messages.push(MessageInner {
            name: schema.name.clone(),
            full_name: full_name.clone(),
            parent,
            fields: Vec::with_capacity(schema.fields.len()),
            by_name: HashMap::new(),
            by_number: HashMap::new(),
            by_json_name: HashMap::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            map_entry: schema.map_entry,
        });
        self.message_schemas.push(schema);

        for nested in &schema.nested_messages {
            let child = self.register_message(nested, Some(index), &full_name)?;
            self.messages[index].nested_messages.push(child);
        }
        for nested in &schema.nested_enums {
            let child = self.register_enum(nested, Some(index), &full_name)?;
            self.messages[index].nested_enums.push(child);
        }
        Ok(index)
    }

    fn register_enum(
        &mut self,
        schema: &EnumSchema,
        parent: Option<usize>,
        scope: &str,
    ) -> Result<usize, SchemaError> {
        if !is_identifier(&schema.name) {
            return Err(SchemaError::InvalidName(schema.name.clone()));
        }
        let full_name = qualify(scope, &schema.name);
        let invalid = |reason: &str| SchemaError::InvalidEnum {
            name: full_name.clone(),
            reason: reason.to_string(),
        };

        match schema.values.first() {
            None => return Err(invalid("an enum needs at least one value")),
            Some(first) if first.number != 0 => {
                return Err(invalid("the first value must be zero"));
            }
            Some(_) => {}
        }
        let mut seen = HashMap::new();
        for value in &schema.values {
            if !is_identifier(&value.name) {
                return Err(SchemaError::InvalidName(value.name.clone()));
            }
            if seen.insert(value.name.as_str(), value.number).is_some() {
                return Err(invalid(&format!("value '{}' declared twice", value.name)));
            }
        }

        let index = self.enums.len();
        self.claim_name(&full_name, TypeIndex::Enum(index))?;
        self.enums.push(EnumInner {
            name: schema.name.clone(),
            full_name,
            parent,
            values: schema
                .values
                .iter()
                .map(|v| EnumValue {
                    name: v.name.clone(),
                    number: v.number,
                })
                .collect(),
        });
        Ok(index)
    }

    // Pass 2: fields.

    fn populate_fields(&mut self) -> Result<(), SchemaError> {
        for index in 0..self.messages.len() {
            let schema = self.message_schemas[index];
            let scope = self.messages[index].full_name.clone();
            for field in &schema.fields {
                let inner = self.build_field(&scope, field)?;
                let message = &mut self.messages[index];
                let slot = message.fields.len();

                if message.by_number.insert(inner.number, slot).is_some() {
                    return Err(SchemaError::DuplicateFieldNumber {
                        message: scope.clone(),
                        number: inner.number,
                    });
                }
                if message.by_name.insert(inner.name.clone(), slot).is_some() {
                    return Err(SchemaError::DuplicateFieldName {
                        message: scope.clone(),
                        field: inner.name.clone(),
                    });
                }
                message
                    .by_json_name
                    .entry(inner.json_name.clone())
                    .or_insert(slot);
                message.fields.push(inner);
            }
        }
        Ok(())
    }

    fn build_field(&self, scope: &str, field: &FieldSchema) -> Result<FieldInner, SchemaError> {
        let full_name = qualify(scope, &field.name);
        if !is_identifier(&field.name) {
            return Err(SchemaError::InvalidName(full_name));
        }
        if !is_valid_field_number(field.number) {
            return Err(SchemaError::InvalidFieldNumber {
                field: full_name,
                number: field.number,
            });
        }
        let field_type = field
            .field_type
            .ok_or_else(|| SchemaError::MissingFieldType {
                field: full_name.clone(),
            })?;

        let kind = if let Some(scalar) = Kind::scalar(field_type) {
            if let Some(type_name) = &field.type_name {
                return Err(SchemaError::UnexpectedTypeName {
                    field: full_name,
                    type_name: type_name.clone(),
                });
            }
            FieldKind::Scalar(scalar)
        } else {
            let type_name = field
                .type_name
                .as_deref()
                .ok_or_else(|| SchemaError::MissingTypeName {
                    field: full_name.clone(),
                })?;
            let (type_ref, slot) =
                self.resolve(scope, type_name)
                    .ok_or_else(|| SchemaError::UnresolvedType {
                        field: full_name.clone(),
                        type_name: type_name.to_string(),
                    })?;
            match (field_type, slot) {
                (FieldType::Message, TypeIndex::Message(_)) => FieldKind::Message(type_ref),
                (FieldType::Enum, TypeIndex::Enum(_)) => FieldKind::Enum(type_ref),
                (FieldType::Message, _) => {
                    return Err(SchemaError::WrongTypeKind {
                        field: full_name,
                        type_name: type_name.to_string(),
                        expected: "a message",
                    })
                }
                _ => {
                    return Err(SchemaError::WrongTypeKind {
                        field: full_name,
                        type_name: type_name.to_string(),
                        expected: "an enum",
                    })
                }
            }
        };

        let cardinality = match field.label {
            FieldLabel::Optional => Cardinality::Optional,
            FieldLabel::Repeated => Cardinality::Repeated,
        };
        let packable = cardinality == Cardinality::Repeated && field_type.is_packable();
        if field.packed == Some(true) && !packable {
            return Err(SchemaError::InvalidFieldOption {
                field: full_name,
                reason: "only repeated scalar numeric fields can be packed".into(),
            });
        }

        Ok(FieldInner {
            name: field.name.clone(),
            json_name: field
                .json_name
                .clone()
                .unwrap_or_else(|| to_json_name(&field.name)),
            number: field.number,
            cardinality,
            kind,
            packed: packable && field.packed.unwrap_or(true),
        })
    }

    /// Resolve `type_name` as seen from inside `scope` (a message full name).
    fn resolve(&self, scope: &str, type_name: &str) -> Option<(TypeRef, TypeIndex)> {
        if let Some(absolute) = type_name.strip_prefix('.') {
            return self.lookup(absolute);
        }
        let mut current = scope;
        loop {
            let candidate = qualify(current, type_name);
            if let Some(found) = self.lookup(&candidate) {
                return Some(found);
            }
            if current.is_empty() {
                return None;
            }
            current = current.rsplit_once('.').map(|(outer, _)| outer).unwrap_or("");
        }
    }

    fn lookup(&self, full_name: &str) -> Option<(TypeRef, TypeIndex)> {
        if let Some(&slot) = self.type_names.get(full_name) {
            let index = match slot {
                TypeIndex::Message(i) | TypeIndex::Enum(i) => i,
            };
            return Some((TypeRef::Local(index), slot));
        }
        self.dependencies.iter().find_map(|dep| {
            dep.inner().type_names.get(full_name).map(|&slot| {
                let index = match slot {
                    TypeIndex::Message(i) | TypeIndex::Enum(i) => i,
                };
                (TypeRef::Foreign(dep.clone(), index), slot)
            })
        })
    }

    // Pass 3: maps.

    fn check_maps(&self) -> Result<(), SchemaError> {
        for (index, message) in self.messages.iter().enumerate() {
            if message.map_entry {
                self.check_map_entry(message)?;
            }
            for field in &message.fields {
                let FieldKind::Message(type_ref) = &field.kind else {
                    continue;
                };
                let (is_entry, entry_parent, entry_name) = match type_ref {
                    TypeRef::Local(i) => {
                        let entry = &self.messages[*i];
                        (entry.map_entry, entry.parent, entry.name.clone())
                    }
                    TypeRef::Foreign(dep, i) => {
                        let entry = &dep.inner().messages[*i];
                        (entry.map_entry, None, entry.name.clone())
                    }
                };
                if !is_entry {
                    continue;
                }
                let full_name = qualify(&message.full_name, &field.name);
                let invalid = |reason: &str| SchemaError::InvalidMapField {
                    field: full_name.clone(),
                    reason: reason.to_string(),
                };
                if field.cardinality != Cardinality::Repeated {
                    return Err(invalid("a map field must be repeated"));
                }
                if entry_parent != Some(index) || matches!(type_ref, TypeRef::Foreign(..)) {
                    return Err(invalid("the entry message must be nested in the owning message"));
                }
                if entry_name != map_entry_name(&field.name) {
                    return Err(invalid(&format!(
                        "the entry message must be named '{}'",
                        map_entry_name(&field.name)
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_map_entry(&self, message: &MessageInner) -> Result<(), SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidMapEntry {
            message: message.full_name.clone(),
            reason: reason.to_string(),
        };
        if message.parent.is_none() {
            return Err(invalid("a map entry must be nested in a message"));
        }
        if !message.nested_messages.is_empty() || !message.nested_enums.is_empty() {
            return Err(invalid("a map entry cannot declare nested types"));
        }
        let [key, value] = message.fields.as_slice() else {
            return Err(invalid("a map entry needs exactly the fields key and value"));
        };
        if key.number != 1 || key.name != "key" || value.number != 2 || value.name != "value" {
            return Err(invalid("expected fields key = 1 and value = 2"));
        }
        if key.cardinality != Cardinality::Optional || value.cardinality != Cardinality::Optional
        {
            return Err(invalid("key and value cannot be repeated"));
        }
        match &key.kind {
            FieldKind::Scalar(k) if k.field_type().is_valid_map_key() => Ok(()),
            _ => Err(invalid("key must be an integral, bool or string type")),
        }
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ---------------------------------------------------------------------------
// DescriptorRegistry
// ---------------------------------------------------------------------------

/// A set of built files that may reference one another.
///
/// Files are registered in dependency order; a file can only depend on files
/// registered before it. Full type names are unique across the registry.
#[derive(Debug, Default, Clone)]
pub struct DescriptorRegistry {
    files: Vec<FileDescriptor>,
    by_name: HashMap<String, usize>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build `schema` against the registered files and add it.
    pub fn register(&mut self, schema: &FileSchema) -> Result<FileDescriptor, SchemaError> {
        if self.by_name.contains_key(&schema.name) {
            return Err(SchemaError::DuplicateFile(schema.name.clone()));
        }
        let dependencies = schema
            .dependencies
            .iter()
            .map(|name| {
                self.file(name).ok_or_else(|| SchemaError::UnknownDependency {
                    file: schema.name.clone(),
                    dependency: name.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let file = build_with_dependencies(schema, dependencies)?;
        for name in file.inner().type_names.keys() {
            if self
                .files
                .iter()
                .any(|other| other.inner().type_names.contains_key(name))
            {
                return Err(SchemaError::DuplicateTypeName(name.clone()));
            }
        }

        log::debug!(
            "[registry] registered '{}' ({} files)",
            schema.name,
            self.files.len() + 1
        );
        self.by_name.insert(schema.name.clone(), self.files.len());
        self.files.push(file.clone());
        Ok(file)
    }

    /// Registered file by name.
    pub fn file(&self, name: &str) -> Option<FileDescriptor> {
        self.by_name.get(name).map(|&i| self.files[i].clone())
    }

    /// Files in registration order.
    pub fn files(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.files.iter()
    }

    /// Message by fully qualified name, searched across all files.
    pub fn message_by_name(&self, full_name: &str) -> Option<MessageDescriptor> {
        let name = full_name.strip_prefix('.').unwrap_or(full_name);
        self.files.iter().find_map(|file| match file.inner().type_names.get(name) {
            Some(TypeIndex::Message(_)) => file.message_by_name(name),
            _ => None,
        })
    }

    /// Enum by fully qualified name, searched across all files.
    pub fn enum_by_name(&self, full_name: &str) -> Option<EnumDescriptor> {
        let name = full_name.strip_prefix('.').unwrap_or(full_name);
        self.files.iter().find_map(|file| match file.inner().type_names.get(name) {
            Some(TypeIndex::Enum(_)) => file.enum_by_name(name),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
