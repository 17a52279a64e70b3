// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Immutable descriptor graph.
//!
//! A [`FileDescriptor`] owns an arena of message and enum records. Every
//! cross reference (field type, nesting, parent) is an index into that arena,
//! or into the arena of a dependency file, so self-referential and mutually
//! recursive message types need no recursive ownership.
//!
//! [`MessageDescriptor`], [`FieldDescriptor`] and [`EnumDescriptor`] are
//! handles: an `Arc` to the arena plus an index. They are cheap to clone,
//! compare by identity and can be shared across threads.

use crate::schema::FieldType;
use crate::wire::WireType;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Reference from a field to a message or enum record.
#[derive(Clone)]
pub(crate) enum TypeRef {
    /// Index into the arena of the same file.
    Local(usize),
    /// Index into the arena of a dependency.
    Foreign(FileDescriptor, usize),
}

/// Resolved type of a field as stored in the arena.
#[derive(Clone)]
pub(crate) enum FieldKind {
    /// Never `Kind::Message` or `Kind::Enum`.
    Scalar(Kind),
    Message(TypeRef),
    Enum(TypeRef),
}

pub(crate) struct FieldInner {
    pub(crate) name: String,
    pub(crate) json_name: String,
    pub(crate) number: u32,
    pub(crate) cardinality: Cardinality,
    pub(crate) kind: FieldKind,
    pub(crate) packed: bool,
}

pub(crate) struct MessageInner {
    pub(crate) name: String,
    pub(crate) full_name: String,
    pub(crate) parent: Option<usize>,
    pub(crate) fields: Vec<FieldInner>,
    pub(crate) by_name: HashMap<String, usize>,
    pub(crate) by_number: HashMap<u32, usize>,
    pub(crate) by_json_name: HashMap<String, usize>,
    pub(crate) nested_messages: Vec<usize>,
    pub(crate) nested_enums: Vec<usize>,
    pub(crate) map_entry: bool,
}

pub(crate) struct EnumInner {
    pub(crate) name: String,
    pub(crate) full_name: String,
    pub(crate) parent: Option<usize>,
    pub(crate) values: Vec<EnumValue>,
}

/// Arena slot of a named type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeIndex {
    Message(usize),
    Enum(usize),
}

pub(crate) struct FileInner {
    pub(crate) name: String,
    pub(crate) package: String,
    pub(crate) dependencies: Vec<FileDescriptor>,
    pub(crate) messages: Vec<MessageInner>,
    pub(crate) enums: Vec<EnumInner>,
    pub(crate) top_messages: Vec<usize>,
    pub(crate) top_enums: Vec<usize>,
    /// Full name (no leading dot) to arena slot.
    pub(crate) type_names: HashMap<String, TypeIndex>,
}

/// Field label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Singular field (proto3 implicit presence).
    Optional,
    /// Repeated field, including map fields.
    Repeated,
}

/// One enumerator of an enum type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

/// Resolved field type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
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
    Message(MessageDescriptor),
    Enum(EnumDescriptor),
}

impl Kind {
    /// Kind of a scalar schema type; `None` for message and enum types,
    /// which need a resolved descriptor.
    pub fn scalar(field_type: FieldType) -> Option<Self> {
        let kind = match field_type {
            FieldType::Double => Self::Double,
            FieldType::Float => Self::Float,
            FieldType::Int32 => Self::Int32,
            FieldType::Int64 => Self::Int64,
            FieldType::Uint32 => Self::Uint32,
            FieldType::Uint64 => Self::Uint64,
            FieldType::Sint32 => Self::Sint32,
            FieldType::Sint64 => Self::Sint64,
            FieldType::Fixed32 => Self::Fixed32,
            FieldType::Fixed64 => Self::Fixed64,
            FieldType::Sfixed32 => Self::Sfixed32,
            FieldType::Sfixed64 => Self::Sfixed64,
            FieldType::Bool => Self::Bool,
            FieldType::String => Self::String,
            FieldType::Bytes => Self::Bytes,
            FieldType::Message | FieldType::Enum => return None,
        };
        Some(kind)
    }

    /// Declared schema type.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Double => FieldType::Double,
            Self::Float => FieldType::Float,
            Self::Int32 => FieldType::Int32,
            Self::Int64 => FieldType::Int64,
            Self::Uint32 => FieldType::Uint32,
            Self::Uint64 => FieldType::Uint64,
            Self::Sint32 => FieldType::Sint32,
            Self::Sint64 => FieldType::Sint64,
            Self::Fixed32 => FieldType::Fixed32,
            Self::Fixed64 => FieldType::Fixed64,
            Self::Sfixed32 => FieldType::Sfixed32,
            Self::Sfixed64 => FieldType::Sfixed64,
            Self::Bool => FieldType::Bool,
            Self::String => FieldType::String,
            Self::Bytes => FieldType::Bytes,
            Self::Message(_) => FieldType::Message,
            Self::Enum(_) => FieldType::Enum,
        }
    }

    /// Wire type used for a single (unpacked) value of this kind.
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Int32
            | Self::Int64
            | Self::Uint32
            | Self::Uint64
            | Self::Sint32
            | Self::Sint64
            | Self::Bool
            | Self::Enum(_) => WireType::Varint,
            Self::Fixed64 | Self::Sfixed64 | Self::Double => WireType::Fixed64,
            Self::Fixed32 | Self::Sfixed32 | Self::Float => WireType::Fixed32,
            Self::String | Self::Bytes | Self::Message(_) => WireType::LengthDelimited,
        }
    }

    /// True for kinds allowed in packed repeated runs.
    pub fn is_packable(&self) -> bool {
        self.wire_type() != WireType::LengthDelimited
    }

    /// Human-readable name, used in error messages.
    pub fn name(&self) -> String {
        match self {
            Self::Message(m) => m.full_name().to_string(),
            Self::Enum(e) => e.full_name().to_string(),
            other => other.field_type().as_str().to_string(),
        }
    }
}

/// A built `.proto` file: the arena every other handle points into.
#[derive(Clone)]
pub struct FileDescriptor {
    inner: Arc<FileInner>,
}

impl FileDescriptor {
    pub(crate) fn from_inner(inner: FileInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub(crate) fn inner(&self) -> &FileInner {
        &self.inner
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn package(&self) -> &str {
        &self.inner.package
    }

    /// Files whose types this file may reference.
    pub fn dependencies(&self) -> &[FileDescriptor] {
        &self.inner.dependencies
    }

    /// Top-level messages in declaration order.
    pub fn messages(&self) -> impl Iterator<Item = MessageDescriptor> + '_ {
        self.inner
            .top_messages
            .iter()
            .map(move |&index| MessageDescriptor::new(self.clone(), index))
    }

    /// Top-level enums in declaration order.
    pub fn enums(&self) -> impl Iterator<Item = EnumDescriptor> + '_ {
        self.inner
            .top_enums
            .iter()
            .map(move |&index| EnumDescriptor::new(self.clone(), index))
    }

    /// Every message in the arena, nested and synthesized ones included.
    pub fn all_messages(&self) -> impl Iterator<Item = MessageDescriptor> + '_ {
        (0..self.inner.messages.len()).map(move |index| MessageDescriptor::new(self.clone(), index))
    }

    /// Look up a message defined in this file.
    ///
    /// Accepts `Foo`, `Outer.Inner`, `pkg.Foo` or `.pkg.Foo`.
    pub fn message_by_name(&self, name: &str) -> Option<MessageDescriptor> {
        match self.lookup(name)? {
            TypeIndex::Message(index) => Some(MessageDescriptor::new(self.clone(), index)),
            TypeIndex::Enum(_) => None,
        }
    }

    /// Look up an enum defined in this file.
    pub fn enum_by_name(&self, name: &str) -> Option<EnumDescriptor> {
        match self.lookup(name)? {
            TypeIndex::Enum(index) => Some(EnumDescriptor::new(self.clone(), index)),
            TypeIndex::Message(_) => None,
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<TypeIndex> {
        let name = name.strip_prefix('.').unwrap_or(name);
        if let Some(found) = self.inner.type_names.get(name) {
            return Some(*found);
        }
        if self.inner.package.is_empty() {
            return None;
        }
        self.inner
            .type_names
            .get(&format!("{}.{}", self.inner.package, name))
            .copied()
    }
}

impl PartialEq for FileDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for FileDescriptor {}

impl Hash for FileDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("name", &self.inner.name)
            .field("package", &self.inner.package)
            .field("messages", &self.inner.messages.len())
            .field("enums", &self.inner.enums.len())
            .finish()
    }
}

/// Handle to a message type.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MessageDescriptor {
    file: FileDescriptor,
    index: usize,
}

impl MessageDescriptor {
    pub(crate) fn new(file: FileDescriptor, index: usize) -> Self {
        Self { file, index }
    }

    fn inner(&self) -> &MessageInner {
        &self.file.inner.messages[self.index]
    }

    /// File owning this message.
    pub fn file(&self) -> &FileDescriptor {
        &self.file
    }

    /// Short name, e.g. `Inner`.
    pub fn name(&self) -> &str {
        &self.inner().name
    }

    /// Fully qualified name without leading dot, e.g. `pkg.Outer.Inner`.
    pub fn full_name(&self) -> &str {
        &self.inner().full_name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = FieldDescriptor> + '_ {
        (0..self.inner().fields.len()).map(move |index| FieldDescriptor {
            message: self.clone(),
            index,
        })
    }

    pub fn field_by_name(&self, name: &str) -> Option<FieldDescriptor> {
        self.inner()
            .by_name
            .get(name)
            .map(|&index| self.field_at(index))
    }

    pub fn field_by_number(&self, number: u32) -> Option<FieldDescriptor> {
        self.inner()
            .by_number
            .get(&number)
            .map(|&index| self.field_at(index))
    }

    pub fn field_by_json_name(&self, json_name: &str) -> Option<FieldDescriptor> {
        self.inner()
            .by_json_name
            .get(json_name)
            .map(|&index| self.field_at(index))
    }

    fn field_at(&self, index: usize) -> FieldDescriptor {
        FieldDescriptor {
            message: self.clone(),
            index,
        }
    }

    pub fn nested_messages(&self) -> impl Iterator<Item = MessageDescriptor> + '_ {
        self.inner()
            .nested_messages
            .iter()
            .map(move |&index| MessageDescriptor::new(self.file.clone(), index))
    }

    pub fn nested_enums(&self) -> impl Iterator<Item = EnumDescriptor> + '_ {
        self.inner()
            .nested_enums
            .iter()
            .map(move |&index| EnumDescriptor::new(self.file.clone(), index))
    }

    /// Enclosing message, `None` at top level.
    pub fn parent(&self) -> Option<MessageDescriptor> {
        self.inner()
            .parent
            .map(|index| MessageDescriptor::new(self.file.clone(), index))
    }

    /// True for synthesized key/value pair messages.
    pub fn is_map_entry(&self) -> bool {
        self.inner().map_entry
    }

    /// Field #1 of a map entry.
    pub fn map_entry_key_field(&self) -> Option<FieldDescriptor> {
        if self.is_map_entry() {
            self.field_by_number(1)
        } else {
            None
        }
    }

    /// Field #2 of a map entry.
    pub fn map_entry_value_field(&self) -> Option<FieldDescriptor> {
        if self.is_map_entry() {
            self.field_by_number(2)
        } else {
            None
        }
    }
}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageDescriptor")
            .field(&self.full_name())
            .finish()
    }
}

impl fmt::Display for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

/// Handle to a field of a message type.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    message: MessageDescriptor,
    index: usize,
}

impl FieldDescriptor {
    fn inner(&self) -> &FieldInner {
        &self.message.inner().fields[self.index]
    }

    pub fn name(&self) -> &str {
        &self.inner().name
    }

    /// `pkg.Message.field`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.message.full_name(), self.inner().name)
    }

    pub fn json_name(&self) -> &str {
        &self.inner().json_name
    }

    pub fn number(&self) -> u32 {
        self.inner().number
    }

    pub fn cardinality(&self) -> Cardinality {
        self.inner().cardinality
    }

    /// Resolved type. Message and enum kinds carry their descriptor.
    pub fn kind(&self) -> Kind {
        let file = &self.message.file;
        match &self.inner().kind {
            FieldKind::Scalar(kind) => kind.clone(),
            FieldKind::Message(type_ref) => {
                let (file, index) = resolve(file, type_ref);
                Kind::Message(MessageDescriptor::new(file, index))
            }
            FieldKind::Enum(type_ref) => {
                let (file, index) = resolve(file, type_ref);
                Kind::Enum(EnumDescriptor::new(file, index))
            }
        }
    }

    /// Repeated but not a map.
    pub fn is_list(&self) -> bool {
        self.cardinality() == Cardinality::Repeated && !self.is_map()
    }

    /// Repeated field whose element type is a map entry.
    pub fn is_map(&self) -> bool {
        self.cardinality() == Cardinality::Repeated
            && matches!(self.kind(), Kind::Message(entry) if entry.is_map_entry())
    }

    /// Encoded as a packed run when repeated.
    pub fn is_packed(&self) -> bool {
        self.inner().packed
    }

    pub fn containing_message(&self) -> &MessageDescriptor {
        &self.message
    }

    /// Only singular message fields track presence in proto3.
    pub fn supports_presence(&self) -> bool {
        self.cardinality() == Cardinality::Optional && matches!(self.inner().kind, FieldKind::Message(_))
    }

    /// Key and value fields of a map field's entry type.
    pub fn map_entry_fields(&self) -> Option<(FieldDescriptor, FieldDescriptor)> {
        if self.cardinality() != Cardinality::Repeated {
            return None;
        }
        match self.kind() {
            Kind::Message(entry) => Some((entry.map_entry_key_field()?, entry.map_entry_value_field()?)),
            _ => None,
        }
    }
}

fn resolve(file: &FileDescriptor, type_ref: &TypeRef) -> (FileDescriptor, usize) {
    match type_ref {
        TypeRef::Local(index) => (file.clone(), *index),
        TypeRef::Foreign(other, index) => (other.clone(), *index),
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.full_name())
            .field("number", &self.number())
            .field("cardinality", &self.cardinality())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Handle to an enum type.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EnumDescriptor {
    file: FileDescriptor,
    index: usize,
}

impl EnumDescriptor {
    pub(crate) fn new(file: FileDescriptor, index: usize) -> Self {
        Self { file, index }
    }

    fn inner(&self) -> &EnumInner {
        &self.file.inner.enums[self.index]
    }

    pub fn file(&self) -> &FileDescriptor {
        &self.file
    }

    pub fn name(&self) -> &str {
        &self.inner().name
    }

    pub fn full_name(&self) -> &str {
        &self.inner().full_name
    }

    /// Enclosing message, `None` at top level.
    pub fn parent(&self) -> Option<MessageDescriptor> {
        self.inner()
            .parent
            .map(|index| MessageDescriptor::new(self.file.clone(), index))
    }

    pub fn values(&self) -> &[EnumValue] {
        &self.inner().values
    }

    pub fn value_by_name(&self, name: &str) -> Option<&EnumValue> {
        self.values().iter().find(|v| v.name == name)
    }

    /// First enumerator with this number.
    pub fn value_by_number(&self, number: i32) -> Option<&EnumValue> {
        self.values().iter().find(|v| v.number == number)
    }

    /// Number of the first enumerator (always 0 in proto3).
    pub fn default_number(&self) -> i32 {
        self.values().first().map(|v| v.number).unwrap_or(0)
    }
}

impl fmt::Debug for EnumDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EnumDescriptor")
            .field(&self.full_name())
            .finish()
    }
}
