// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic field values.
//!
//! [`Value`] is the tagged union stored in a [`DynamicMessage`]. Repeated
//! and map fields hold a [`List`] or [`Map`] bound to their field descriptor,
//! so every element is type-checked on insertion.

use crate::descriptor::{FieldDescriptor, Kind};
use crate::error::MessageError;
use crate::message::DynamicMessage;
use std::collections::BTreeMap;
use std::fmt;

/// A dynamic value for any protobuf field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    /// int32, sint32, sfixed32.
    I32(i32),
    /// int64, sint64, sfixed64.
    I64(i64),
    /// uint32, fixed32.
    U32(u32),
    /// uint64, fixed64.
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Enum field, stored by number (open enum).
    EnumNumber(i32),
    Message(DynamicMessage),
    List(List),
    Map(Map),
}

impl Value {
    /// Zero value of a singular field of the given kind.
    pub fn default_for_kind(kind: &Kind) -> Self {
        match kind {
            Kind::Double => Self::F64(0.0),
            Kind::Float => Self::F32(0.0),
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Self::I32(0),
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Self::I64(0),
            Kind::Uint32 | Kind::Fixed32 => Self::U32(0),
            Kind::Uint64 | Kind::Fixed64 => Self::U64(0),
            Kind::Bool => Self::Bool(false),
            Kind::String => Self::String(String::new()),
            Kind::Bytes => Self::Bytes(Vec::new()),
            Kind::Enum(e) => Self::EnumNumber(e.default_number()),
            Kind::Message(m) => Self::Message(DynamicMessage::new(m.clone())),
        }
    }

    /// What `get` returns for a field with no stored entry: the zero value,
    /// an empty message, or an empty list/map bound to `field`.
    pub fn default_for(field: &FieldDescriptor) -> Self {
        if let Some(map) = Map::new(field) {
            return Self::Map(map);
        }
        if field.is_list() {
            return Self::List(List::new(field));
        }
        Self::default_for_kind(&field.kind())
    }

    /// True when the variant fits a singular value of `kind`.
    pub fn is_valid_for_kind(&self, kind: &Kind) -> bool {
        match (self, kind) {
            (Self::F64(_), Kind::Double)
            | (Self::F32(_), Kind::Float)
            | (Self::I32(_), Kind::Int32 | Kind::Sint32 | Kind::Sfixed32)
            | (Self::I64(_), Kind::Int64 | Kind::Sint64 | Kind::Sfixed64)
            | (Self::U32(_), Kind::Uint32 | Kind::Fixed32)
            | (Self::U64(_), Kind::Uint64 | Kind::Fixed64)
            | (Self::Bool(_), Kind::Bool)
            | (Self::String(_), Kind::String)
            | (Self::Bytes(_), Kind::Bytes)
            | (Self::EnumNumber(_), Kind::Enum(_)) => true,
            (Self::Message(m), Kind::Message(d)) => m.descriptor() == d,
            _ => false,
        }
    }

    /// Zero scalars and empty containers are indistinguishable from unset.
    /// Messages always count as present.
    pub(crate) fn is_default(&self) -> bool {
        match self {
            Self::Bool(v) => !v,
            Self::I32(v) | Self::EnumNumber(v) => *v == 0,
            Self::I64(v) => *v == 0,
            Self::U32(v) => *v == 0,
            Self::U64(v) => *v == 0,
            Self::F32(v) => v.to_bits() == 0,
            Self::F64(v) => v.to_bits() == 0,
            Self::String(v) => v.is_empty(),
            Self::Bytes(v) => v.is_empty(),
            Self::Message(_) => false,
            Self::List(l) => l.is_empty(),
            Self::Map(m) => m.is_empty(),
        }
    }

    /// Variant name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::EnumNumber(_) => "enum",
            Self::Message(_) => "message",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Check that `self` may be stored in `field` as a whole.
    pub(crate) fn check_for_field(&self, field: &FieldDescriptor) -> Result<(), MessageError> {
        let fits = match self {
            Self::Map(map) => field.is_map() && map.field() == field,
            Self::List(list) => field.is_list() && list.field() == field,
            single => !field.is_list() && !field.is_map() && single.is_valid_for_kind(&field.kind()),
        };
        if fits {
            return self.check_elements();
        }
        let got = match self {
            Self::Message(m) => m.descriptor().full_name().to_string(),
            Self::List(l) => format!("list for {}", l.field().full_name()),
            Self::Map(m) => format!("map for {}", m.field().full_name()),
            other => other.type_name().to_string(),
        };
        Err(MessageError::TypeMismatch {
            field: field.full_name(),
            expected: expected_name(field),
            got,
        })
    }

    /// Every element of a container must match the kinds it is bound to.
    fn check_elements(&self) -> Result<(), MessageError> {
        match self {
            Self::List(list) => {
                if let Some(bad) = list.iter().find(|v| !v.is_valid_for_kind(list.kind())) {
                    return Err(element_mismatch(list.field(), list.kind(), bad));
                }
            }
            Self::Map(map) => {
                for (key, value) in map {
                    if !key.is_valid_for_kind(map.key_kind()) {
                        return Err(MessageError::TypeMismatch {
                            field: map.field().full_name(),
                            expected: map.key_kind().name(),
                            got: key.type_name().to_string(),
                        });
                    }
                    if !value.is_valid_for_kind(map.value_kind()) {
                        return Err(element_mismatch(map.field(), map.value_kind(), value));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::F32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_enum_number(&self) -> Option<i32> {
        match self {
            Self::EnumNumber(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Self::Message(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_message_mut(&mut self) -> Option<&mut DynamicMessage> {
        match self {
            Self::Message(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut List> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_message(self) -> Option<DynamicMessage> {
        match self {
            Self::Message(v) => Some(v),
            _ => None,
        }
    }
}

fn expected_name(field: &FieldDescriptor) -> String {
    if let Some((key, value)) = field.map_entry_fields().filter(|_| field.is_map()) {
        return format!("map<{}, {}>", key.kind().name(), value.kind().name());
    }
    if field.is_list() {
        return format!("repeated {}", field.kind().name());
    }
    field.kind().name()
}

fn element_mismatch(field: &FieldDescriptor, kind: &Kind, value: &Value) -> MessageError {
    MessageError::TypeMismatch {
        field: field.full_name(),
        expected: kind.name(),
        got: match value {
            Value::Message(m) => m.descriptor().full_name().to_string(),
            other => other.type_name().to_string(),
        },
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<DynamicMessage> for Value {
    fn from(v: DynamicMessage) -> Self {
        Self::Message(v)
    }
}

impl From<List> for Value {
    fn from(v: List) -> Self {
        Self::List(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Self::Map(v)
    }
}

impl From<MapKey> for Value {
    fn from(key: MapKey) -> Self {
        match key {
            MapKey::Bool(v) => Self::Bool(v),
            MapKey::I32(v) => Self::I32(v),
            MapKey::I64(v) => Self::I64(v),
            MapKey::U32(v) => Self::U32(v),
            MapKey::U64(v) => Self::U64(v),
            MapKey::String(v) => Self::String(v),
        }
    }
}

// ---------------------------------------------------------------------------
// MapKey
// ---------------------------------------------------------------------------

/// Map key. Equality and ordering are by value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    String(String),
}

impl MapKey {
    /// Zero key for a map whose key field has `kind`.
    pub fn default_for_kind(kind: &Kind) -> Option<Self> {
        match kind {
            Kind::Bool => Some(Self::Bool(false)),
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Some(Self::I32(0)),
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Some(Self::I64(0)),
            Kind::Uint32 | Kind::Fixed32 => Some(Self::U32(0)),
            Kind::Uint64 | Kind::Fixed64 => Some(Self::U64(0)),
            Kind::String => Some(Self::String(String::new())),
            _ => None,
        }
    }

    /// Convert a scalar value into a key.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(Self::Bool(v)),
            Value::I32(v) => Some(Self::I32(v)),
            Value::I64(v) => Some(Self::I64(v)),
            Value::U32(v) => Some(Self::U32(v)),
            Value::U64(v) => Some(Self::U64(v)),
            Value::String(v) => Some(Self::String(v)),
            _ => None,
        }
    }

    pub fn is_valid_for_kind(&self, kind: &Kind) -> bool {
        matches!(
            (self, kind),
            (Self::Bool(_), Kind::Bool)
                | (Self::I32(_), Kind::Int32 | Kind::Sint32 | Kind::Sfixed32)
                | (Self::I64(_), Kind::Int64 | Kind::Sint64 | Kind::Sfixed64)
                | (Self::U32(_), Kind::Uint32 | Kind::Fixed32)
                | (Self::U64(_), Kind::Uint64 | Kind::Fixed64)
                | (Self::String(_), Kind::String)
        )
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::String(_) => "string",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::I32(v) => write!(f, "{}", v),
            Self::I64(v) => write!(f, "{}", v),
            Self::U32(v) => write!(f, "{}", v),
            Self::U64(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<bool> for MapKey {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for MapKey {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for MapKey {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<u32> for MapKey {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<u64> for MapKey {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<String> for MapKey {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for MapKey {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Elements of a repeated field, in append order.
#[derive(Clone, PartialEq)]
pub struct List {
    field: FieldDescriptor,
    kind: Kind,
    items: Vec<Value>,
}

impl List {
    pub(crate) fn new(field: &FieldDescriptor) -> Self {
        Self {
            field: field.clone(),
            kind: field.kind(),
            items: Vec::new(),
        }
    }

    /// Field this list belongs to.
    pub fn field(&self) -> &FieldDescriptor {
        &self.field
    }

    /// Element kind.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append an element. Fails without modifying the list when the value
    /// does not match the element kind.
    pub fn append(&mut self, value: impl Into<Value>) -> Result<(), MessageError> {
        let value = value.into();
        if !value.is_valid_for_kind(&self.kind) {
            return Err(element_mismatch(&self.field, &self.kind, &value));
        }
        self.items.push(value);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<&Value, MessageError> {
        self.items.get(index).ok_or(MessageError::IndexOutOfBounds {
            index,
            length: self.items.len(),
        })
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<(), MessageError> {
        let length = self.items.len();
        if index >= length {
            return Err(MessageError::IndexOutOfBounds { index, length });
        }
        let value = value.into();
        if !value.is_valid_for_kind(&self.kind) {
            return Err(element_mismatch(&self.field, &self.kind, &value));
        }
        self.items[index] = value;
        Ok(())
    }

    /// Keep the first `len` elements.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Decoder fast path: the value was produced for this element kind.
    pub(crate) fn push_unchecked(&mut self, value: Value) {
        self.items.push(value);
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<Value> {
        &mut self.items
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Entries of a map field, iterated in ascending key order.
#[derive(Clone, PartialEq)]
pub struct Map {
    field: FieldDescriptor,
    key_kind: Kind,
    value_kind: Kind,
    entries: BTreeMap<MapKey, Value>,
}

impl Map {
    /// Empty map for `field`, `None` if it is not a map field.
    pub(crate) fn new(field: &FieldDescriptor) -> Option<Self> {
        if !field.is_map() {
            return None;
        }
        let (key, value) = field.map_entry_fields()?;
        Some(Self {
            field: field.clone(),
            key_kind: key.kind(),
            value_kind: value.kind(),
            entries: BTreeMap::new(),
        })
    }

    /// Field this map belongs to.
    pub fn field(&self) -> &FieldDescriptor {
        &self.field
    }

    pub fn key_kind(&self) -> &Kind {
        &self.key_kind
    }

    pub fn value_kind(&self) -> &Kind {
        &self.value_kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or overwrite an entry, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<MapKey>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, MessageError> {
        let key = key.into();
        let value = value.into();
        if !key.is_valid_for_kind(&self.key_kind) {
            return Err(MessageError::TypeMismatch {
                field: self.field.full_name(),
                expected: self.key_kind.name(),
                got: key.type_name().to_string(),
            });
        }
        if !value.is_valid_for_kind(&self.value_kind) {
            return Err(element_mismatch(&self.field, &self.value_kind, &value));
        }
        Ok(self.entries.insert(key, value))
    }

    pub fn get(&self, key: &MapKey) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &MapKey) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Visit entries in key order until `visitor` returns `false`.
    pub fn range<F>(&self, mut visitor: F)
    where
        F: FnMut(&MapKey, &Value) -> bool,
    {
        for (key, value) in &self.entries {
            if !visitor(key, value) {
                break;
            }
        }
    }

    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, MapKey, Value> {
        self.entries.iter()
    }

    pub(crate) fn insert_unchecked(&mut self, key: MapKey, value: Value) {
        self.entries.insert(key, value);
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a MapKey, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, MapKey, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
