// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protobuf binary encoding/decoding for DynamicMessage.
//!
//! Everything is driven by the message descriptor: the field number gives the
//! tag, the field kind gives the wire type and value encoding, the cardinality
//! selects single, repeated (packed or not) or map-entry layout.
//!
//! Output is deterministic: fields in ascending number order, map entries in
//! ascending key order, preserved unknown fields last in arrival order.

use crate::config::{CodecOptions, UnknownFieldPolicy};
use crate::descriptor::{FieldDescriptor, Kind, MessageDescriptor};
use crate::error::{MessageError, WireError};
use crate::message::DynamicMessage;
use crate::value::{List, Map, MapKey, Value};
use crate::wire::{
    varint_len, zigzag_decode32, zigzag_decode64, zigzag_encode32, zigzag_encode64,
    WireReader, WireType, WireWriter,
};

/// Encode with default options.
pub fn marshal(message: &DynamicMessage) -> Result<Vec<u8>, WireError> {
    marshal_with(message, &CodecOptions::default())
}

/// Encode a message.
///
/// Fails with [`WireError::InvalidOptions`] when `options` do not validate
/// and with [`WireError::ValueRange`] when the encoding would exceed
/// `max_message_size`.
pub fn marshal_with(message: &DynamicMessage, options: &CodecOptions) -> Result<Vec<u8>, WireError> {
    check_options(options)?;
    let len = message_len(message, options);
    let max = options.max_message_size;
    if len > max {
        return Err(WireError::ValueRange {
            what: "message",
            value: len,
            max,
        });
    }
    let mut encoder = Encoder {
        writer: WireWriter::with_capacity(len),
        options,
    };
    encoder.encode_message(message)?;
    Ok(encoder.writer.into_bytes())
}

/// Size in bytes of the default-options encoding.
pub fn encoded_len(message: &DynamicMessage) -> usize {
    message_len(message, &CodecOptions::default())
}

/// Decode with default options.
pub fn unmarshal(bytes: &[u8], descriptor: &MessageDescriptor) -> Result<DynamicMessage, WireError> {
    unmarshal_with(bytes, descriptor, &CodecOptions::default())
}

/// Decode into a fresh message.
///
/// On error the partially decoded message is dropped.
pub fn unmarshal_with(
    bytes: &[u8],
    descriptor: &MessageDescriptor,
    options: &CodecOptions,
) -> Result<DynamicMessage, WireError> {
    let mut message = DynamicMessage::new(descriptor.clone());
    merge(&mut message, bytes, options)?;
    Ok(message)
}

/// Decode `bytes` on top of `message` with protobuf merge semantics.
///
/// On error `message` may be partially updated and should be discarded.
pub fn merge(
    message: &mut DynamicMessage,
    bytes: &[u8],
    options: &CodecOptions,
) -> Result<(), WireError> {
    check_options(options)?;
    if bytes.len() > options.max_message_size {
        return Err(WireError::Malformed(format!(
            "input of {} bytes exceeds max_message_size {}",
            bytes.len(),
            options.max_message_size
        )));
    }
    let decoder = Decoder { options };
    decoder.decode_message(message, bytes, options.recursion_limit)
}

fn check_options(options: &CodecOptions) -> Result<(), WireError> {
    options
        .validate()
        .map_err(|e| WireError::InvalidOptions(e.to_string()))
}

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

fn tag_len(number: u32) -> usize {
    varint_len(u64::from(number) << 3)
}

fn is_packed(field: &FieldDescriptor, options: &CodecOptions) -> bool {
    options.pack_repeated && field.is_packed()
}

fn message_len(message: &DynamicMessage, options: &CodecOptions) -> usize {
    message
        .fields()
        .map(|(field, value)| field_len(&field, value, options))
        .sum::<usize>()
        + message.unknown_fields().len()
}

fn field_len(field: &FieldDescriptor, value: &Value, options: &CodecOptions) -> usize {
    let tag = tag_len(field.number());
    match value {
        Value::List(list) if is_packed(field, options) => {
            if list.is_empty() {
                return 0;
            }
            let payload = packed_len(list, options);
            tag + varint_len(payload as u64) + payload
        }
        Value::List(list) => list
            .iter()
            .map(|item| tag + value_len(list.kind(), item, options))
            .sum(),
        Value::Map(map) => map
            .iter()
            .map(|(key, item)| {
                let entry = entry_len(map, key, item, options);
                tag + varint_len(entry as u64) + entry
            })
            .sum(),
        single => tag + value_len(&field.kind(), single, options),
    }
}

fn packed_len(list: &List, options: &CodecOptions) -> usize {
    list.iter()
        .map(|item| value_len(list.kind(), item, options))
        .sum()
}

fn entry_len(map: &Map, key: &MapKey, value: &Value, options: &CodecOptions) -> usize {
    // key and value tags (#1, #2) are one byte each
    2 + value_len(map.key_kind(), &Value::from(key.clone()), options)
        + value_len(map.value_kind(), value, options)
}

/// Encoded size of a single value, length prefix included.
fn value_len(kind: &Kind, value: &Value, options: &CodecOptions) -> usize {
    match value {
        Value::I32(v) => match kind {
            Kind::Sint32 => varint_len(u64::from(zigzag_encode32(*v))),
            Kind::Sfixed32 => 4,
            _ => varint_len(*v as i64 as u64),
        },
        Value::I64(v) => match kind {
            Kind::Sint64 => varint_len(zigzag_encode64(*v)),
            Kind::Sfixed64 => 8,
            _ => varint_len(*v as u64),
        },
        Value::U32(v) => match kind {
            Kind::Fixed32 => 4,
            _ => varint_len(u64::from(*v)),
        },
        Value::U64(v) => match kind {
            Kind::Fixed64 => 8,
            _ => varint_len(*v),
        },
        Value::F32(_) => 4,
        Value::F64(_) => 8,
        Value::Bool(_) => 1,
        Value::EnumNumber(v) => varint_len(*v as i64 as u64),
        Value::String(v) => varint_len(v.len() as u64) + v.len(),
        Value::Bytes(v) => varint_len(v.len() as u64) + v.len(),
        Value::Message(m) => {
            let len = message_len(m, options);
            varint_len(len as u64) + len
        }
        Value::List(_) | Value::Map(_) => 0,
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

struct Encoder<'o> {
    writer: WireWriter,
    options: &'o CodecOptions,
}

impl Encoder<'_> {
    fn encode_message(&mut self, message: &DynamicMessage) -> Result<(), WireError> {
        for (field, value) in message.fields() {
            self.encode_field(&field, value)?;
        }
        self.writer.put_raw(message.unknown_fields());
        Ok(())
    }

    fn encode_field(&mut self, field: &FieldDescriptor, value: &Value) -> Result<(), WireError> {
        let number = field.number();
        match value {
            Value::List(list) if is_packed(field, self.options) => {
                if list.is_empty() {
                    return Ok(());
                }
                self.writer.put_tag(number, WireType::LengthDelimited);
                self.writer.put_varint(packed_len(list, self.options) as u64);
                for item in list {
                    self.encode_value(field, list.kind(), item)?;
                }
            }
            Value::List(list) => {
                for item in list {
                    self.writer.put_tag(number, list.kind().wire_type());
                    self.encode_value(field, list.kind(), item)?;
                }
            }
            Value::Map(map) => {
                for (key, item) in map {
                    self.writer.put_tag(number, WireType::LengthDelimited);
                    self.writer
                        .put_varint(entry_len(map, key, item, self.options) as u64);
                    let key = Value::from(key.clone());
                    self.writer.put_tag(1, map.key_kind().wire_type());
                    self.encode_value(field, map.key_kind(), &key)?;
                    self.writer.put_tag(2, map.value_kind().wire_type());
                    self.encode_value(field, map.value_kind(), item)?;
                }
            }
            single => {
                let kind = field.kind();
                self.writer.put_tag(number, kind.wire_type());
                self.encode_value(field, &kind, single)?;
            }
        }
        Ok(())
    }

    /// Value bytes without tag.
    fn encode_value(
        &mut self,
        field: &FieldDescriptor,
        kind: &Kind,
        value: &Value,
    ) -> Result<(), WireError> {
        let w = &mut self.writer;
        match value {
            Value::I32(v) => match kind {
                Kind::Sint32 => w.put_varint(u64::from(zigzag_encode32(*v))),
                Kind::Sfixed32 => w.put_fixed32(*v as u32),
                // negative int32 is sign-extended to 10 bytes
                _ => w.put_varint(*v as i64 as u64),
            },
            Value::I64(v) => match kind {
                Kind::Sint64 => w.put_varint(zigzag_encode64(*v)),
                Kind::Sfixed64 => w.put_fixed64(*v as u64),
                _ => w.put_varint(*v as u64),
            },
            Value::U32(v) => match kind {
                Kind::Fixed32 => w.put_fixed32(*v),
                _ => w.put_varint(u64::from(*v)),
            },
            Value::U64(v) => match kind {
                Kind::Fixed64 => w.put_fixed64(*v),
                _ => w.put_varint(*v),
            },
            Value::F32(v) => w.put_fixed32(v.to_bits()),
            Value::F64(v) => w.put_fixed64(v.to_bits()),
            Value::Bool(v) => w.put_varint(u64::from(*v)),
            Value::EnumNumber(v) => w.put_varint(*v as i64 as u64),
            Value::String(v) => w.put_bytes(v.as_bytes()),
            Value::Bytes(v) => w.put_bytes(v),
            Value::Message(m) => {
                w.put_varint(message_len(m, self.options) as u64);
                self.encode_message(m)?;
            }
            Value::List(_) | Value::Map(_) => {
                return Err(WireError::Message(MessageError::TypeMismatch {
                    field: field.full_name(),
                    expected: kind.name(),
                    got: value.type_name().to_string(),
                }));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

struct Decoder<'o> {
    options: &'o CodecOptions,
}

impl Decoder<'_> {
    fn nested(&self, depth: u32) -> Result<u32, WireError> {
        depth
            .checked_sub(1)
            .ok_or(WireError::RecursionLimitExceeded(self.options.recursion_limit))
    }

    fn decode_message(
        &self,
        message: &mut DynamicMessage,
        bytes: &[u8],
        depth: u32,
    ) -> Result<(), WireError> {
        let descriptor = message.descriptor().clone();
        let mut reader = WireReader::new(bytes);
        while !reader.is_empty() {
            let start = reader.position();
            let (number, wire_type) = reader.read_tag()?;
            let field = descriptor.field_by_number(number);
            match field {
                Some(field) if accepts(&field, wire_type) => {
                    self.decode_field(message, &field, wire_type, &mut reader, depth)?;
                }
                known => {
                    self.handle_unknown(
                        message,
                        &descriptor,
                        known.is_some(),
                        number,
                        wire_type,
                        &mut reader,
                        start,
                        depth,
                    )?;
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_unknown(
        &self,
        message: &mut DynamicMessage,
        descriptor: &MessageDescriptor,
        known: bool,
        number: u32,
        wire_type: WireType,
        reader: &mut WireReader<'_>,
        start: usize,
        depth: u32,
    ) -> Result<(), WireError> {
        match self.options.unknown_fields {
            UnknownFieldPolicy::Reject => {
                log::warn!(
                    "[codec] rejecting field {} ({:?}) in {}",
                    number,
                    wire_type,
                    descriptor.full_name()
                );
                if known {
                    return Err(WireError::Malformed(format!(
                        "field {} of {} cannot use wire type {:?}",
                        number,
                        descriptor.full_name(),
                        wire_type
                    )));
                }
                Err(WireError::UnknownFieldNumber {
                    message: descriptor.full_name().to_string(),
                    number,
                })
            }
            UnknownFieldPolicy::Discard => {
                reader.skip_field(number, wire_type, depth)?;
                log::debug!(
                    "[codec] discarded unknown field {} in {}",
                    number,
                    descriptor.full_name()
                );
                Ok(())
            }
            UnknownFieldPolicy::Preserve => {
                reader.skip_field(number, wire_type, depth)?;
                let raw = reader.consumed_since(start);
                log::trace!(
                    "[codec] preserved unknown field {} in {} ({} bytes)",
                    number,
                    descriptor.full_name(),
                    raw.len()
                );
                message.push_unknown(raw);
                Ok(())
            }
        }
    }

    fn decode_field(
        &self,
        message: &mut DynamicMessage,
        field: &FieldDescriptor,
        wire_type: WireType,
        reader: &mut WireReader<'_>,
        depth: u32,
    ) -> Result<(), WireError> {
        let mut current = message.take_or_default(field);
        let result = self.decode_into(&mut current, field, wire_type, reader, depth);
        message.store(field.number(), current);
        result
    }

    fn decode_into(
        &self,
        current: &mut Value,
        field: &FieldDescriptor,
        wire_type: WireType,
        reader: &mut WireReader<'_>,
        depth: u32,
    ) -> Result<(), WireError> {
        match current {
            Value::Map(map) => {
                let payload = reader.read_length_delimited()?;
                let (key, value) = self.decode_map_entry(map, field, payload, depth)?;
                map.insert_unchecked(key, value);
            }
            Value::List(list) => {
                let kind = list.kind().clone();
                if wire_type == WireType::LengthDelimited && kind.is_packable() {
                    let payload = reader.read_length_delimited()?;
                    let mut packed = WireReader::new(payload);
                    while !packed.is_empty() {
                        let item = self.read_value(field, &kind, &mut packed, depth)?;
                        list.push_unchecked(item);
                    }
                } else {
                    let item = self.read_value(field, &kind, reader, depth)?;
                    list.push_unchecked(item);
                }
            }
            Value::Message(existing) => {
                // a repeated occurrence merges into the present message
                let payload = reader.read_length_delimited()?;
                self.decode_message(existing, payload, self.nested(depth)?)?;
            }
            single => {
                *single = self.read_value(field, &field.kind(), reader, depth)?;
            }
        }
        Ok(())
    }

    fn decode_map_entry(
        &self,
        map: &Map,
        field: &FieldDescriptor,
        payload: &[u8],
        depth: u32,
    ) -> Result<(MapKey, Value), WireError> {
        let depth = self.nested(depth)?;
        let key_kind = map.key_kind();
        let value_kind = map.value_kind();
        let mut key = None;
        let mut value = None;

        let mut reader = WireReader::new(payload);
        while !reader.is_empty() {
            let (number, wire_type) = reader.read_tag()?;
            match number {
                1 if wire_type == key_kind.wire_type() => {
                    key = Some(self.read_value(field, key_kind, &mut reader, depth)?);
                }
                2 if wire_type == value_kind.wire_type() => {
                    let next = match value.take() {
                        Some(Value::Message(mut existing)) => {
                            let nested = reader.read_length_delimited()?;
                            self.decode_message(&mut existing, nested, self.nested(depth)?)?;
                            Value::Message(existing)
                        }
                        _ => self.read_value(field, value_kind, &mut reader, depth)?,
                    };
                    value = Some(next);
                }
                _ => reader.skip_field(number, wire_type, depth)?,
            }
        }

        let key = match key {
            Some(key) => MapKey::from_value(key),
            None => MapKey::default_for_kind(key_kind),
        }
        .ok_or_else(|| {
            WireError::Malformed(format!("map {} has an invalid key type", field.full_name()))
        })?;
        let value = value.unwrap_or_else(|| Value::default_for_kind(value_kind));
        Ok((key, value))
    }

    /// One value of `kind`; the tag (if any) has been consumed.
    fn read_value(
        &self,
        field: &FieldDescriptor,
        kind: &Kind,
        reader: &mut WireReader<'_>,
        depth: u32,
    ) -> Result<Value, WireError> {
        Ok(match kind {
            // int32 keeps the low 32 bits of the varint
            Kind::Int32 => Value::I32(reader.read_varint()? as i32),
            Kind::Int64 => Value::I64(reader.read_varint()? as i64),
            Kind::Uint32 => Value::U32(reader.read_varint()? as u32),
            Kind::Uint64 => Value::U64(reader.read_varint()?),
            Kind::Sint32 => Value::I32(zigzag_decode32(reader.read_varint()? as u32)),
            Kind::Sint64 => Value::I64(zigzag_decode64(reader.read_varint()?)),
            Kind::Bool => Value::Bool(reader.read_varint()? != 0),
            Kind::Enum(_) => Value::EnumNumber(reader.read_varint()? as i32),
            Kind::Fixed32 => Value::U32(reader.read_fixed32()?),
            Kind::Sfixed32 => Value::I32(reader.read_fixed32()? as i32),
            Kind::Float => Value::F32(f32::from_bits(reader.read_fixed32()?)),
            Kind::Fixed64 => Value::U64(reader.read_fixed64()?),
            Kind::Sfixed64 => Value::I64(reader.read_fixed64()? as i64),
            Kind::Double => Value::F64(f64::from_bits(reader.read_fixed64()?)),
            Kind::String => {
                let payload = reader.read_length_delimited()?;
                if self.options.validate_utf8 {
                    let text = std::str::from_utf8(payload).map_err(|_| WireError::InvalidUtf8 {
                        field: field.full_name(),
                    })?;
                    Value::String(text.to_string())
                } else {
                    Value::String(String::from_utf8_lossy(payload).into_owned())
                }
            }
            Kind::Bytes => Value::Bytes(reader.read_length_delimited()?.to_vec()),
            Kind::Message(descriptor) => {
                let payload = reader.read_length_delimited()?;
                let mut nested = DynamicMessage::new(descriptor.clone());
                self.decode_message(&mut nested, payload, self.nested(depth)?)?;
                Value::Message(nested)
            }
        })
    }
}

/// Known field arriving with a wire type its kind can be read from.
fn accepts(field: &FieldDescriptor, wire_type: WireType) -> bool {
    let kind = field.kind();
    kind.wire_type() == wire_type
        || (field.is_list() && kind.is_packable() && wire_type == WireType::LengthDelimited)
}
