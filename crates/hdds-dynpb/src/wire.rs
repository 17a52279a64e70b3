// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protobuf wire format primitives.
//!
//! Tags, ULEB128 varints, zig-zag mapping, fixed-width little-endian values
//! and length-delimited segments. Nothing here knows about descriptors.
//!
//! # Varint encoding
//!
//! - Each byte uses 7 bits for data, bit 7 indicates continuation
//! - Values 0-127 encode in 1 byte
//! - Maximum encoded length for u64 is 10 bytes
//!
//! ```
//! use hdds_dynpb::wire::{decode_varint, encode_varint};
//!
//! let mut buf = Vec::new();
//! encode_varint(300, &mut buf);
//! assert_eq!(buf, [0xAC, 0x02]);
//! assert_eq!(decode_varint(&buf).unwrap(), (300, 2));
//! ```

use crate::error::WireError;

/// Maximum bytes needed to encode a u64 as a varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Largest legal field number (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;

/// Field numbers reserved for the protobuf implementation.
pub const RESERVED_FIELD_NUMBERS: std::ops::RangeInclusive<u32> = 19_000..=19_999;

/// Continuation bit mask (bit 7).
const CONTINUATION_BIT: u8 = 0x80;

/// Data bits mask (bits 0-6).
const DATA_MASK: u8 = 0x7F;

/// Low-level encoding category carried in every tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    /// Decode the low three bits of a tag.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::LengthDelimited),
            3 => Some(Self::StartGroup),
            4 => Some(Self::EndGroup),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }
}

/// Check that a field number may appear in a schema.
pub fn is_valid_field_number(number: u32) -> bool {
    (1..=MAX_FIELD_NUMBER).contains(&number) && !RESERVED_FIELD_NUMBERS.contains(&number)
}

/// Compose a tag from field number and wire type.
#[inline]
pub fn make_tag(number: u32, wire_type: WireType) -> u64 {
    (u64::from(number) << 3) | wire_type as u64
}

/// Append a u64 as ULEB128.
#[inline]
pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let byte = (value & u64::from(DATA_MASK)) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | CONTINUATION_BIT);
    }
}

/// Calculate the number of bytes needed to encode a value.
#[inline]
#[must_use]
pub const fn varint_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decode a ULEB128 varint from the front of `buf`.
///
/// Returns `(value, bytes_consumed)`.
#[inline]
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize), WireError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(WireError::VarintOverflow);
        }

        let data = u64::from(byte & DATA_MASK);

        // 10th byte: only bit 0 still fits in a u64
        if shift == 63 && data > 1 {
            return Err(WireError::VarintOverflow);
        }

        result |= data << shift;

        if byte & CONTINUATION_BIT == 0 {
            return Ok((result, i + 1));
        }

        shift += 7;
    }

    Err(WireError::Truncated {
        need: buf.len() + 1,
        have: buf.len(),
    })
}

/// Zig-zag map a signed 32-bit value (sint32).
#[inline]
pub fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode32`].
#[inline]
pub fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Zig-zag map a signed 64-bit value (sint64).
#[inline]
pub fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode64`].
#[inline]
pub fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Append-only byte sink for encoding.
#[derive(Debug, Default)]
pub struct WireWriter {
    buffer: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn put_varint(&mut self, value: u64) {
        encode_varint(value, &mut self.buffer);
    }

    pub fn put_tag(&mut self, number: u32, wire_type: WireType) {
        self.put_varint(make_tag(number, wire_type));
    }

    pub fn put_fixed32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_fixed64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Length prefix followed by the payload.
    pub fn put_bytes(&mut self, payload: &[u8]) {
        self.put_varint(payload.len() as u64);
        self.buffer.extend_from_slice(payload);
    }

    /// Bytes copied verbatim (preserved unknown fields).
    pub fn put_raw(&mut self, raw: &[u8]) {
        self.buffer.extend_from_slice(raw);
    }
}

/// Cursor over an input buffer.
#[derive(Debug)]
pub struct WireReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Bytes consumed since `start` (a previous [`position`](Self::position)).
    pub fn consumed_since(&self, start: usize) -> &'a [u8] {
        &self.buffer[start.min(self.offset)..self.offset]
    }

    fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], WireError> {
        if count > self.remaining() {
            return Err(WireError::Truncated {
                need: count,
                have: self.remaining(),
            });
        }
        let slice = &self.buffer[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        let (value, consumed) = decode_varint(&self.buffer[self.offset..])?;
        self.offset += consumed;
        Ok(value)
    }

    /// Read a tag, rejecting field number 0 and wire types 6/7.
    pub fn read_tag(&mut self) -> Result<(u32, WireType), WireError> {
        let raw = self.read_varint()?;
        let number = raw >> 3;
        if number == 0 || number > u64::from(MAX_FIELD_NUMBER) {
            return Err(WireError::InvalidFieldNumber(number));
        }
        let wire_bits = (raw & 0x7) as u8;
        let wire_type = WireType::from_raw(wire_bits).ok_or(WireError::InvalidWireType {
            wire_type: wire_bits,
            field_number: number as u32,
        })?;
        Ok((number as u32, wire_type))
    }

    pub fn read_fixed32(&mut self) -> Result<u32, WireError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_fixed64(&mut self) -> Result<u64, WireError> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Read a length prefix and return the segment it covers.
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], WireError> {
        let len = self.read_varint()?;
        let len = usize::try_from(len)
            .map_err(|_| WireError::Malformed(format!("length {} does not fit in memory", len)))?;
        self.read_bytes(len)
    }

    /// Skip the payload of a field whose tag was just read.
    ///
    /// Groups are skipped up to their matching end tag, at most `depth_limit`
    /// levels deep.
    pub fn skip_field(
        &mut self,
        number: u32,
        wire_type: WireType,
        depth_limit: u32,
    ) -> Result<(), WireError> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.read_bytes(8)?;
            }
            WireType::LengthDelimited => {
                self.read_length_delimited()?;
            }
            WireType::Fixed32 => {
                self.read_bytes(4)?;
            }
            WireType::StartGroup => self.skip_group(number, depth_limit)?,
            WireType::EndGroup => {
                return Err(WireError::Malformed(format!(
                    "unexpected end-group tag for field {}",
                    number
                )));
            }
        }
        Ok(())
    }

    fn skip_group(&mut self, number: u32, depth_limit: u32) -> Result<(), WireError> {
        if depth_limit == 0 {
            return Err(WireError::RecursionLimitExceeded(0));
        }
        loop {
            if self.is_empty() {
                return Err(WireError::Malformed(format!(
                    "group {} is not terminated",
                    number
                )));
            }
            let (inner, wire_type) = self.read_tag()?;
            if wire_type == WireType::EndGroup {
                if inner != number {
                    return Err(WireError::Malformed(format!(
                        "end-group {} does not match start-group {}",
                        inner, number
                    )));
                }
                return Ok(());
            }
            self.skip_field(inner, wire_type, depth_limit - 1)?;
        }
    }
}
