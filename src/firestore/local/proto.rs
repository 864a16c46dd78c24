//! Minimal protocol-buffer wire format support for the locally persisted records.
//!
//! - varint: little-endian base-128, at most 10 bytes
//! - int32/int64: two's complement varint (negative values take 10 bytes)
//! - bytes/string/message: varint(length) + payload
//! - unknown fields are skipped by wire type

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::firestore::error::{data_loss, FirestoreResult};

/// Deepest group nesting accepted while skipping unknown fields.
const MAX_GROUP_DEPTH: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    StartGroup,
    EndGroup,
    Fixed32,
}

impl WireType {
    fn from_bits(bits: u64) -> FirestoreResult<Self> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            other => Err(data_loss(format!("invalid wire type {other}"))),
        }
    }

    fn bits(self) -> u64 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::StartGroup => 3,
            WireType::EndGroup => 4,
            WireType::Fixed32 => 5,
        }
    }
}

#[derive(Default)]
pub(crate) struct ProtoWriter {
    buffer: BytesMut,
}

impl ProtoWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn finish(self) -> Bytes {
        self.buffer.freeze()
    }

    fn write_varint(&mut self, mut value: u64) {
        loop {
            let low7 = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buffer.put_u8(low7);
                return;
            }
            self.buffer.put_u8(low7 | 0x80);
        }
    }

    fn write_tag(&mut self, field: u32, wire_type: WireType) {
        self.write_varint(((field as u64) << 3) | wire_type.bits());
    }

    /// Writes an int32 field, omitting the proto3 default.
    pub(crate) fn int32(&mut self, field: u32, value: i32) {
        self.int64(field, value as i64);
    }

    /// Writes an int64 field, omitting the proto3 default.
    pub(crate) fn int64(&mut self, field: u32, value: i64) {
        if value == 0 {
            return;
        }
        self.write_tag(field, WireType::Varint);
        self.write_varint(value as u64);
    }

    /// Writes a bytes field, omitting the proto3 default.
    pub(crate) fn bytes(&mut self, field: u32, value: &[u8]) {
        if value.is_empty() {
            return;
        }
        self.length_delimited(field, value);
    }

    /// Writes a string field, omitting the proto3 default.
    pub(crate) fn string(&mut self, field: u32, value: &str) {
        self.bytes(field, value.as_bytes());
    }

    /// Writes an element of a repeated string field. Empty elements are kept.
    pub(crate) fn repeated_string(&mut self, field: u32, value: &str) {
        self.length_delimited(field, value.as_bytes());
    }

    /// Writes an embedded message, even when its encoding is empty.
    pub(crate) fn message(&mut self, field: u32, encoded: &[u8]) {
        self.length_delimited(field, encoded);
    }

    fn length_delimited(&mut self, field: u32, value: &[u8]) {
        self.write_tag(field, WireType::LengthDelimited);
        self.write_varint(value.len() as u64);
        self.buffer.put_slice(value);
    }
}

/// A decoded field value. Length-delimited payloads borrow from the input.
#[derive(Debug)]
pub(crate) enum FieldValue<'a> {
    Varint(u64),
    LengthDelimited(&'a [u8]),
    /// Fixed-width or group fields; never used by the persisted schema.
    Skipped,
}

impl<'a> FieldValue<'a> {
    pub(crate) fn as_int32(&self, name: &str) -> FirestoreResult<i32> {
        // int32 is sign-extended on the wire; truncation matches protobuf decoders.
        self.as_int64(name).map(|value| value as i32)
    }

    pub(crate) fn as_int64(&self, name: &str) -> FirestoreResult<i64> {
        match self {
            FieldValue::Varint(value) => Ok(*value as i64),
            _ => Err(data_loss(format!("expected varint for field {name}"))),
        }
    }

    pub(crate) fn as_bytes(&self, name: &str) -> FirestoreResult<&'a [u8]> {
        match self {
            FieldValue::LengthDelimited(payload) => Ok(*payload),
            _ => Err(data_loss(format!(
                "expected length-delimited value for field {name}"
            ))),
        }
    }

    pub(crate) fn as_string(&self, name: &str) -> FirestoreResult<&'a str> {
        let payload = self.as_bytes(name)?;
        std::str::from_utf8(payload)
            .map_err(|err| data_loss(format!("field {name} is not valid UTF-8: {err}")))
    }
}

pub(crate) struct ProtoReader<'a> {
    input: &'a [u8],
}

impl<'a> ProtoReader<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    fn read_varint(&mut self) -> FirestoreResult<u64> {
        let mut result: u64 = 0;
        for index in 0..10 {
            if !self.input.has_remaining() {
                return Err(data_loss("truncated varint"));
            }
            let byte = self.input.get_u8();
            if index == 9 && byte > 0x01 {
                return Err(data_loss("varint overflows 64 bits"));
            }
            result |= ((byte & 0x7f) as u64) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(data_loss("varint longer than 10 bytes"))
    }

    fn take(&mut self, len: u64) -> FirestoreResult<&'a [u8]> {
        if len > self.input.remaining() as u64 {
            return Err(data_loss(format!(
                "length {len} exceeds remaining {} bytes",
                self.input.remaining()
            )));
        }
        let input: &'a [u8] = self.input;
        let (head, tail) = input.split_at(len as usize);
        self.input = tail;
        Ok(head)
    }

    fn read_tag(&mut self) -> FirestoreResult<(u32, WireType)> {
        let key = self.read_varint()?;
        let field = key >> 3;
        if field == 0 || field > u32::MAX as u64 >> 3 {
            return Err(data_loss(format!("invalid field number {field}")));
        }
        Ok((field as u32, WireType::from_bits(key & 0x07)?))
    }

    fn skip_group(&mut self, field: u32, depth: usize) -> FirestoreResult<()> {
        if depth >= MAX_GROUP_DEPTH {
            return Err(data_loss(format!("group {field} nested too deep")));
        }
        loop {
            if !self.input.has_remaining() {
                return Err(data_loss(format!("unterminated group {field}")));
            }
            let (inner, wire_type) = self.read_tag()?;
            match wire_type {
                WireType::EndGroup if inner == field => return Ok(()),
                WireType::EndGroup => {
                    return Err(data_loss(format!("mismatched end of group {inner}")))
                }
                other => {
                    self.read_value(inner, other, depth + 1)?;
                }
            }
        }
    }

    fn read_value(
        &mut self,
        field: u32,
        wire_type: WireType,
        depth: usize,
    ) -> FirestoreResult<FieldValue<'a>> {
        match wire_type {
            WireType::Varint => self.read_varint().map(FieldValue::Varint),
            WireType::LengthDelimited => {
                let len = self.read_varint()?;
                self.take(len).map(FieldValue::LengthDelimited)
            }
            WireType::Fixed64 => self.take(8).map(|_| FieldValue::Skipped),
            WireType::Fixed32 => self.take(4).map(|_| FieldValue::Skipped),
            WireType::StartGroup => self
                .skip_group(field, depth)
                .map(|_| FieldValue::Skipped),
            WireType::EndGroup => Err(data_loss(format!("unexpected end of group {field}"))),
        }
    }

    /// Returns the next field, or `None` at the end of the input.
    pub(crate) fn next_field(&mut self) -> FirestoreResult<Option<(u32, FieldValue<'a>)>> {
        if !self.input.has_remaining() {
            return Ok(None);
        }
        let (field, wire_type) = self.read_tag()?;
        let value = self.read_value(field, wire_type, 0)?;
        Ok(Some((field, value)))
    }
}
