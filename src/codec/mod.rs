//! Binary serialization of [`IndexValue`] for host-managed storage.
//!
//! The layout is count-prefixed and self-delimiting: a varint entry
//! count, then per entry a one-byte kind tag, the owner string, the
//! name and descriptor strings for member kinds, and a nested
//! count-prefixed list of (location, count) pairs. Integers are
//! unsigned LEB128 varints; strings are varint-length-prefixed UTF-8.
//!
//! `decode(encode(v)) == v` for every valid value. Decoding rejects
//! truncated or malformed streams with a distinguishable error rather
//! than returning a partial map.

use crate::cancel::{CancelToken, Cancelled};
use crate::index::{IndexValue, LocationCounts, RefKind, SymbolKey};
use thiserror::Error;

/// Bumped on any change to the key shape, the kind enumeration, or the
/// byte layout, so the host can detect incompatible persisted data and
/// rebuild instead of misinterpreting stale bytes.
pub const FORMAT_VERSION: u32 = 1;

const TAG_CLASS: u8 = 0;
const TAG_FIELD: u8 = 1;
const TAG_METHOD: u8 = 2;

/// Fatal per-read decoding failure. Distinguishable from "value
/// absent": the host only calls `decode` on bytes it previously stored.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unexpected end of encoded index value")]
    UnexpectedEof,
    #[error("invalid symbol kind tag {tag}")]
    InvalidKindTag { tag: u8 },
    #[error("invalid UTF-8 in encoded string: {0}")]
    Utf8Decode(#[from] std::string::FromUtf8Error),
    #[error("varint exceeds 32 bits")]
    VarintOverflow,
    #[error("occurrence count of zero is not a valid index entry")]
    ZeroCount,
    #[error("{0} trailing bytes after final entry")]
    TrailingBytes(usize),
    #[error("decoding cancelled")]
    Cancelled(#[from] Cancelled),
}

/// Encode an index value to its binary form.
pub fn encode(value: &IndexValue) -> Vec<u8> {
    let mut out = Vec::new();
    write_varint(&mut out, value.len() as u32);
    for (key, counts) in value.iter() {
        write_key(&mut out, key);
        write_varint(&mut out, counts.len() as u32);
        for (location, count) in counts {
            write_string(&mut out, location);
            write_varint(&mut out, *count);
        }
    }
    out
}

/// Decode an index value from its binary form, polling `cancel` per
/// entry since decode can run on a latency-sensitive path.
pub fn decode(bytes: &[u8], cancel: &CancelToken) -> Result<IndexValue, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let mut value = IndexValue::new();

    let entry_count = cursor.read_varint()?;
    for _ in 0..entry_count {
        cancel.check()?;
        let key = cursor.read_key()?;
        let location_count = cursor.read_varint()?;
        let mut counts = LocationCounts::new();
        for _ in 0..location_count {
            let location = cursor.read_string()?;
            let count = cursor.read_varint()?;
            if count == 0 {
                return Err(DecodeError::ZeroCount);
            }
            counts.insert(location, count);
        }
        value.insert(key, counts);
    }

    if cursor.remaining() != 0 {
        return Err(DecodeError::TrailingBytes(cursor.remaining()));
    }
    Ok(value)
}

fn write_key(out: &mut Vec<u8>, key: &SymbolKey) {
    let tag = match key.kind {
        RefKind::Class => TAG_CLASS,
        RefKind::Field => TAG_FIELD,
        RefKind::Method => TAG_METHOD,
    };
    out.push(tag);
    write_string(out, &key.owner);
    if key.kind != RefKind::Class {
        write_string(out, key.name.as_deref().unwrap_or(""));
        write_string(out, key.descriptor.as_deref().unwrap_or(""));
    }
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    write_varint(out, s.len() as u32);
    out.extend_from_slice(s.as_bytes());
}

fn write_varint(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = *self.data.get(self.pos).ok_or(DecodeError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_varint(&mut self) -> Result<u32, DecodeError> {
        let mut value: u32 = 0;
        let mut shift = 0;
        loop {
            let byte = self.read_u8()?;
            if shift >= 32 || (shift == 28 && byte & 0x70 != 0) {
                return Err(DecodeError::VarintOverflow);
            }
            value |= u32::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_varint()? as usize;
        if len > self.remaining() {
            return Err(DecodeError::UnexpectedEof);
        }
        let bytes = self.data[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(String::from_utf8(bytes)?)
    }

    fn read_key(&mut self) -> Result<SymbolKey, DecodeError> {
        let tag = self.read_u8()?;
        let owner = self.read_string()?;
        match tag {
            TAG_CLASS => Ok(SymbolKey::class_ref(owner)),
            TAG_FIELD => {
                let name = self.read_string()?;
                let descriptor = self.read_string()?;
                Ok(SymbolKey::field_ref(owner, name, descriptor))
            }
            TAG_METHOD => {
                let name = self.read_string()?;
                let descriptor = self.read_string()?;
                Ok(SymbolKey::method_ref(owner, name, descriptor))
            }
            tag => Err(DecodeError::InvalidKindTag { tag }),
        }
    }
}
