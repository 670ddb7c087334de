//! Binary wire codec
//!
//! Little-endian fixed-width integers, Bitcoin-style variable-length
//! integers and length-prefixed byte strings. Every ledger entity implements
//! [`Encodable`] and [`Decodable`] on top of [`Writer`] and [`Reader`].

use thiserror::Error;

use crate::crypto::{Hash256, ProgramHash, HASH_SIZE};
use crate::crypto::address::PROGRAM_HASH_SIZE;

/// Upper bound on any single length prefix, to refuse absurd allocations
pub const MAX_VAR_LENGTH: u64 = 32 * 1024 * 1024;

/// Errors raised while decoding binary data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of data")]
    UnexpectedEnd,
    #[error("unread data after complete item ({0} bytes)")]
    UnreadData(usize),
    #[error("length prefix too large: {0}")]
    LengthTooLarge(u64),
    #[error("invalid utf-8 string")]
    InvalidString,
    #[error("unsupported transaction type: {0:#04x}")]
    UnknownTxType(u8),
    #[error("unsupported output type: {0:#04x}")]
    UnknownOutputType(u8),
    #[error("{0}")]
    Malformed(String),
}

/// Types that can be written to the wire
pub trait Encodable {
    fn encode(&self, writer: &mut Writer);

    /// Serialize into a fresh buffer
    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.encode(&mut writer);
        writer.into_inner()
    }

    /// Serialized size in bytes
    fn encoded_size(&self) -> usize {
        self.to_bytes().len()
    }
}

/// Types that can be read from the wire
pub trait Decodable: Sized {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError>;

    /// Decode a complete item; trailing bytes are an error
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(bytes);
        let item = Self::decode(&mut reader)?;
        if reader.is_finished() {
            Ok(item)
        } else {
            Err(CodecError::UnreadData(reader.remaining()))
        }
    }
}

// =============================================================================
// Writer
// =============================================================================

/// Append-only byte sink
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buffer: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Bitcoin-style compact size
    pub fn write_varint(&mut self, value: u64) {
        match value {
            0..=0xfc => self.write_u8(value as u8),
            0xfd..=0xffff => {
                self.write_u8(0xfd);
                self.write_u16(value as u16);
            }
            0x1_0000..=0xffff_ffff => {
                self.write_u8(0xfe);
                self.write_u32(value as u32);
            }
            _ => {
                self.write_u8(0xff);
                self.write_u64(value);
            }
        }
    }

    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.write_raw(bytes);
    }

    pub fn write_var_string(&mut self, value: &str) {
        self.write_var_bytes(value.as_bytes());
    }

    pub fn write_hash(&mut self, hash: &Hash256) {
        self.write_raw(&hash.0);
    }

    pub fn write_program_hash(&mut self, program_hash: &ProgramHash) {
        self.write_raw(&program_hash.0);
    }

    /// Varint count followed by each item
    pub fn write_list<T: Encodable>(&mut self, items: &[T]) {
        self.write_varint(items.len() as u64);
        for item in items {
            item.encode(self);
        }
    }
}

// =============================================================================
// Reader
// =============================================================================

/// Cursor over a byte slice
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Look at the next byte without consuming it
    pub fn peek_u8(&self) -> Result<u8, CodecError> {
        self.data
            .get(self.position)
            .copied()
            .ok_or(CodecError::UnexpectedEnd)
    }

    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return Err(CodecError::UnexpectedEnd);
        }
        let slice = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_raw(N)?);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        let value = self.peek_u8()?;
        self.position += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_varint(&mut self) -> Result<u64, CodecError> {
        match self.read_u8()? {
            0xfd => Ok(self.read_u16()? as u64),
            0xfe => Ok(self.read_u32()? as u64),
            0xff => self.read_u64(),
            small => Ok(small as u64),
        }
    }

    /// Varint that must fit the remaining input
    fn read_length(&mut self) -> Result<usize, CodecError> {
        let len = self.read_varint()?;
        if len > MAX_VAR_LENGTH {
            return Err(CodecError::LengthTooLarge(len));
        }
        Ok(len as usize)
    }

    pub fn read_var_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.read_length()?;
        Ok(self.read_raw(len)?.to_vec())
    }

    pub fn read_var_string(&mut self) -> Result<String, CodecError> {
        String::from_utf8(self.read_var_bytes()?).map_err(|_| CodecError::InvalidString)
    }

    pub fn read_hash(&mut self) -> Result<Hash256, CodecError> {
        Ok(Hash256(self.read_array::<HASH_SIZE>()?))
    }

    pub fn read_program_hash(&mut self) -> Result<ProgramHash, CodecError> {
        Ok(ProgramHash(self.read_array::<PROGRAM_HASH_SIZE>()?))
    }

    pub fn read_list<T: Decodable>(&mut self) -> Result<Vec<T>, CodecError> {
        let count = self.read_length()?;
        // Each item takes at least one byte
        if count > self.remaining() {
            return Err(CodecError::UnexpectedEnd);
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::decode(self)?);
        }
        Ok(items)
    }
}

impl Encodable for Hash256 {
    fn encode(&self, writer: &mut Writer) {
        writer.write_hash(self);
    }
}

impl Decodable for Hash256 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        reader.read_hash()
    }
}

impl Encodable for Vec<u8> {
    fn encode(&self, writer: &mut Writer) {
        writer.write_var_bytes(self);
    }
}

impl Decodable for Vec<u8> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        reader.read_var_bytes()
    }
}
