//! The schema-less record layer of the wire format.
//!
//! An encoded message is nothing more than a concatenation of records, each one being a
//! varint key (`field_number << 3 | wire_type`) followed by a payload whose length can be
//! determined from the wire type alone. That is what lets a decoder skip fields it
//! has never heard of.
use std::fmt;

use bytes::BufMut;

mod varint;

pub use varint::Varint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed varint: ran out of bytes before the varint ended, or it overflowed 64 bits")]
    MalformedVarint,
    #[error("truncated message: record declared {expected} bytes, but only {found} remain")]
    TruncatedMessage { expected: u64, found: usize },
    #[error("encountered unknown wire type: {0}")]
    UnknownWireType(u8),
    #[error("invalid field number {0}, must be within 1..={max}", max = Key::MAX_FIELD_NUMBER)]
    InvalidFieldNumber(u64),
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WireType {
    Varint = 0,
    /// Only ever skipped, no [`FieldType`] maps to it.
    ///
    /// [`FieldType`]: crate::schema::FieldType
    Bits64 = 1,
    LengthDelimited = 2,
    /// Only ever skipped, no [`FieldType`] maps to it.
    ///
    /// [`FieldType`]: crate::schema::FieldType
    Bits32 = 5,
}

impl WireType {
    const MASK: u8 = 0b111;

    pub const fn from_bits(bits: u8) -> Result<Self, DecodeError> {
        match bits & Self::MASK {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Bits64),
            2 => Ok(Self::LengthDelimited),
            5 => Ok(Self::Bits32),
            // 3 and 4 are the deprecated group markers, 6 and 7 were never assigned.
            unknown => Err(DecodeError::UnknownWireType(unknown)),
        }
    }
}

/// The leading varint of every record.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    field_number: u32,
    wire_type: WireType,
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("field_number", &self.field_number)
            .field("wire_type", &self.wire_type)
            .finish()
    }
}

impl Key {
    pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

    /// `field_number` must already be validated, which is the case for any number that
    /// came out of a [`SchemaDescriptor`].
    ///
    /// [`SchemaDescriptor`]: crate::schema::SchemaDescriptor
    #[inline]
    pub const fn new(field_number: u32, wire_type: WireType) -> Self {
        debug_assert!(field_number != 0 && field_number <= Self::MAX_FIELD_NUMBER);
        Self {
            field_number,
            wire_type,
        }
    }

    pub const fn field_number(&self) -> u32 {
        self.field_number
    }

    pub const fn wire_type(&self) -> WireType {
        self.wire_type
    }

    pub const fn to_varint(&self) -> Varint {
        Varint::from_u64(((self.field_number as u64) << 3) | self.wire_type as u64)
    }

    pub const fn encoded_len(&self) -> usize {
        self.to_varint().encoded_len()
    }

    pub fn encode<B>(&self, dst: &mut B) -> usize
    where
        B: BufMut + ?Sized,
    {
        self.to_varint().encode(dst)
    }

    pub fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        let raw = Varint::decode(buf)?.as_u64();

        let wire_type = WireType::from_bits(raw as u8)?;
        let field_number = raw >> 3;

        if field_number == 0 || field_number > Self::MAX_FIELD_NUMBER as u64 {
            return Err(DecodeError::InvalidFieldNumber(field_number));
        }

        Ok(Self {
            field_number: field_number as u32,
            wire_type,
        })
    }
}

/// A record payload, borrowed from the buffer being decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    Varint(Varint),
    Bits64(u64),
    LengthDelimited(&'a [u8]),
    Bits32(u32),
}

impl<'a> Payload<'a> {
    pub const fn wire_type(&self) -> WireType {
        match self {
            Self::Varint(_) => WireType::Varint,
            Self::Bits64(_) => WireType::Bits64,
            Self::LengthDelimited(_) => WireType::LengthDelimited,
            Self::Bits32(_) => WireType::Bits32,
        }
    }

    pub fn decode(wire_type: WireType, buf: &mut &'a [u8]) -> Result<Self, DecodeError> {
        match wire_type {
            WireType::Varint => Varint::decode(buf).map(Self::Varint),
            WireType::Bits64 => {
                let bytes = take(buf, 8)?;
                let mut array = [0; 8];
                array.copy_from_slice(bytes);
                Ok(Self::Bits64(u64::from_le_bytes(array)))
            }
            WireType::LengthDelimited => {
                let len = Varint::decode(buf)?.as_u64();
                take(buf, len).map(Self::LengthDelimited)
            }
            WireType::Bits32 => {
                let bytes = take(buf, 4)?;
                let mut array = [0; 4];
                array.copy_from_slice(bytes);
                Ok(Self::Bits32(u32::from_le_bytes(array)))
            }
        }
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Varint(varint) => varint.encoded_len(),
            Self::Bits64(_) => std::mem::size_of::<u64>(),
            Self::LengthDelimited(delim) => {
                Varint::from_u64(delim.len() as u64).encoded_len() + delim.len()
            }
            Self::Bits32(_) => std::mem::size_of::<u32>(),
        }
    }

    pub fn encode<B>(&self, dst: &mut B) -> usize
    where
        B: BufMut + ?Sized,
    {
        match self {
            Self::Varint(varint) => varint.encode(dst),
            Self::Bits64(int) => {
                dst.put_u64_le(*int);
                std::mem::size_of::<u64>()
            }
            Self::LengthDelimited(delim) => {
                let encoded_len = Varint::from_u64(delim.len() as u64).encode(dst);
                dst.put_slice(delim);
                encoded_len + delim.len()
            }
            Self::Bits32(int) => {
                dst.put_u32_le(*int);
                std::mem::size_of::<u32>()
            }
        }
    }
}

/// Splits `len` bytes off the front of `buf`.
fn take<'a>(buf: &mut &'a [u8], len: u64) -> Result<&'a [u8], DecodeError> {
    let found = buf.len();

    match usize::try_from(len) {
        Ok(len) if len <= found => {
            let (taken, rest) = buf.split_at(len);
            *buf = rest;
            Ok(taken)
        }
        _ => Err(DecodeError::TruncatedMessage {
            expected: len,
            found,
        }),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WireRecord<'a> {
    key: Key,
    payload: Payload<'a>,
}

impl fmt::Debug for WireRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:?}): {:?}",
            self.key.field_number, self.key.wire_type, self.payload
        )
    }
}

impl<'a> WireRecord<'a> {
    pub const fn new(field_number: u32, payload: Payload<'a>) -> Self {
        Self {
            key: Key::new(field_number, payload.wire_type()),
            payload,
        }
    }

    pub const fn key(&self) -> Key {
        self.key
    }

    pub const fn field_number(&self) -> u32 {
        self.key.field_number
    }

    pub const fn wire_type(&self) -> WireType {
        self.key.wire_type
    }

    pub const fn payload(&self) -> &Payload<'a> {
        &self.payload
    }

    pub fn decode(buf: &mut &'a [u8]) -> Result<Self, DecodeError> {
        let key = Key::decode(buf)?;
        let payload = Payload::decode(key.wire_type, buf)?;
        Ok(Self { key, payload })
    }

    pub fn encoded_len(&self) -> usize {
        self.key.encoded_len() + self.payload.encoded_len()
    }

    pub fn encode<B>(&self, dst: &mut B) -> usize
    where
        B: BufMut + ?Sized,
    {
        self.key.encode(dst) + self.payload.encode(dst)
    }
}

/// Iterates over the records in an encoded message, stopping after the first error.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    buf: &'a [u8],
    failed: bool,
}

impl<'a> Records<'a> {
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, failed: false }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<WireRecord<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.buf.is_empty() {
            return None;
        }

        let result = WireRecord::decode(&mut self.buf);
        self.failed = result.is_err();
        Some(result)
    }
}

impl std::iter::FusedIterator for Records<'_> {}
