use bytes::{Buf, BufMut};

use super::DecodeError;

/// An unsigned base-128 varint.
///
/// Signed integers are stored as their 64 bit two's complement, so negative values always
/// take up the full [`Varint::MAX_LEN`] bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Varint(u64);

impl Varint {
    const MSB: u8 = 1 << 7;
    const MSB_MASK: u8 = !Self::MSB;

    /// The longest a 64 bit varint can be on the wire.
    pub const MAX_LEN: usize = 10;

    pub const fn from_u64(uint: u64) -> Self {
        Self(uint)
    }

    pub const fn from_bool(b: bool) -> Self {
        Self(b as u64)
    }

    pub const fn from_i64(int: i64) -> Self {
        Self(int as u64)
    }

    pub const fn from_i32(int: i32) -> Self {
        // sign extend, so -1i32 and -1i64 share an encoding
        Self(int as i64 as u64)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub const fn as_i64(&self) -> i64 {
        self.0 as i64
    }

    /// Returns [`None`] if the value doesn't fit in an [`i32`].
    pub const fn as_i32(&self) -> Option<i32> {
        let int = self.0 as i64;
        if int >= i32::MIN as i64 && int <= i32::MAX as i64 {
            Some(int as i32)
        } else {
            None
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self.0 {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    pub const fn encoded_len(&self) -> usize {
        let bits = u64::BITS - (self.0 | 1).leading_zeros();
        bits.div_ceil(7) as usize
    }

    /// Writes the varint, returning the number of bytes written.
    pub fn encode<B>(&self, dst: &mut B) -> usize
    where
        B: BufMut + ?Sized,
    {
        let mut value = self.0;
        let mut written = 0;

        loop {
            let byte = (value as u8) & Self::MSB_MASK;
            value >>= 7;
            written += 1;

            if value == 0 {
                dst.put_u8(byte);
                return written;
            }

            dst.put_u8(byte | Self::MSB);
        }
    }

    pub fn decode<B>(buf: &mut B) -> Result<Self, DecodeError>
    where
        B: Buf + ?Sized,
    {
        let mut result = 0_u64;

        for index in 0..Self::MAX_LEN {
            if !buf.has_remaining() {
                return Err(DecodeError::MalformedVarint);
            }

            let byte = buf.get_u8();

            // only the lowest bit of the 10th byte still fits in a u64
            if index == Self::MAX_LEN - 1 && byte > 1 {
                return Err(DecodeError::MalformedVarint);
            }

            result |= u64::from(byte & Self::MSB_MASK) << (7 * index);

            if byte & Self::MSB == 0 {
                return Ok(Self(result));
            }
        }

        Err(DecodeError::MalformedVarint)
    }
}

impl From<u64> for Varint {
    #[inline]
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}
