//! Message level encoding and decoding, on top of [`crate::wire`].
mod decode;
mod encode;

pub(crate) use decode::{decode_message, merge_fields};
pub(crate) use encode::{encode, encoded_len};

use crate::{Error, Result};

/// Limits applied while decoding.
///
/// Implements [`serde::Deserialize`] so it can be embedded in an application's config,
/// any missing keys fall back to [`DecodeOptions::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// How deeply message-typed fields may nest.
    pub recursion_limit: usize,
    /// Inputs longer than this are rejected before any parsing happens.
    pub max_message_size: Option<usize>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeOptions {
    pub const DEFAULT_RECURSION_LIMIT: usize = 100;

    pub const fn new() -> Self {
        Self {
            recursion_limit: Self::DEFAULT_RECURSION_LIMIT,
            max_message_size: None,
        }
    }

    pub const fn with_recursion_limit(mut self, recursion_limit: usize) -> Self {
        self.recursion_limit = recursion_limit;
        self
    }

    pub const fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = Some(max_message_size);
        self
    }

    pub(crate) fn check_size(&self, size: usize) -> Result<()> {
        match self.max_message_size {
            Some(max) if size > max => Err(Error::MessageTooLarge { size, max }),
            _ => Ok(()),
        }
    }
}
