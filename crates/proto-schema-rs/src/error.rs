use crate::schema::SchemaError;
use crate::wire::{DecodeError, WireType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("field {number} expects wire type {expected:?}, found {found:?}")]
    WireTypeMismatch {
        number: u32,
        expected: WireType,
        found: WireType,
    },
    #[error("field {number}: enum {enum_name} has no variant '{variant}'")]
    UnknownEnumVariant {
        number: u32,
        enum_name: Box<str>,
        variant: Box<str>,
    },
    #[error("field {number} expects a value of type '{expected}', found '{found}'")]
    TypeMismatch {
        number: u32,
        expected: Box<str>,
        found: &'static str,
    },
    #[error("{schema} has no field '{field}'")]
    UnknownField { schema: Box<str>, field: Box<str> },
    #[error("required field {number} ('{name}') cannot be set to null")]
    InvalidAssignment { number: u32, name: Box<str> },
    #[error("{schema} is missing required field {number} ('{name}')")]
    MissingRequiredField {
        schema: Box<str>,
        number: u32,
        name: Box<str>,
    },
    #[error("builder was already consumed by a call to build")]
    BuilderAlreadyConsumed,
    #[error("field {number} is not valid UTF-8: {error}")]
    InvalidUtf8 {
        number: u32,
        error: std::str::Utf8Error,
    },
    #[error("field {number} holds {value}, which is not a valid bool")]
    InvalidBool { number: u32, value: u64 },
    #[error("message nesting exceeds the recursion limit of {limit}")]
    RecursionLimitExceeded { limit: usize },
    #[error("message of {size} bytes exceeds the maximum size of {max} bytes")]
    MessageTooLarge { size: usize, max: usize },
}

impl Error {
    /// Returns true if the error can only come out of decoding bytes, as opposed
    /// to building a message by hand.
    pub const fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::Decode(_)
                | Self::WireTypeMismatch { .. }
                | Self::InvalidUtf8 { .. }
                | Self::InvalidBool { .. }
                | Self::RecursionLimitExceeded { .. }
                | Self::MessageTooLarge { .. }
        )
    }

    /// The field number of a [`Error::MissingRequiredField`].
    pub const fn missing_field(&self) -> Option<u32> {
        match self {
            Self::MissingRequiredField { number, .. } => Some(*number),
            _ => None,
        }
    }

    pub(crate) fn unknown_field(schema: &str, field: impl ToString) -> Self {
        Self::UnknownField {
            schema: schema.into(),
            field: field.to_string().into_boxed_str(),
        }
    }
}
