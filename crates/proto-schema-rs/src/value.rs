use bytes::Bytes;

use crate::Message;
use crate::schema::FieldType;

/// A single field value.
///
/// Enums are held as their variant number, the [`EnumDescriptor`] on the field gives
/// them a name.
///
/// [`EnumDescriptor`]: crate::schema::EnumDescriptor
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int32(i32),
    Int64(i64),
    Bool(bool),
    String(String),
    Bytes(Bytes),
    Enum(i32),
    Message(Box<Message>),
}

impl Value {
    /// The implicit value of an absent optional field with no explicit default. Message
    /// fields have none.
    pub fn zero_for(ty: &FieldType) -> Option<Self> {
        match ty {
            FieldType::Int32 => Some(Self::Int32(0)),
            FieldType::Int64 => Some(Self::Int64(0)),
            FieldType::Bool => Some(Self::Bool(false)),
            FieldType::String => Some(Self::String(String::new())),
            FieldType::Bytes => Some(Self::Bytes(Bytes::new())),
            FieldType::Enum(_) => Some(Self::Enum(0)),
            FieldType::Message(_) => None,
        }
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Enum(_) => "enum",
            Self::Message(_) => "message",
        }
    }

    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(int) => Some(*int),
            _ => None,
        }
    }

    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(int) => Some(*int),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub const fn as_enum(&self) -> Option<i32> {
        match self {
            Self::Enum(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(message) => Some(message),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($variant:ident($type:ty)),* $(,)?) => {
        $(
            impl From<$type> for Value {
                #[inline]
                fn from(value: $type) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    Int32(i32),
    Int64(i64),
    Bool(bool),
    String(String),
    String(&str),
    String(Box<str>),
    Bytes(Bytes),
    Bytes(Vec<u8>),
    Message(Message),
    Message(Box<Message>),
}

impl From<&[u8]> for Value {
    #[inline]
    fn from(value: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(value))
    }
}
