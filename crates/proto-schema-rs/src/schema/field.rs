use std::fmt;
use std::sync::Arc;

use super::{EnumDescriptor, SchemaDescriptor};
use crate::value::Value;
use crate::wire::{Key, WireType};
use crate::{Error, Result};

#[derive(Clone, PartialEq)]
pub enum FieldType {
    Int32,
    Int64,
    Bool,
    String,
    Bytes,
    Enum(Arc<EnumDescriptor>),
    Message(Arc<SchemaDescriptor>),
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum(desc) => f.debug_tuple("Enum").field(&desc.name()).finish(),
            Self::Message(schema) => f.debug_tuple("Message").field(&schema.name()).finish(),
            _ => f.write_str(self.type_name()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum(desc) => write!(f, "enum {}", desc.name()),
            Self::Message(schema) => write!(f, "message {}", schema.name()),
            _ => f.write_str(self.type_name()),
        }
    }
}

impl From<EnumDescriptor> for FieldType {
    fn from(value: EnumDescriptor) -> Self {
        Self::Enum(Arc::new(value))
    }
}

impl From<Arc<EnumDescriptor>> for FieldType {
    fn from(value: Arc<EnumDescriptor>) -> Self {
        Self::Enum(value)
    }
}

impl From<Arc<SchemaDescriptor>> for FieldType {
    fn from(value: Arc<SchemaDescriptor>) -> Self {
        Self::Message(value)
    }
}

impl FieldType {
    pub const fn wire_type(&self) -> WireType {
        match self {
            Self::Int32 | Self::Int64 | Self::Bool | Self::Enum(_) => WireType::Varint,
            Self::String | Self::Bytes | Self::Message(_) => WireType::LengthDelimited,
        }
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Enum(_) => "enum",
            Self::Message(_) => "message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Required,
    Optional,
}

#[derive(Clone, PartialEq)]
pub struct FieldDescriptor {
    number: u32,
    name: Box<str>,
    ty: FieldType,
    cardinality: Cardinality,
    default: Option<Value>,
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Field");
        dbg.field("number", &self.number)
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("cardinality", &self.cardinality);

        if let Some(ref default) = self.default {
            dbg.field("default", default);
        }

        dbg.finish()
    }
}

impl FieldDescriptor {
    fn new(number: u32, name: Box<str>, ty: FieldType, cardinality: Cardinality) -> Self {
        Self {
            number,
            name,
            ty,
            cardinality,
            default: None,
        }
    }

    pub fn required(number: u32, name: impl Into<Box<str>>, ty: impl Into<FieldType>) -> Self {
        Self::new(number, name.into(), ty.into(), Cardinality::Required)
    }

    pub fn optional(number: u32, name: impl Into<Box<str>>, ty: impl Into<FieldType>) -> Self {
        Self::new(number, name.into(), ty.into(), Cardinality::Optional)
    }

    /// Sets an explicit default. Only consulted for optional fields, a required field
    /// still has to be set (or be present on the wire) even when it has a default.
    ///
    /// The default is checked against the field type when the schema is built.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub const fn number(&self) -> u32 {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn ty(&self) -> &FieldType {
        &self.ty
    }

    pub const fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub const fn is_required(&self) -> bool {
        matches!(self.cardinality, Cardinality::Required)
    }

    pub const fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub const fn key(&self) -> Key {
        Key::new(self.number, self.ty.wire_type())
    }

    /// The value an absent optional field resolves to. Only message fields can
    /// stay absent.
    pub(crate) fn resolve_absent(&self) -> Option<Value> {
        match self.default {
            Some(ref default) => Some(default.clone()),
            None => Value::zero_for(&self.ty),
        }
    }

    /// Checks that `value` can be stored in this field.
    pub(crate) fn check(&self, value: &Value) -> Result<()> {
        let matches = match (&self.ty, value) {
            (FieldType::Int32, Value::Int32(_))
            | (FieldType::Int64, Value::Int64(_))
            | (FieldType::Bool, Value::Bool(_))
            | (FieldType::String, Value::String(_))
            | (FieldType::Bytes, Value::Bytes(_)) => true,
            (FieldType::Enum(desc), Value::Enum(number)) => {
                if desc.variant(*number).is_none() {
                    return Err(Error::UnknownEnumVariant {
                        number: self.number,
                        enum_name: desc.name().into(),
                        variant: number.to_string().into_boxed_str(),
                    });
                }
                true
            }
            (FieldType::Message(schema), Value::Message(message)) => {
                Arc::ptr_eq(schema, message.schema()) || **schema == **message.schema()
            }
            _ => false,
        };

        if matches {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                number: self.number,
                expected: self.ty.to_string().into_boxed_str(),
                found: value.type_name(),
            })
        }
    }
}
