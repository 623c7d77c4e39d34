//! A single line, protobuf-text-like [`fmt::Display`] for messages, mostly for logs.
use std::fmt;

use super::Message;
use crate::Value;
use crate::schema::FieldType;

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (field, value)) in self.fields().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }

            f.write_str(field.name())?;

            match value {
                Value::Message(nested) if nested.fields().next().is_none() => {
                    f.write_str(" {}")?
                }
                Value::Message(nested) => write!(f, " {{ {nested} }}")?,
                scalar => {
                    f.write_str(": ")?;
                    write_scalar(f, field.ty(), scalar)?;
                }
            }
        }

        Ok(())
    }
}

fn write_scalar(f: &mut fmt::Formatter<'_>, ty: &FieldType, value: &Value) -> fmt::Result {
    match value {
        Value::Int32(int) => write!(f, "{int}"),
        Value::Int64(int) => write!(f, "{int}"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::String(s) => write!(f, "{s:?}"),
        Value::Bytes(bytes) => write!(f, "\"{}\"", bytes.escape_ascii()),
        Value::Enum(number) => match ty {
            FieldType::Enum(desc) => match desc.variant(*number) {
                Some(variant) => f.write_str(variant.name()),
                None => write!(f, "{number}"),
            },
            _ => write!(f, "{number}"),
        },
        Value::Message(nested) => write!(f, "{{ {nested} }}"),
    }
}
