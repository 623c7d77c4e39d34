//! [`serde::Serialize`] for [`Message`], as a map of field names to values.
//!
//! Enums serialize as their variant name (or their number, for a catch-all'd value with
//! no name), nested messages as nested maps.
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::Message;
use crate::Value;
use crate::schema::FieldType;

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = self.fields().count();
        let mut map = serializer.serialize_map(Some(len))?;

        for (field, value) in self.fields() {
            map.serialize_entry(field.name(), &FieldValue {
                ty: field.ty(),
                value,
            })?;
        }

        map.end()
    }
}

struct FieldValue<'a> {
    ty: &'a FieldType,
    value: &'a Value,
}

impl Serialize for FieldValue<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.value {
            Value::Int32(int) => serializer.serialize_i32(*int),
            Value::Int64(int) => serializer.serialize_i64(*int),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(bytes) => serializer.serialize_bytes(bytes),
            Value::Enum(number) => match self.ty {
                FieldType::Enum(desc) => match desc.variant(*number) {
                    Some(variant) => serializer.serialize_str(variant.name()),
                    None => serializer.serialize_i32(*number),
                },
                _ => serializer.serialize_i32(*number),
            },
            Value::Message(nested) => nested.serialize(serializer),
        }
    }
}
