use std::sync::Arc;

use bytes::Bytes;

use super::DecodeOptions;
use crate::message::validate;
use crate::schema::{FieldDescriptor, FieldType, SchemaDescriptor};
use crate::wire::{DecodeError, Payload, Records};
use crate::{Error, Message, Result, Value};

/// Decodes and validates a top level message.
pub(crate) fn decode_message(
    schema: &Arc<SchemaDescriptor>,
    bytes: &[u8],
    options: &DecodeOptions,
) -> Result<Message> {
    options.check_size(bytes.len())?;
    decode_nested(schema, bytes, options, 0)
}

fn decode_nested(
    schema: &Arc<SchemaDescriptor>,
    bytes: &[u8],
    options: &DecodeOptions,
    depth: usize,
) -> Result<Message> {
    let mut staged = std::iter::repeat_n(None, schema.len()).collect::<Box<[_]>>();
    merge_fields(schema, &mut staged, bytes, options, depth)?;
    validate::validate(schema, staged)
}

/// Reads every record in `bytes` into `staged`, which is indexed like `schema.fields()`.
///
/// Records for field numbers the schema doesn't declare are skipped, a repeated field
/// number overwrites the earlier value.
pub(crate) fn merge_fields(
    schema: &SchemaDescriptor,
    staged: &mut [Option<Value>],
    bytes: &[u8],
    options: &DecodeOptions,
    depth: usize,
) -> Result<()> {
    let mut records = 0_usize;
    let mut skipped = 0_usize;

    for record in Records::new(bytes) {
        let record = record?;
        records += 1;

        let Some(idx) = schema.index_of(record.field_number()) else {
            tracing::trace!(
                message = "skipping unknown field",
                schema = schema.name(),
                field_number = record.field_number(),
                wire_type = ?record.wire_type(),
            );
            skipped += 1;
            continue;
        };

        let field = &schema.fields()[idx];
        staged[idx] = Some(decode_value(field, record.payload(), options, depth)?);
    }

    tracing::trace!(
        message = "merged records",
        schema = schema.name(),
        records,
        skipped,
    );

    Ok(())
}

fn decode_value(
    field: &FieldDescriptor,
    payload: &Payload<'_>,
    options: &DecodeOptions,
    depth: usize,
) -> Result<Value> {
    let number = field.number();

    match (field.ty(), payload) {
        (FieldType::Int32, Payload::Varint(varint)) => varint
            .as_i32()
            .map(Value::Int32)
            .ok_or(Error::Decode(DecodeError::MalformedVarint)),
        (FieldType::Int64, Payload::Varint(varint)) => Ok(Value::Int64(varint.as_i64())),
        (FieldType::Bool, Payload::Varint(varint)) => {
            varint.as_bool().map(Value::Bool).ok_or(Error::InvalidBool {
                number,
                value: varint.as_u64(),
            })
        }
        (FieldType::Enum(desc), Payload::Varint(varint)) => {
            let raw = varint
                .as_i32()
                .ok_or(Error::Decode(DecodeError::MalformedVarint))?;

            desc.resolve_decoded(raw)
                .map(Value::Enum)
                .ok_or_else(|| Error::UnknownEnumVariant {
                    number,
                    enum_name: desc.name().into(),
                    variant: raw.to_string().into_boxed_str(),
                })
        }
        (FieldType::String, Payload::LengthDelimited(bytes)) => std::str::from_utf8(bytes)
            .map(|s| Value::String(s.to_owned()))
            .map_err(|error| Error::InvalidUtf8 { number, error }),
        (FieldType::Bytes, Payload::LengthDelimited(bytes)) => {
            Ok(Value::Bytes(Bytes::copy_from_slice(bytes)))
        }
        (FieldType::Message(nested), Payload::LengthDelimited(bytes)) => {
            let depth = depth + 1;

            if depth > options.recursion_limit {
                return Err(Error::RecursionLimitExceeded {
                    limit: options.recursion_limit,
                });
            }

            decode_nested(nested, bytes, options, depth).map(|msg| Value::Message(Box::new(msg)))
        }
        (ty, payload) => Err(Error::WireTypeMismatch {
            number,
            expected: ty.wire_type(),
            found: payload.wire_type(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Builder;
    use crate::schema::EnumDescriptor;
    use crate::wire::{Varint, WireRecord};

    fn encode_records(records: &[WireRecord<'_>]) -> Vec<u8> {
        let mut dst = Vec::new();
        for record in records {
            record.encode(&mut dst);
        }
        dst
    }

    fn schema() -> Arc<SchemaDescriptor> {
        let size = EnumDescriptor::new("Size", [("UNKNOWN", 0), ("SMALL", 1), ("LARGE", 2)])
            .unwrap();

        SchemaDescriptor::builder("JellyBean")
            .field(FieldDescriptor::required(1, "name", FieldType::String))
            .field(FieldDescriptor::optional(2, "id", FieldType::Int32))
            .field(FieldDescriptor::optional(3, "size", size))
            .field(FieldDescriptor::optional(4, "sugar_free", FieldType::Bool))
            .build()
            .unwrap()
    }

    #[test]
    fn test_varint_for_string_field() {
        let bytes = encode_records(&[WireRecord::new(1, Payload::Varint(Varint::from_u64(5)))]);

        let err = Message::decode(&schema(), &bytes).unwrap_err();
        assert_eq!(
            err,
            Error::WireTypeMismatch {
                number: 1,
                expected: crate::wire::WireType::LengthDelimited,
                found: crate::wire::WireType::Varint,
            }
        );
    }

    #[test]
    fn test_fixed_width_for_known_field() {
        let bytes = encode_records(&[
            WireRecord::new(1, Payload::LengthDelimited(b"Liquorish")),
            WireRecord::new(2, Payload::Bits32(7)),
        ]);

        let err = Message::decode(&schema(), &bytes).unwrap_err();
        assert!(matches!(err, Error::WireTypeMismatch { number: 2, .. }));
    }

    #[test]
    fn test_unknown_fields_skipped() {
        let bytes = encode_records(&[
            WireRecord::new(9, Payload::Bits64(u64::MAX)),
            WireRecord::new(1, Payload::LengthDelimited(b"Liquorish")),
            WireRecord::new(10, Payload::Bits32(1)),
            WireRecord::new(11, Payload::LengthDelimited(b"\xFF not utf8")),
            WireRecord::new(12, Payload::Varint(Varint::from_u64(u64::MAX))),
        ]);

        let message = Message::decode(&schema(), &bytes).unwrap();
        assert_eq!(message.get_str(1), Some("Liquorish"));
        assert_eq!(message.get_i32(2), Some(0));
    }

    #[test]
    fn test_last_value_wins() {
        let bytes = encode_records(&[
            WireRecord::new(1, Payload::LengthDelimited(b"first")),
            WireRecord::new(1, Payload::LengthDelimited(b"second")),
        ]);

        let message = Message::decode(&schema(), &bytes).unwrap();
        assert_eq!(message.get_str(1), Some("second"));
    }

    #[test]
    fn test_int32_out_of_range() {
        let bytes = encode_records(&[
            WireRecord::new(1, Payload::LengthDelimited(b"Liquorish")),
            WireRecord::new(2, Payload::Varint(Varint::from_i64(i32::MAX as i64 + 1))),
        ]);

        let err = Message::decode(&schema(), &bytes).unwrap_err();
        assert_eq!(err, Error::Decode(DecodeError::MalformedVarint));
    }

    #[test]
    fn test_invalid_bool_and_utf8() {
        let bytes = encode_records(&[
            WireRecord::new(1, Payload::LengthDelimited(b"Liquorish")),
            WireRecord::new(4, Payload::Varint(Varint::from_u64(2))),
        ]);
        assert_eq!(
            Message::decode(&schema(), &bytes).unwrap_err(),
            Error::InvalidBool {
                number: 4,
                value: 2
            }
        );

        let bytes = encode_records(&[WireRecord::new(1, Payload::LengthDelimited(b"\xC3\x28"))]);
        let err = Message::decode(&schema(), &bytes).unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8 { number: 1, .. }));
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_unknown_enum_variant() {
        let bytes = encode_records(&[
            WireRecord::new(1, Payload::LengthDelimited(b"Liquorish")),
            WireRecord::new(3, Payload::Varint(Varint::from_u64(3))),
        ]);

        let err = Message::decode(&schema(), &bytes).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownEnumVariant {
                number: 3,
                enum_name: "Size".into(),
                variant: "3".into(),
            }
        );
    }

    #[test]
    fn test_enum_catch_all() {
        let size = EnumDescriptor::new("Size", [("UNKNOWN", 0), ("SMALL", 1)])
            .unwrap()
            .with_catch_all(0)
            .unwrap();

        let schema = SchemaDescriptor::builder("JellyBean")
            .field(FieldDescriptor::optional(1, "size", size))
            .build()
            .unwrap();

        let bytes = encode_records(&[WireRecord::new(1, Payload::Varint(Varint::from_u64(3)))]);

        let message = Message::decode(&schema, &bytes).unwrap();
        assert_eq!(message.get_enum(1), Some(0));
    }

    #[test]
    fn test_truncated_input() {
        let bytes = encode_records(&[WireRecord::new(1, Payload::LengthDelimited(b"Liquorish"))]);

        let err = Message::decode(&schema(), &bytes[..bytes.len() - 1]).unwrap_err();
        assert_eq!(
            err,
            Error::Decode(DecodeError::TruncatedMessage {
                expected: 9,
                found: 8
            })
        );
    }

    fn nest(depth: usize) -> (Arc<SchemaDescriptor>, Vec<u8>) {
        let mut schema = SchemaDescriptor::builder("Leaf").build().unwrap();
        let mut message = Builder::new(&schema).build().unwrap();

        for level in 0..depth {
            schema = SchemaDescriptor::builder(format!("Level{level}"))
                .field(FieldDescriptor::required(1, "child", schema))
                .build()
                .unwrap();

            message = Builder::new(&schema).set(1, message).unwrap().build().unwrap();
        }

        (schema, message.to_bytes().to_vec())
    }

    #[test]
    fn test_recursion_limit() {
        let (schema, bytes) = nest(5);

        let decoded = Message::decode(&schema, &bytes).unwrap();
        assert_eq!(decoded.to_bytes().as_ref(), bytes.as_slice());

        let options = DecodeOptions::new().with_recursion_limit(5);
        assert!(Message::decode_with(&schema, &bytes, &options).is_ok());

        let options = DecodeOptions::new().with_recursion_limit(4);
        assert_eq!(
            Message::decode_with(&schema, &bytes, &options).unwrap_err(),
            Error::RecursionLimitExceeded { limit: 4 }
        );
    }

    #[test]
    fn test_max_message_size() {
        let bytes = encode_records(&[WireRecord::new(1, Payload::LengthDelimited(b"Liquorish"))]);
        let options = DecodeOptions::new().with_max_message_size(bytes.len() - 1);

        let err = Message::decode_with(&schema(), &bytes, &options).unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { .. }));
    }

    #[test]
    fn test_nested_required_field_checked() {
        let inner = SchemaDescriptor::builder("Inner")
            .field(FieldDescriptor::required(1, "flavor", FieldType::String))
            .build()
            .unwrap();

        let outer = SchemaDescriptor::builder("Outer")
            .field(FieldDescriptor::optional(1, "inner", inner))
            .build()
            .unwrap();

        // an empty nested message is missing "flavor"
        let bytes = encode_records(&[WireRecord::new(1, Payload::LengthDelimited(&[]))]);

        let err = Message::decode(&outer, &bytes).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField { number: 1, .. }));
    }
}
