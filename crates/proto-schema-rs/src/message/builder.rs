use std::sync::Arc;

use super::{Message, validate};
use crate::codec::{self, DecodeOptions};
use crate::schema::{FieldDescriptor, FieldType, SchemaDescriptor};
use crate::{Error, Result, Value};

/// Mutable staging area for a [`Message`].
///
/// Every assignment is checked against the schema as it happens, so the staged values are
/// always well typed. Required fields are only checked once, in [`Builder::build`], which
/// means fields can be set in any order.
///
/// A builder can only be built once. Afterwards every method that touches the staged
/// values fails with [`Error::BuilderAlreadyConsumed`].
#[derive(Debug, Clone)]
pub struct Builder {
    schema: Arc<SchemaDescriptor>,
    staged: Option<Box<[Option<Value>]>>,
}

impl From<&Message> for Builder {
    fn from(message: &Message) -> Self {
        Self {
            schema: Arc::clone(message.schema()),
            staged: Some(message.values.clone()),
        }
    }
}

impl Builder {
    pub fn new(schema: &Arc<SchemaDescriptor>) -> Self {
        Self {
            schema: Arc::clone(schema),
            staged: Some(std::iter::repeat_n(None, schema.len()).collect()),
        }
    }

    pub fn schema(&self) -> &Arc<SchemaDescriptor> {
        &self.schema
    }

    pub fn is_consumed(&self) -> bool {
        self.staged.is_none()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_consumed() {
            return Err(Error::BuilderAlreadyConsumed);
        }

        Ok(())
    }

    fn staged_mut(&mut self) -> Result<&mut [Option<Value>]> {
        self.staged
            .as_deref_mut()
            .ok_or(Error::BuilderAlreadyConsumed)
    }

    fn lookup(&self, number: u32) -> Result<usize> {
        self.schema
            .index_of(number)
            .ok_or_else(|| Error::unknown_field(self.schema.name(), number))
    }

    fn set_at(&mut self, idx: usize, value: Value) -> Result<&mut Self> {
        self.schema.fields()[idx].check(&value)?;
        self.staged_mut()?[idx] = Some(value);
        Ok(self)
    }

    /// Assigns a value to the field `number`.
    pub fn set(&mut self, number: u32, value: impl Into<Value>) -> Result<&mut Self> {
        self.ensure_live()?;
        let idx = self.lookup(number)?;
        self.set_at(idx, value.into())
    }

    pub fn set_by_name(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.ensure_live()?;
        let idx = self
            .schema
            .index_of_name(name)
            .ok_or_else(|| Error::unknown_field(self.schema.name(), name))?;

        self.set_at(idx, value.into())
    }

    /// Assigns an enum field by variant name.
    pub fn set_enum_by_name(&mut self, number: u32, variant: &str) -> Result<&mut Self> {
        self.ensure_live()?;
        let idx = self.lookup(number)?;
        let field = &self.schema.fields()[idx];

        let FieldType::Enum(ref desc) = *field.ty() else {
            return Err(Error::TypeMismatch {
                number,
                expected: field.ty().to_string().into_boxed_str(),
                found: "enum",
            });
        };

        let Some(variant) = desc.variant_by_name(variant) else {
            return Err(Error::UnknownEnumVariant {
                number,
                enum_name: desc.name().into(),
                variant: variant.into(),
            });
        };

        let value = Value::Enum(variant.number());
        self.set_at(idx, value)
    }

    /// Clears an optional field, so it resolves to its default on build.
    ///
    /// Required fields can never be nulled. That fails here, rather than later in
    /// [`Builder::build`].
    pub fn set_null(&mut self, number: u32) -> Result<&mut Self> {
        self.ensure_live()?;
        let idx = self.lookup(number)?;
        let field = &self.schema.fields()[idx];

        if field.is_required() {
            return Err(Error::InvalidAssignment {
                number,
                name: field.name().into(),
            });
        }

        self.staged_mut()?[idx] = None;
        Ok(self)
    }

    /// The value currently staged for `number`, if any.
    pub fn get(&self, number: u32) -> Option<&Value> {
        let idx = self.schema.index_of(number)?;
        self.staged.as_deref()?[idx].as_ref()
    }

    /// Required fields that haven't been set yet.
    pub fn missing_required(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        let staged = self.staged.as_deref().unwrap_or_default();

        self.schema
            .fields()
            .iter()
            .zip(staged)
            .filter(|(field, slot)| field.is_required() && slot.is_none())
            .map(|(field, _)| field)
    }

    /// Whether [`Builder::build`] would pass the required field check.
    pub fn is_initialized(&self) -> bool {
        !self.is_consumed() && self.missing_required().next().is_none()
    }

    /// Decodes `bytes` on top of the staged values. A field present on the wire replaces
    /// whatever was staged for it, fields absent on the wire are left alone.
    ///
    /// On error the staged values are left in an unspecified, but well typed, state.
    pub fn merge_from(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.merge_from_with(bytes, &DecodeOptions::default())
    }

    pub fn merge_from_with(&mut self, bytes: &[u8], options: &DecodeOptions) -> Result<&mut Self> {
        self.ensure_live()?;
        options.check_size(bytes.len())?;

        let schema = Arc::clone(&self.schema);
        codec::merge_fields(&schema, self.staged_mut()?, bytes, options, 0)?;
        Ok(self)
    }

    /// Consumes the staged values, validating them into a [`Message`].
    ///
    /// The builder is consumed even if validation fails.
    pub fn build(&mut self) -> Result<Message> {
        let staged = self.staged.take().ok_or(Error::BuilderAlreadyConsumed)?;
        validate::validate(&self.schema, staged)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::schema::EnumDescriptor;

    fn schema() -> Arc<SchemaDescriptor> {
        let size = EnumDescriptor::new("Size", [("UNKNOWN", 0), ("SMALL", 1), ("LARGE", 2)])
            .unwrap();

        SchemaDescriptor::builder("JellyBeanV4")
            .field(FieldDescriptor::required(1, "name", FieldType::String))
            .field(FieldDescriptor::required(2, "id", FieldType::Int32))
            .field(FieldDescriptor::optional(3, "size", size))
            .field(FieldDescriptor::optional(4, "blob", FieldType::Bytes))
            .build()
            .unwrap()
    }

    #[test]
    fn test_set_in_any_order() {
        let schema = schema();

        let message = Builder::new(&schema)
            .set(2, 1)
            .unwrap()
            .set_by_name("name", "Liquorish")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(message.get_str(1), Some("Liquorish"));
        assert_eq!(message.get_i32(2), Some(1));
        assert_eq!(message.get_enum(3), Some(0));
        assert_eq!(message.get_bytes(4), Some(&Bytes::new()));
    }

    #[test]
    fn test_type_mismatch() {
        let schema = schema();
        let mut builder = Builder::new(&schema);

        let err = builder.set(2, "one").unwrap_err();
        assert_eq!(
            err,
            Error::TypeMismatch {
                number: 2,
                expected: "int32".into(),
                found: "string",
            }
        );

        // int64 is not silently narrowed into an int32 field
        assert!(matches!(
            builder.set(2, 1_i64),
            Err(Error::TypeMismatch { number: 2, .. })
        ));
        assert!(builder.get(2).is_none());
    }

    #[test]
    fn test_unknown_field() {
        let schema = schema();
        let mut builder = Builder::new(&schema);

        assert!(matches!(builder.set(9, 1), Err(Error::UnknownField { .. })));
        assert!(matches!(
            builder.set_by_name("color", "Red"),
            Err(Error::UnknownField { .. })
        ));
        assert!(matches!(builder.set_null(9), Err(Error::UnknownField { .. })));
    }

    #[test]
    fn test_null_required_fails_at_assignment() {
        let schema = schema();
        let mut builder = Builder::new(&schema);
        builder.set(1, "Liquorish").unwrap();

        let err = builder.set_null(1).unwrap_err();
        assert!(matches!(err, Error::InvalidAssignment { number: 1, .. }));

        // the previously staged value survives
        assert_eq!(builder.get(1), Some(&Value::from("Liquorish")));
    }

    #[test]
    fn test_null_optional_resets_to_default() {
        let schema = schema();

        let message = Builder::new(&schema)
            .set(1, "Liquorish")
            .unwrap()
            .set(2, 3)
            .unwrap()
            .set_enum_by_name(3, "LARGE")
            .unwrap()
            .set_null(3)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(message.get_enum(3), Some(0));
    }

    #[test]
    fn test_enum_assignment() {
        let schema = schema();
        let mut builder = Builder::new(&schema);

        builder.set_enum_by_name(3, "SMALL").unwrap();
        assert_eq!(builder.get(3), Some(&Value::Enum(1)));

        assert!(matches!(
            builder.set(3, Value::Enum(12)),
            Err(Error::UnknownEnumVariant { number: 3, .. })
        ));
        assert!(matches!(
            builder.set_enum_by_name(3, "HUGE"),
            Err(Error::UnknownEnumVariant { number: 3, .. })
        ));
        assert!(matches!(
            builder.set_enum_by_name(1, "SMALL"),
            Err(Error::TypeMismatch { number: 1, .. })
        ));
    }

    #[test]
    fn test_missing_required() {
        let schema = schema();
        let mut builder = Builder::new(&schema);
        builder.set(2, 1).unwrap();

        let missing = builder
            .missing_required()
            .map(FieldDescriptor::number)
            .collect::<Vec<_>>();
        assert_eq!(missing, [1]);
        assert!(!builder.is_initialized());

        let err = builder.build().unwrap_err();
        assert_eq!(err.missing_field(), Some(1));
    }

    #[test]
    fn test_single_use() {
        let schema = schema();
        let mut builder = Builder::new(&schema);
        builder.set(1, "Liquorish").unwrap().set(2, 1).unwrap();

        builder.build().unwrap();

        assert!(builder.is_consumed());
        assert_eq!(builder.build().unwrap_err(), Error::BuilderAlreadyConsumed);
        assert_eq!(builder.set(2, 5).unwrap_err(), Error::BuilderAlreadyConsumed);
        assert_eq!(builder.set_null(3).unwrap_err(), Error::BuilderAlreadyConsumed);

        // consumption is reported ahead of any schema check
        assert_eq!(builder.set(99, 5).unwrap_err(), Error::BuilderAlreadyConsumed);
        assert_eq!(builder.set_by_name("color", "Red").unwrap_err(), Error::BuilderAlreadyConsumed);
        assert_eq!(builder.set(2, "one").unwrap_err(), Error::BuilderAlreadyConsumed);
        assert_eq!(builder.set_null(1).unwrap_err(), Error::BuilderAlreadyConsumed);
        assert_eq!(
            builder.set_enum_by_name(1, "SMALL").unwrap_err(),
            Error::BuilderAlreadyConsumed
        );
        let tight = DecodeOptions::new().with_max_message_size(4);
        assert_eq!(
            builder.merge_from_with(&[0; 8], &tight).unwrap_err(),
            Error::BuilderAlreadyConsumed
        );
        assert_eq!(builder.merge_from(&[]).unwrap_err(), Error::BuilderAlreadyConsumed);
        assert!(!builder.is_initialized());
        assert!(builder.get(1).is_none());
    }

    #[test]
    fn test_failed_build_still_consumes() {
        let schema = schema();
        let mut builder = Builder::new(&schema);

        assert!(builder.build().is_err());
        assert_eq!(builder.build().unwrap_err(), Error::BuilderAlreadyConsumed);
    }

    #[test]
    fn test_from_message() {
        let schema = schema();

        let original = Builder::new(&schema)
            .set(1, "Liquorish")
            .unwrap()
            .set(2, 1)
            .unwrap()
            .build()
            .unwrap();

        let updated = original
            .to_builder()
            .set(2, 2)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(updated.get_str(1), Some("Liquorish"));
        assert_eq!(updated.get_i32(2), Some(2));
        assert_eq!(original.get_i32(2), Some(1));
    }

    #[test]
    fn test_merge_from() {
        let schema = schema();

        let encoded = Builder::new(&schema)
            .set(1, "Liquorish")
            .unwrap()
            .set(2, 1)
            .unwrap()
            .build()
            .unwrap()
            .to_bytes();

        let merged = Builder::new(&schema)
            .set(2, 7)
            .unwrap()
            .set_enum_by_name(3, "LARGE")
            .unwrap()
            .merge_from(&encoded)
            .unwrap()
            .build()
            .unwrap();

        // every field is on the wire (optional ones resolved at build), so they all win
        assert_eq!(merged.get_i32(2), Some(1));
        assert_eq!(merged.get_enum(3), Some(0));
    }
}
