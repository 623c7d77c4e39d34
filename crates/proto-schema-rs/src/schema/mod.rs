//! Immutable descriptions of message types.
//!
//! A [`SchemaDescriptor`] is built once (usually into a `static`, see the crate docs) and
//! then shared read-only by every [`Builder`], [`Message`] and decode of that type.
//! Compatibility between two versions of a schema only ever depends on field numbers, never
//! on the order fields were declared in.
//!
//! [`Builder`]: crate::Builder
//! [`Message`]: crate::Message
use std::fmt;
use std::sync::Arc;

use fxhash::FxHashMap;

mod enum_type;
mod field;

pub use enum_type::{EnumDescriptor, EnumVariant};
pub use field::{Cardinality, FieldDescriptor, FieldType};

use crate::wire::Key;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("{schema}: field number {number} is used more than once")]
    DuplicateFieldNumber { schema: Box<str>, number: u32 },
    #[error("{schema}: field name '{name}' is used more than once")]
    DuplicateFieldName { schema: Box<str>, name: Box<str> },
    #[error("{schema}: field number {number} is outside of 1..={max}", max = Key::MAX_FIELD_NUMBER)]
    InvalidFieldNumber { schema: Box<str>, number: u32 },
    #[error("enum {enum_name} has no variant numbered 0")]
    MissingZeroVariant { enum_name: Box<str> },
    #[error("enum {enum_name}: variant '{variant}' reuses a name or number")]
    DuplicateVariant {
        enum_name: Box<str>,
        variant: Box<str>,
    },
    #[error("enum {enum_name}: catch-all {number} is not a declared variant")]
    InvalidCatchAll { enum_name: Box<str>, number: i32 },
    #[error("{schema}: default for field '{field}' is not a valid {expected}")]
    InvalidDefault {
        schema: Box<str>,
        field: Box<str>,
        expected: Box<str>,
    },
}

pub struct SchemaDescriptor {
    name: Box<str>,
    /// sorted by field number
    fields: Box<[FieldDescriptor]>,
    by_name: FxHashMap<Box<str>, usize>,
}

impl fmt::Debug for SchemaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

// `by_name` is derived from `fields`, so it's left out.
impl PartialEq for SchemaDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}

impl SchemaDescriptor {
    pub fn builder(name: impl Into<Box<str>>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields, in ascending field number order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, number: u32) -> Option<&FieldDescriptor> {
        self.index_of(number).map(|idx| &self.fields[idx])
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index_of_name(name).map(|idx| &self.fields[idx])
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.fields.iter().filter(|field| field.is_required())
    }

    pub(crate) fn index_of(&self, number: u32) -> Option<usize> {
        self.fields
            .binary_search_by_key(&number, FieldDescriptor::number)
            .ok()
    }

    pub(crate) fn index_of_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}

#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: Box<str>,
    fields: Vec<FieldDescriptor>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = FieldDescriptor>,
    {
        self.fields.extend(fields);
        self
    }

    pub fn build(self) -> Result<Arc<SchemaDescriptor>, SchemaError> {
        let Self { name, mut fields } = self;

        fields.sort_by_key(FieldDescriptor::number);

        for field in fields.iter() {
            if field.number() == 0 || field.number() > Key::MAX_FIELD_NUMBER {
                return Err(SchemaError::InvalidFieldNumber {
                    schema: name,
                    number: field.number(),
                });
            }

            let valid_default = match (field.ty(), field.default()) {
                (_, None) => true,
                (FieldType::Message(_), Some(_)) => false,
                (_, Some(default)) => field.check(default).is_ok(),
            };

            if !valid_default {
                return Err(SchemaError::InvalidDefault {
                    schema: name,
                    field: field.name().into(),
                    expected: field.ty().to_string().into_boxed_str(),
                });
            }
        }

        if let Some(pair) = fields.windows(2).find(|pair| pair[0].number() == pair[1].number()) {
            return Err(SchemaError::DuplicateFieldNumber {
                number: pair[0].number(),
                schema: name,
            });
        }

        let mut by_name = FxHashMap::default();
        by_name.reserve(fields.len());

        for (idx, field) in fields.iter().enumerate() {
            if by_name.insert(Box::from(field.name()), idx).is_some() {
                return Err(SchemaError::DuplicateFieldName {
                    schema: name,
                    name: field.name().into(),
                });
            }
        }

        Ok(Arc::new(SchemaDescriptor {
            name,
            fields: fields.into_boxed_slice(),
            by_name,
        }))
    }
}
