//! The single gate between staged values and a [`Message`].
//!
//! Staged values are always indexed by the schema's field order, so a value for a field
//! the schema doesn't know about can never reach this point. The decoder drops those as
//! it reads them.
use std::sync::Arc;

use super::Message;
use crate::schema::{Cardinality, SchemaDescriptor};
use crate::{Error, Result};

pub(crate) fn validate(
    schema: &Arc<SchemaDescriptor>,
    mut staged: Box<[Option<crate::Value>]>,
) -> Result<Message> {
    debug_assert_eq!(staged.len(), schema.len());

    for (field, slot) in schema.fields().iter().zip(staged.iter_mut()) {
        if slot.is_some() {
            continue;
        }

        match field.cardinality() {
            // checked against the schema, not the input, so a default on a required
            // field never counts
            Cardinality::Required => {
                tracing::debug!(
                    message = "missing required field",
                    schema = schema.name(),
                    field_number = field.number(),
                    field_name = field.name(),
                );

                return Err(Error::MissingRequiredField {
                    schema: schema.name().into(),
                    number: field.number(),
                    name: field.name().into(),
                });
            }
            Cardinality::Optional => *slot = field.resolve_absent(),
        }
    }

    Ok(Message::from_parts(Arc::clone(schema), staged))
}
