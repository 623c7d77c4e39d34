use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

mod builder;
mod serialize;
mod text;
pub(crate) mod validate;

pub use builder::Builder;

use crate::codec::{self, DecodeOptions};
use crate::schema::{FieldDescriptor, SchemaDescriptor};
use crate::{Result, Value};

/// An immutable, validated message.
///
/// Every required field is present. Every optional field is present too, holding either
/// the value it was given, its schema default, or the zero value of its type. The one
/// exception is an optional message-typed field, which stays absent unless it was set.
#[derive(Debug, Clone)]
pub struct Message {
    schema: Arc<SchemaDescriptor>,
    /// One slot per schema field, in the same order.
    values: Box<[Option<Value>]>,
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.schema, &other.schema) || self.schema == other.schema)
            && self.values == other.values
    }
}

impl Message {
    pub(crate) fn from_parts(schema: Arc<SchemaDescriptor>, values: Box<[Option<Value>]>) -> Self {
        Self { schema, values }
    }

    pub fn builder(schema: &Arc<SchemaDescriptor>) -> Builder {
        Builder::new(schema)
    }

    /// Decodes a message, using the default [`DecodeOptions`].
    pub fn decode(schema: &Arc<SchemaDescriptor>, bytes: &[u8]) -> Result<Self> {
        Self::decode_with(schema, bytes, &DecodeOptions::default())
    }

    pub fn decode_with(
        schema: &Arc<SchemaDescriptor>,
        bytes: &[u8],
        options: &DecodeOptions,
    ) -> Result<Self> {
        codec::decode_message(schema, bytes, options).inspect_err(|error| {
            tracing::debug!(
                message = "failed to decode message",
                schema = schema.name(),
                len = bytes.len(),
                %error,
            );
        })
    }

    pub fn schema(&self) -> &Arc<SchemaDescriptor> {
        &self.schema
    }

    /// A [`Builder`] pre-populated with this message's values.
    pub fn to_builder(&self) -> Builder {
        Builder::from(self)
    }

    pub fn get(&self, number: u32) -> Option<&Value> {
        let idx = self.schema.index_of(number)?;
        self.values[idx].as_ref()
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let idx = self.schema.index_of_name(name)?;
        self.values[idx].as_ref()
    }

    pub fn get_i32(&self, number: u32) -> Option<i32> {
        self.get(number).and_then(Value::as_i32)
    }

    pub fn get_i64(&self, number: u32) -> Option<i64> {
        self.get(number).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, number: u32) -> Option<bool> {
        self.get(number).and_then(Value::as_bool)
    }

    pub fn get_str(&self, number: u32) -> Option<&str> {
        self.get(number).and_then(Value::as_str)
    }

    pub fn get_bytes(&self, number: u32) -> Option<&Bytes> {
        self.get(number).and_then(Value::as_bytes)
    }

    pub fn get_enum(&self, number: u32) -> Option<i32> {
        self.get(number).and_then(Value::as_enum)
    }

    pub fn get_message(&self, number: u32) -> Option<&Message> {
        self.get(number).and_then(Value::as_message)
    }

    /// Present fields and their values, in ascending field number order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDescriptor, &Value)> + '_ {
        self.schema
            .fields()
            .iter()
            .zip(self.values.iter())
            .filter_map(|(field, value)| Some((field, value.as_ref()?)))
    }

    pub fn encoded_len(&self) -> usize {
        codec::encoded_len(self)
    }

    /// Encodes into `dst`, returning the number of bytes written.
    pub fn encode<B>(&self, dst: &mut B) -> usize
    where
        B: BufMut + ?Sized,
    {
        codec::encode(self, dst)
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut dst);
        dst.freeze()
    }
}
