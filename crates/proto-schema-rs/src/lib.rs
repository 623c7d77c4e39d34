//! Schema driven binary messages that survive schema evolution.
//!
//! Messages are encoded as a flat sequence of tagged records (the protobuf wire format,
//! restricted to varint and length delimited payloads). Compatibility between schema
//! versions hinges entirely on field numbers:
//!
//! - fields a schema doesn't know about are skipped on decode, so old readers accept
//!   messages from newer writers.
//! - required fields are checked against the reading schema, so a reader that
//!   introduced a new required field rejects messages from older writers.
//! - absent optional fields resolve to their schema default, or the zero value of
//!   their type.
//!
//! ```
//! use std::sync::{Arc, LazyLock};
//!
//! use proto_schema_rs::schema::{FieldDescriptor, FieldType, SchemaDescriptor};
//! use proto_schema_rs::{Builder, Error, Message};
//!
//! static JELLY_BEAN_V1: LazyLock<Arc<SchemaDescriptor>> = LazyLock::new(|| {
//!     SchemaDescriptor::builder("JellyBeanV1")
//!         .field(FieldDescriptor::required(1, "name", FieldType::String))
//!         .field(FieldDescriptor::required(2, "id", FieldType::Int32))
//!         .build()
//!         .expect("valid schema")
//! });
//!
//! static JELLY_BEAN_V2: LazyLock<Arc<SchemaDescriptor>> = LazyLock::new(|| {
//!     SchemaDescriptor::builder("JellyBeanV2")
//!         .fields(JELLY_BEAN_V1.fields().iter().cloned())
//!         .field(FieldDescriptor::required(3, "color", FieldType::String))
//!         .build()
//!         .expect("valid schema")
//! });
//!
//! # fn main() -> Result<(), Error> {
//! let v1 = Builder::new(&JELLY_BEAN_V1)
//!     .set(1, "Liquorish")?
//!     .set(2, 1)?
//!     .build()?
//!     .to_bytes();
//!
//! let v2 = Builder::new(&JELLY_BEAN_V2)
//!     .set(1, "Liquorish")?
//!     .set(2, 2)?
//!     .set(3, "Red")?
//!     .build()?
//!     .to_bytes();
//!
//! // old reader, new message: the color is skipped
//! let old = Message::decode(&JELLY_BEAN_V1, &v2)?;
//! assert_eq!(old.get_str(1), Some("Liquorish"));
//!
//! // new reader, old message: color is required, but missing
//! let err = Message::decode(&JELLY_BEAN_V2, &v1).unwrap_err();
//! assert_eq!(err.missing_field(), Some(3));
//! # Ok(())
//! # }
//! ```
mod codec;
mod error;
mod message;
pub mod schema;
mod value;
pub mod wire;

pub type Result<T> = core::result::Result<T, Error>;

pub use codec::DecodeOptions;
pub use error::Error;
pub use message::{Builder, Message};
pub use value::Value;
