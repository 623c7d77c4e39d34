use bytes::BufMut;

use crate::wire::Varint;
use crate::{Message, Value};

pub(crate) fn encoded_len(message: &Message) -> usize {
    message
        .fields()
        .map(|(field, value)| field.key().encoded_len() + payload_len(value))
        .sum()
}

/// Writes one record per present field, in ascending field number order.
pub(crate) fn encode<B>(message: &Message, dst: &mut B) -> usize
where
    B: BufMut + ?Sized,
{
    let mut lens = Vec::new();
    nested_lens(message, &mut lens);
    encode_with(message, &mut lens.into_iter(), dst)
}

/// Collects the encoded length of every nested message, in the order [`encode_with`] visits
/// them, so each subtree is only measured once.
fn nested_lens(message: &Message, lens: &mut Vec<usize>) -> usize {
    let mut total = 0;

    for (field, value) in message.fields() {
        let payload = match value {
            Value::Message(nested) => {
                let slot = lens.len();
                lens.push(0);
                let len = nested_lens(nested, lens);
                lens[slot] = len;
                length_prefixed_len(len)
            }
            scalar => payload_len(scalar),
        };

        total += field.key().encoded_len() + payload;
    }

    total
}

fn encode_with<B>(message: &Message, lens: &mut std::vec::IntoIter<usize>, dst: &mut B) -> usize
where
    B: BufMut + ?Sized,
{
    let mut written = 0;

    for (field, value) in message.fields() {
        written += field.key().encode(dst);

        written += match value {
            Value::Message(nested) => {
                let len = lens.next().unwrap_or_else(|| nested.encoded_len());
                Varint::from_u64(len as u64).encode(dst) + encode_with(nested, lens, dst)
            }
            scalar => encode_payload(scalar, dst),
        };
    }

    written
}

fn length_prefixed_len(len: usize) -> usize {
    Varint::from_u64(len as u64).encoded_len() + len
}

fn payload_len(value: &Value) -> usize {
    match value {
        Value::Int32(int) | Value::Enum(int) => Varint::from_i32(*int).encoded_len(),
        Value::Int64(int) => Varint::from_i64(*int).encoded_len(),
        Value::Bool(_) => 1,
        Value::String(s) => length_prefixed_len(s.len()),
        Value::Bytes(bytes) => length_prefixed_len(bytes.len()),
        Value::Message(nested) => length_prefixed_len(nested.encoded_len()),
    }
}

fn encode_payload<B>(value: &Value, dst: &mut B) -> usize
where
    B: BufMut + ?Sized,
{
    fn encode_delimited<B: BufMut + ?Sized>(bytes: &[u8], dst: &mut B) -> usize {
        let prefix = Varint::from_u64(bytes.len() as u64).encode(dst);
        dst.put_slice(bytes);
        prefix + bytes.len()
    }

    match value {
        Value::Int32(int) | Value::Enum(int) => Varint::from_i32(*int).encode(dst),
        Value::Int64(int) => Varint::from_i64(*int).encode(dst),
        Value::Bool(b) => Varint::from_bool(*b).encode(dst),
        Value::String(s) => encode_delimited(s.as_bytes(), dst),
        Value::Bytes(bytes) => encode_delimited(bytes, dst),
        Value::Message(nested) => {
            Varint::from_u64(nested.encoded_len() as u64).encode(dst) + encode(nested, dst)
        }
    }
}
