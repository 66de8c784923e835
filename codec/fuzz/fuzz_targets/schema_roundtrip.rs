#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use wireform_codec::{
    decode, decode_from, encode, encoding_length, schema,
    types::{array, boolean, cstring, reserved, uint16be, uint32le, uint8, when},
    ChunkList, Condition, Record, Schema, SizeKind, Transaction, Value,
};

fn message_schema() -> Schema {
    schema! {
        "id" => uint32le(),
        "flag" => boolean(uint8()),
        "extra" => when(Condition::field("flag"), uint16be()),
        "name" => cstring(),
        "pad" => reserved(uint8(), 2).unwrap(),
        "values" => array(uint16be(), uint8(), SizeKind::Count).unwrap(),
    }
    .unwrap()
}

#[derive(Arbitrary, Debug)]
struct Message {
    id: u32,
    extra: Option<u16>,
    name: Vec<u8>,
    values: Vec<u16>,
}

impl Message {
    fn to_value(&self) -> Value {
        // Terminated ASCII: no zero bytes and no high bit
        let name: String = self.name.iter().map(|b| char::from((b & 0x7F).max(1))).collect();
        let values: Vec<Value> = self.values.iter().take(255).map(|v| Value::from(*v)).collect();
        let mut record = Record::new();
        record.insert("id", self.id);
        record.insert("flag", self.extra.is_some());
        if let Some(extra) = self.extra {
            record.insert("extra", extra);
        }
        record.insert("name", name);
        record.insert("values", Value::Array(values));
        Value::Record(record)
    }
}

#[derive(Arbitrary, Debug)]
enum FuzzInput<'a> {
    // Encode a value and decode it from arbitrarily split fragments
    Message { message: Message, splits: Vec<u8> },
    // Decode untrusted bytes
    Raw(&'a [u8]),
    // Append and consume fragments
    Chunks { fragments: Vec<Vec<u8>>, consume: Vec<u8> },
}

fn roundtrip_message(message: Message, splits: Vec<u8>) {
    let schema = message_schema();
    let value = message.to_value();

    let (list, written) = encode(&value, &schema).expect("failed to encode a valid message");
    assert_eq!(encoding_length(&value, &schema), Ok(written));
    let encoded = list.slice(..);
    assert_eq!(encoded.len(), written);

    let mut buffered = ChunkList::new();
    let mut start = 0;
    for split in splits.into_iter().map(usize::from) {
        if start + split >= encoded.len() {
            break;
        }
        buffered.append(encoded.slice(start..start + split));
        start += split;

        let before = buffered.len();
        let mut tx = Transaction::new(&mut buffered);
        let err = decode_from(&mut tx, &schema).expect_err("decoded a truncated message");
        assert!(err.is_not_enough_data());
        drop(tx);
        assert_eq!(buffered.len(), before);
    }
    buffered.append(encoded.slice(start..));

    let mut tx = Transaction::new(&mut buffered);
    let (decoded, read) = decode_from(&mut tx, &schema).expect("failed to decode message");
    assert_eq!(tx.commit(), Ok(read));
    assert_eq!(read, written);
    assert_eq!(decoded, value);
    assert!(buffered.is_empty());
}

fn decode_raw(data: &[u8]) {
    let schema = message_schema();
    let mut list = ChunkList::new();
    list.append(Bytes::copy_from_slice(data));

    let mut tx = Transaction::new(&mut list);
    match decode_from(&mut tx, &schema) {
        Ok((value, read)) => {
            assert!(read <= data.len());
            assert_eq!(tx.commit(), Ok(read));
            assert_eq!(list.len(), data.len() - read);

            // Padding is zeroed on re-encode, so only the length is preserved
            if let Ok((_, written)) = encode(&value, &schema) {
                assert_eq!(written, read);
            }
        }
        Err(_) => {
            drop(tx);
            assert_eq!(list.len(), data.len());
        }
    }

    // Decoding a plain byte sequence never panics
    let _ = decode(Bytes::copy_from_slice(data), &schema);
}

fn chunk_list(fragments: Vec<Vec<u8>>, consume: Vec<u8>) {
    let mut list = ChunkList::new();
    let mut expected = Vec::new();
    for fragment in fragments {
        expected.extend_from_slice(&fragment);
        list.append(fragment);
    }
    assert_eq!(list.len(), expected.len());
    assert_eq!(list.slice(..), &expected[..]);

    for n in consume.into_iter().map(usize::from) {
        if n > list.len() {
            assert!(list.consume(n).is_err());
            continue;
        }
        list.consume(n).unwrap();
        expected.drain(..n);
        assert_eq!(list.slice(..), &expected[..]);
        if let Some(&last) = expected.last() {
            assert_eq!(list.byte_at(-1), Some(last));
            assert_eq!(list.index_of(last, 0).map(|i| expected[i]), Some(last));
        }
    }
}

fn fuzz(input: FuzzInput) {
    match input {
        FuzzInput::Message { message, splits } => roundtrip_message(message, splits),
        FuzzInput::Raw(data) => decode_raw(data),
        FuzzInput::Chunks { fragments, consume } => chunk_list(fragments, consume),
    }
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
