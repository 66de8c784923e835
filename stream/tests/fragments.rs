use bytes::Bytes;
use test_case::test_case;
use tracing::Level;
use wireform_codec::{
    schema,
    types::{array, boolean, buffer, cstring, uint16be, uint32le, uint8, when},
    Condition, Config, Error as CodecError, Record, Schema, SizeKind, Value,
};
use wireform_stream::{Decoder, Encoder, Error};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::TRACE)
        .try_init();
}

fn packet() -> Schema {
    schema! {
        "seq" => uint32le(),
        "urgent" => boolean(uint8()),
        "deadline" => when(Condition::field("urgent"), uint16be()),
        "topic" => cstring(),
        "payload" => buffer(uint16be()),
        "tags" => array(uint8(), uint8(), SizeKind::Count).unwrap(),
    }
    .unwrap()
}

fn packets() -> Vec<Value> {
    (0..8u32)
        .map(|seq| {
            let mut record = Record::new();
            record.insert("seq", seq);
            record.insert("urgent", seq % 3 == 0);
            if seq % 3 == 0 {
                record.insert("deadline", 1000 + seq);
            }
            record.insert("topic", format!("topic-{seq}"));
            record.insert("payload", Bytes::from(vec![seq as u8; seq as usize * 5]));
            record.insert(
                "tags",
                (0..seq % 4).map(|t| Value::from(t as u8)).collect::<Vec<_>>(),
            );
            Value::Record(record)
        })
        .collect()
}

/// Concatenates the encoding of every value.
fn wire(values: &[Value]) -> Bytes {
    let mut encoder = Encoder::new(packet());
    let mut out = Vec::new();
    for value in values {
        out.extend_from_slice(&encoder.encode(value).unwrap());
    }
    Bytes::from(out)
}

#[test_case(1; "single bytes")]
#[test_case(3; "odd fragments")]
#[test_case(16; "small fragments")]
#[test_case(1 << 16; "whole stream")]
fn test_fragmented_delivery(size: usize) {
    init_logging();
    let values = packets();
    let wire = wire(&values);

    let mut decoder = Decoder::new(packet());
    let mut decoded = Vec::new();
    for chunk in wire.chunks(size) {
        decoded.extend(decoder.feed(wire.slice_ref(chunk)).unwrap());
    }
    assert_eq!(decoded, values);
    assert_eq!(decoder.buffered(), 0);
}

#[test]
fn test_partial_value_is_kept() {
    init_logging();
    let values = packets();
    let wire = wire(&values[..2]);
    let first = Encoder::new(packet()).encode(&values[0]).unwrap().len();

    // Everything up to one byte short of the second value
    let mut decoder = Decoder::new(packet());
    let split = wire.len() - 1;
    assert_eq!(decoder.feed(wire.slice(..split)).unwrap(), values[..1]);
    assert_eq!(decoder.buffered(), split - first);
    assert_eq!(decoder.next_value(), Ok(None));
    assert_eq!(decoder.buffered(), split - first);

    assert_eq!(decoder.feed(wire.slice(split..)).unwrap(), values[1..2]);
    assert_eq!(decoder.buffered(), 0);
}

#[test]
fn test_length_limit() {
    init_logging();
    let values = packets();
    let wire = wire(&values);

    // The largest payload is 35 bytes
    let mut decoder = Decoder::with_config(packet(), Config::new(..=32));
    decoder.push(wire);
    let mut decoded = Vec::new();
    let err = loop {
        match decoder.next_value() {
            Ok(Some(value)) => decoded.push(value),
            Ok(None) => panic!("ran out of input"),
            Err(err) => break err,
        }
    };
    assert_eq!(err, Error::Codec(CodecError::InvalidLength(35)));
    assert_eq!(decoded, values[..7]);

    // The rejected value is still buffered
    let last = Encoder::new(packet()).encode(&values[7]).unwrap();
    assert_eq!(decoder.buffered(), last.len());
}

#[test]
fn test_encoder_rejects_invalid() {
    init_logging();
    let mut encoder = Encoder::new(packet());
    let mut value = packets().remove(1);
    if let Value::Record(record) = &mut value {
        record.insert("topic", "bad\0topic");
    }
    assert!(matches!(
        encoder.encode(&value),
        Err(Error::Codec(CodecError::InvalidValue(..)))
    ));

    // The encoder is still usable
    let value = packets().remove(2);
    let out = encoder.encode(&value).unwrap();
    let mut decoder = Decoder::new(packet());
    assert_eq!(decoder.feed(out).unwrap(), vec![value]);
}
