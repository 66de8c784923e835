use crate::Error;
use bytes::Bytes;
use tracing::debug;
use wireform_codec::{encode_into, ChunkList, Schema, Value};

/// Encodes a sequence of values into outbound bytes.
pub struct Encoder {
    schema: Schema,
    buffer: ChunkList,
}

impl Encoder {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            buffer: ChunkList::new(),
        }
    }

    /// Encodes `value` and returns the bytes written for it.
    ///
    /// On error nothing is written.
    pub fn encode(&mut self, value: &Value) -> Result<Bytes, Error> {
        let written = encode_into(value, &self.schema, &mut self.buffer)?;
        let out = self.buffer.slice(..written);
        self.buffer.consume(written)?;
        debug!(written, "encoded value");
        Ok(out)
    }
}
