//! State shared by every codec invoked during one encode, decode or length calculation.

use crate::{Config, Error, Record, Value};
use std::borrow::Cow;

/// Traversal state threaded through a schema walk.
///
/// The context keeps a stack of the records being walked: the bottom frame is the root record and
/// the top frame is the record whose fields are currently being processed. While encoding, frames
/// borrow the caller's records. While decoding, each frame is the partially built record, so a
/// field can depend on any sibling decoded before it.
#[derive(Clone, Debug, Default)]
pub struct Context<'a> {
    frames: Vec<Cow<'a, Record>>,
    bytes: usize,
    config: Config,
}

impl<'a> Context<'a> {
    pub fn new(config: Config) -> Self {
        Self {
            frames: Vec::new(),
            bytes: 0,
            config,
        }
    }

    /// The outermost record, if the schema is a record.
    pub fn root(&self) -> Option<&Record> {
        self.frames.first().map(|frame| &**frame)
    }

    /// The innermost record being walked.
    pub fn current(&self) -> Option<&Record> {
        self.frames.last().map(|frame| &**frame)
    }

    /// Looks up a field of the current record.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.current()?.get(name)
    }

    /// Bytes processed so far within the current nesting level.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Nesting depth (the number of records being walked).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn add_bytes(&mut self, n: usize) {
        self.bytes += n;
    }

    pub(crate) fn push(&mut self, frame: Cow<'a, Record>) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) -> Option<Record> {
        self.frames.pop().map(Cow::into_owned)
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut Record> {
        self.frames.last_mut().map(Cow::to_mut)
    }

    /// Runs `f` with a fresh byte counter, then restores the counter of this level.
    ///
    /// Returns the result of `f` together with the bytes it accumulated. Record frames are
    /// shared with the child, so sibling lookups keep working inside combinators.
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<(T, usize), Error> {
        let saved = std::mem::take(&mut self.bytes);
        let result = f(self);
        let bytes = std::mem::replace(&mut self.bytes, saved);
        result.map(|value| (value, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames() {
        let outer = Record::from([("a", 1u8)]);
        let mut ctx = Context::new(Config::default());
        assert!(ctx.root().is_none());
        assert!(ctx.get("a").is_none());

        ctx.push(Cow::Borrowed(&outer));
        ctx.push(Cow::Owned(Record::new()));
        ctx.current_mut().unwrap().insert("b", 2u8);

        assert_eq!(ctx.depth(), 2);
        assert_eq!(ctx.root().and_then(|r| r.get("a")), Some(&Value::Int(1)));
        assert_eq!(ctx.get("b"), Some(&Value::Int(2)));
        assert!(ctx.get("a").is_none());

        assert_eq!(ctx.pop(), Some(Record::from([("b", 2u8)])));
        assert_eq!(ctx.get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_nested_counter() {
        let mut ctx = Context::new(Config::default());
        ctx.add_bytes(3);

        let (value, bytes) = ctx
            .nested(|child| {
                assert_eq!(child.bytes(), 0);
                child.add_bytes(5);
                Ok("done")
            })
            .unwrap();
        assert_eq!(value, "done");
        assert_eq!(bytes, 5);
        assert_eq!(ctx.bytes(), 3);

        let result: Result<((), usize), Error> = ctx.nested(|child| {
            child.add_bytes(1);
            Err(Error::InvalidLength(0))
        });
        assert!(result.is_err());
        assert_eq!(ctx.bytes(), 3);
    }
}
