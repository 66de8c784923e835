//! Speculative reads over a [ChunkList].
//!
//! A [Transaction] borrows a list exclusively and reads through a private cursor. Nothing is
//! removed from the list until [Transaction::commit] is called, so a decode that runs out of input
//! can simply drop its transaction and try again once more bytes have been appended.

use crate::{ChunkList, Error, Number, Value};
use bytes::Bytes;
use std::ops::{Bound, RangeBounds};

/// A non-destructive read cursor over a [ChunkList].
#[derive(Debug)]
pub struct Transaction<'a> {
    list: &'a mut ChunkList,
    cursor: usize,
}

impl<'a> Transaction<'a> {
    pub fn new(list: &'a mut ChunkList) -> Self {
        Self { list, cursor: 0 }
    }

    /// Appends a fragment to the bound list.
    pub fn append(&mut self, fragment: impl Into<Bytes>) {
        self.list.append(fragment);
    }

    /// The number of bytes in the bound list, including bytes already read by this transaction.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// The number of bytes read so far.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// The number of bytes that can still be read.
    pub fn remaining(&self) -> usize {
        self.list.len() - self.cursor
    }

    /// Returns the byte `i` positions past the cursor, if buffered.
    pub fn get(&self, i: usize) -> Option<u8> {
        let index = self.cursor.checked_add(i)?;
        if index >= self.list.len() {
            return None;
        }
        self.list.byte_at(isize::try_from(index).ok()?)
    }

    /// Returns the bytes in `range`, relative to the cursor, without advancing.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Bytes {
        let shift = |bound: Bound<&usize>| match bound {
            Bound::Included(&i) => Bound::Included(self.cursor.saturating_add(i)),
            Bound::Excluded(&i) => Bound::Excluded(self.cursor.saturating_add(i)),
            Bound::Unbounded => Bound::Unbounded,
        };
        let start = match shift(range.start_bound()) {
            Bound::Unbounded => Bound::Included(self.cursor),
            bound => bound,
        };
        self.list.slice((start, shift(range.end_bound())))
    }

    /// Returns the position, relative to the cursor, of the first `byte` at or after `offset`.
    pub fn index_of(&self, byte: u8, offset: usize) -> Option<usize> {
        let start = self.cursor.checked_add(offset)?;
        if start >= self.list.len() {
            return None;
        }
        let found = self.list.index_of(byte, isize::try_from(start).ok()?)?;
        Some(found - self.cursor)
    }

    fn ensure(&self, n: usize) -> Result<(), Error> {
        let requested = self.cursor.saturating_add(n);
        let available = self.list.len();
        if requested > available {
            return Err(Error::NotEnoughData {
                requested,
                available,
            });
        }
        Ok(())
    }

    /// Reads the next `n` bytes.
    ///
    /// Fails with [Error::NotEnoughData] (leaving the cursor in place) if fewer are buffered.
    pub fn read_buffer(&mut self, n: usize) -> Result<Bytes, Error> {
        self.ensure(n)?;
        let buf = self.list.slice(self.cursor..self.cursor + n);
        self.cursor += n;
        Ok(buf)
    }

    /// Advances the cursor by `n` bytes without materializing them.
    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        self.ensure(n)?;
        self.cursor += n;
        Ok(())
    }

    /// Reads one number.
    pub fn read_number(&mut self, number: Number) -> Result<Value, Error> {
        self.ensure(number.width())?;
        let mut reader = self.list.reader(self.cursor);
        let value = number.read(&mut reader);
        self.cursor += number.width();
        Ok(value)
    }

    /// Removes every byte read by this transaction from the bound list.
    ///
    /// Returns the number of bytes consumed.
    pub fn commit(self) -> Result<usize, Error> {
        self.list.consume(self.cursor)?;
        Ok(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(fragments: &[&'static [u8]]) -> ChunkList {
        fragments.iter().map(|f| Bytes::from_static(f)).collect()
    }

    #[test]
    fn test_read_and_commit() {
        let mut bl = list(&[&[0x01, 0x02], &[0x03, 0x04, 0x05]]);

        let mut tx = Transaction::new(&mut bl);
        assert_eq!(tx.read_number(Number::U8), Ok(Value::Int(1)));
        assert_eq!(tx.read_number(Number::U16_BE), Ok(Value::Int(0x0203)));
        assert_eq!(tx.position(), 3);
        assert_eq!(tx.remaining(), 2);
        assert_eq!(tx.commit(), Ok(3));

        assert_eq!(bl.len(), 2);
        assert_eq!(bl.slice(..), &[0x04, 0x05][..]);
    }

    #[test]
    fn test_discard_leaves_list_untouched() {
        let mut bl = list(&[b"abc", b"def"]);

        let mut tx = Transaction::new(&mut bl);
        assert_eq!(tx.read_buffer(4), Ok(Bytes::from_static(b"abcd")));
        drop(tx);
        assert_eq!(bl.len(), 6);

        // A new transaction sees the same bytes
        let mut tx = Transaction::new(&mut bl);
        assert_eq!(tx.read_buffer(4), Ok(Bytes::from_static(b"abcd")));
    }

    #[test]
    fn test_not_enough_data() {
        let mut bl = list(&[&[1, 2, 3]]);

        let mut tx = Transaction::new(&mut bl);
        tx.read_buffer(2).unwrap();
        assert_eq!(
            tx.read_buffer(10),
            Err(Error::NotEnoughData {
                requested: 12,
                available: 3
            })
        );
        assert_eq!(tx.position(), 2);
        assert!(tx.read_number(Number::U16_LE).is_err());
        assert_eq!(tx.read_number(Number::U8), Ok(Value::Int(3)));
        drop(tx);

        assert_eq!(bl.len(), 3);
    }

    #[test]
    fn test_relative_access() {
        let mut bl = list(&[&[9, 9, 1], &[0, 2, 0]]);

        let mut tx = Transaction::new(&mut bl);
        tx.skip(2).unwrap();
        assert_eq!(tx.get(0), Some(1));
        assert_eq!(tx.get(3), Some(0));
        assert_eq!(tx.get(4), None);
        assert_eq!(tx.slice(..2), &[1, 0][..]);
        assert_eq!(tx.slice(1..), &[0, 2, 0][..]);
        assert_eq!(tx.index_of(0, 0), Some(1));
        assert_eq!(tx.index_of(0, 2), Some(3));
        assert_eq!(tx.index_of(9, 0), None);
        assert_eq!(tx.index_of(0, 4), None);
    }

    #[test]
    fn test_append_while_reading() {
        let mut bl = list(&[&[0xFF]]);

        let mut tx = Transaction::new(&mut bl);
        assert!(tx.read_number(Number::U16_BE).is_err());
        tx.append(Bytes::from_static(&[0xFE]));
        assert_eq!(tx.len(), 2);
        assert_eq!(tx.read_number(Number::U16_BE), Ok(Value::Int(0xFFFE)));
        assert_eq!(tx.commit(), Ok(2));
        assert!(bl.is_empty());
    }
}
