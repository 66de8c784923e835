//! An append/consume queue of byte fragments.
//!
//! [ChunkList] stores appended fragments without copying them. Bytes are logically removed from
//! the front with [ChunkList::consume]; fully consumed fragments are dropped and a partially
//! consumed head fragment is tracked with an offset. Reads that fall inside a single fragment are
//! zero-copy, and only ranges that straddle fragments are copied into a new allocation.

use crate::{number::at_least, Encoding, Error, Number, Value};
use bytes::{Buf, Bytes, BytesMut};
use std::{
    collections::VecDeque,
    ops::{Bound, RangeBounds},
};

/// An ordered queue of immutable byte fragments.
#[derive(Clone, Debug, Default)]
pub struct ChunkList {
    /// Enqueued fragments. Never holds an empty fragment.
    fragments: VecDeque<Bytes>,
    /// Sum of the lengths of all enqueued fragments.
    total: usize,
    /// Bytes consumed from the head fragment but not yet dropped.
    offset: usize,
}

impl ChunkList {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of unconsumed bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.total - self.offset
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of fragments currently enqueued.
    pub fn fragments(&self) -> usize {
        self.fragments.len()
    }

    /// Appends a fragment at the tail.
    pub fn append(&mut self, fragment: impl Into<Bytes>) {
        let fragment = fragment.into();
        if fragment.is_empty() {
            return;
        }
        self.total += fragment.len();
        self.fragments.push_back(fragment);
    }

    /// Moves every unconsumed fragment of `other` to the tail, in order.
    ///
    /// Fragment data is shared, not copied.
    pub fn append_list(&mut self, mut other: ChunkList) {
        other.normalize();
        self.total += other.total;
        self.fragments.extend(other.fragments);
    }

    /// Replaces a partially consumed head fragment by its unconsumed tail.
    fn normalize(&mut self) {
        if self.offset == 0 {
            return;
        }
        if let Some(head) = self.fragments.front_mut() {
            head.advance(self.offset);
        }
        self.total -= self.offset;
        self.offset = 0;
    }

    /// Removes `n` bytes from the front.
    pub fn consume(&mut self, n: usize) -> Result<(), Error> {
        let available = self.len();
        if n > available {
            return Err(Error::Underrun {
                requested: n,
                available,
            });
        }
        let mut remaining = n;
        while let Some(head) = self.fragments.front() {
            let head_len = head.len() - self.offset;
            if remaining < head_len {
                self.offset += remaining;
                break;
            }
            remaining -= head_len;
            self.total -= head.len();
            self.offset = 0;
            self.fragments.pop_front();
        }
        Ok(())
    }

    /// Returns the byte at logical `index`, or `None` if the list is empty.
    ///
    /// Indices wrap: `-1` is the last byte and `len() + 1` is the second one.
    pub fn byte_at(&self, index: isize) -> Option<u8> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        let mut i = wrap(index, len);
        let mut skip = self.offset;
        for fragment in &self.fragments {
            let visible = fragment.len() - skip;
            if i < visible {
                return Some(fragment[skip + i]);
            }
            i -= visible;
            skip = 0;
        }
        None
    }

    /// Returns the bytes in `range`, clamped to the current length.
    ///
    /// A range inside one fragment shares that fragment's memory; a range spanning several
    /// fragments is copied into a single new allocation. Empty or out-of-range requests return an
    /// empty [Bytes].
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Bytes {
        let len = self.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        }
        .min(len);
        if start >= end {
            return Bytes::new();
        }

        // Translate to physical positions within the fragment queue.
        let mut start = start + self.offset;
        let mut end = end + self.offset;
        let mut fragments = self.fragments.iter();
        let mut first = None;
        for fragment in fragments.by_ref() {
            if start < fragment.len() {
                first = Some(fragment);
                break;
            }
            start -= fragment.len();
            end -= fragment.len();
        }
        let Some(first) = first else {
            return Bytes::new();
        };
        if end <= first.len() {
            return first.slice(start..end);
        }

        let mut out = BytesMut::with_capacity(end - start);
        out.extend_from_slice(&first[start..]);
        end -= first.len();
        for fragment in fragments {
            let take = end.min(fragment.len());
            out.extend_from_slice(&fragment[..take]);
            end -= take;
            if end == 0 {
                break;
            }
        }
        out.freeze()
    }

    /// Returns the first logical index at or after `offset` holding `byte`.
    ///
    /// `offset` wraps like [ChunkList::byte_at]. The scan runs to the end of the list and does
    /// not wrap around.
    pub fn index_of(&self, byte: u8, offset: isize) -> Option<usize> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        let target = wrap(offset, len);
        let mut base = 0;
        let mut skip = self.offset;
        for fragment in &self.fragments {
            let visible = &fragment[skip..];
            skip = 0;
            if base + visible.len() <= target {
                base += visible.len();
                continue;
            }
            let from = target.saturating_sub(base);
            if let Some(pos) = visible[from..].iter().position(|&b| b == byte) {
                return Some(base + from + pos);
            }
            base += visible.len();
        }
        None
    }

    /// Decodes the bytes in `range` as a string.
    pub fn to_string(
        &self,
        range: impl RangeBounds<usize>,
        encoding: Encoding,
    ) -> Result<String, Error> {
        encoding.decode(&self.slice(range))
    }

    /// Returns a reader over the unconsumed bytes, starting `skip` bytes past the front.
    ///
    /// The reader borrows the list and leaves it untouched.
    pub fn reader(&self, skip: usize) -> Reader<'_> {
        let mut reader = Reader {
            fragments: &self.fragments,
            index: 0,
            offset: self.offset,
            remaining: self.len(),
        };
        reader.advance(skip.min(reader.remaining));
        reader
    }

    /// Removes and returns the next `n` bytes.
    pub fn read_buffer(&mut self, n: usize) -> Result<Bytes, Error> {
        at_least(&*self, n)?;
        let buf = self.slice(..n);
        self.consume(n)?;
        Ok(buf)
    }

    /// Removes and returns one number from the front.
    pub fn read_number(&mut self, number: Number) -> Result<Value, Error> {
        at_least(&*self, number.width())?;
        Ok(number.read(self))
    }

    /// Appends a fragment holding exactly the encoding of `value`.
    pub fn write_number(&mut self, number: Number, value: &Value) -> Result<usize, Error> {
        let mut buf = BytesMut::with_capacity(number.width());
        number.write(value, &mut buf)?;
        self.append(buf.freeze());
        Ok(number.width())
    }

    /// Appends `buf` as a fragment, returning its length.
    pub fn write_buffer(&mut self, buf: impl Into<Bytes>) -> usize {
        let buf = buf.into();
        let len = buf.len();
        self.append(buf);
        len
    }
}

impl Buf for ChunkList {
    fn remaining(&self) -> usize {
        self.len()
    }

    fn chunk(&self) -> &[u8] {
        match self.fragments.front() {
            Some(head) => &head[self.offset..],
            None => &[],
        }
    }

    fn advance(&mut self, cnt: usize) {
        assert!(
            cnt <= self.len(),
            "cannot advance past the end of the chunk list"
        );
        let _ = self.consume(cnt);
    }
}

impl From<Bytes> for ChunkList {
    fn from(fragment: Bytes) -> Self {
        let mut list = ChunkList::new();
        list.append(fragment);
        list
    }
}

impl<B: Into<Bytes>> FromIterator<B> for ChunkList {
    fn from_iter<I: IntoIterator<Item = B>>(iter: I) -> Self {
        let mut list = ChunkList::new();
        for fragment in iter {
            list.append(fragment);
        }
        list
    }
}

/// A non-consuming [Buf] view over the unconsumed bytes of a [ChunkList].
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    fragments: &'a VecDeque<Bytes>,
    /// Fragment holding the next byte.
    index: usize,
    /// Position of the next byte within that fragment.
    offset: usize,
    remaining: usize,
}

impl Buf for Reader<'_> {
    fn remaining(&self) -> usize {
        self.remaining
    }

    fn chunk(&self) -> &[u8] {
        match self.fragments.get(self.index) {
            Some(fragment) if self.remaining > 0 => {
                let end = fragment.len().min(self.offset + self.remaining);
                &fragment[self.offset..end]
            }
            _ => &[],
        }
    }

    fn advance(&mut self, mut cnt: usize) {
        assert!(cnt <= self.remaining, "cannot advance past the end of the reader");
        self.remaining -= cnt;
        while cnt > 0 {
            let visible = self.fragments[self.index].len() - self.offset;
            if cnt < visible {
                self.offset += cnt;
                return;
            }
            cnt -= visible;
            self.index += 1;
            self.offset = 0;
        }
        // Land on the next fragment rather than at the end of an exhausted one.
        if let Some(fragment) = self.fragments.get(self.index) {
            if self.offset == fragment.len() {
                self.index += 1;
                self.offset = 0;
            }
        }
    }
}

/// Maps a possibly negative or overflowing index into `0..len`.
fn wrap(index: isize, len: usize) -> usize {
    match isize::try_from(len) {
        Ok(len) => index.rem_euclid(len) as usize,
        // Lists longer than isize::MAX cannot exist in memory.
        Err(_) => index as usize,
    }
}
