use itertools::Itertools;

use crate::{error::Error, Result};

/// Line terminator. A line is delimited by this single byte and nothing else.
pub const TERMINATOR: u8 = b'\n';

/// Contains an in-memory line-index
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineTable {
    /// Offset of every terminator byte in file order. The index within the Vec represents the
    /// zero based line-index in the file
    inner: Vec<u64>,
}

impl LineTable {
    /// Create a new LineTable out of terminator offsets. Returns `MalformedIndex` if the offsets
    /// are not strictly increasing.
    pub fn new(offsets: Vec<u64>) -> Result<LineTable> {
        if !offsets.iter().tuple_windows().all(|(a, b)| a < b) {
            return Err(Error::MalformedIndex);
        }

        Ok(Self { inner: offsets })
    }

    /// Build a new table for the text in `data` in a single pass. An unterminated last line is
    /// not part of the table.
    pub fn scan(data: &[u8]) -> Result<LineTable> {
        let mut inner: Vec<u64> = Vec::new();

        for pos in memchr::memchr_iter(TERMINATOR, data) {
            // Grow by hand so an allocation failure surfaces as an error instead of an abort
            if inner.len() == inner.capacity() {
                inner.try_reserve(inner.len().max(64))?;
            }
            inner.push(pos as u64);
        }

        Ok(Self { inner })
    }

    /// Get the offset of the terminator of the zero based `pos`
    #[inline]
    pub fn get(&self, pos: usize) -> Result<u64> {
        self.inner.get(pos).copied().ok_or(Error::OutOfBounds {
            line: pos + 1,
            lines: self.len(),
        })
    }

    /// Returns the byte range of the 1-based `line`, or `None` if `line` is not within
    /// `1..=self.len()`.
    pub fn line_ref(&self, line: usize) -> Option<LineRef> {
        if line == 0 {
            return None;
        }

        let end = *self.inner.get(line - 1)? + 1;
        let start = match line {
            1 => 0,
            _ => self.inner[line - 2] + 1,
        };

        Some(LineRef { start, end })
    }

    /// Same as `line_ref` but reports an out of range `line` as error.
    #[inline]
    pub fn checked_line_ref(&self, line: usize) -> Result<LineRef> {
        self.line_ref(line).ok_or(Error::OutOfBounds {
            line,
            lines: self.len(),
        })
    }

    /// Returns `true` if `line` can be requested from this table.
    #[inline]
    pub fn contains_line(&self, line: usize) -> bool {
        (1..=self.len()).contains(&line)
    }

    /// Returns the amount of terminators found, which is the amount of complete lines.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the table is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the terminator offsets
    #[inline]
    pub fn offsets(&self) -> &[u64] {
        &self.inner
    }
}

/// The half-open byte range `[start, end)` of a single line. `end` is one past the lines
/// terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRef {
    pub start: u64,
    pub end: u64,
}

impl LineRef {
    /// Length of the line in bytes, terminator included
    #[inline]
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// Returns `true` if the range holds no bytes. Ranges taken from a table never do, they
    /// always hold the terminator.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
