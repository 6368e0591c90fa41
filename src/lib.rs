//!Index a text file by its lines in a single pass and read arbitrary lines by number

/// In-memory line source sharing the file's boundary math
pub mod bytes;
pub mod config;
/// External line-count sources
pub mod count;
pub mod error;
/// A wrapper around an open file which implements ReadByLine
pub mod file;
/// The line table of files
pub mod index;
pub mod indexer;
pub mod logging;
/// The interactive query loop
pub mod query;
pub mod retry;

pub use bytes::IndexedBytes;
pub use config::Config;
pub use file::IndexedFile;
pub use index::{LineRef, LineTable};

use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, error::Error>;

pub trait Indexable {
    /// Returns a reference to the line table.
    fn get_index(&self) -> &LineTable;

    /// Returns the amount of complete lines. An unterminated last line isn't counted.
    #[inline]
    fn total_lines(&self) -> usize {
        self.get_index().len()
    }
}

/// A trait defining behavior for reading certain lines directly from indexed sources.
/// Line numbers are 1-based.
#[async_trait]
pub trait ReadByLine: Indexable + Send {
    /// Appends the given line, terminator included, to `buf`. Returns the amount of bytes read.
    async fn read_line_raw(&mut self, line: usize, buf: &mut Vec<u8>) -> Result<usize>;

    /// Reads the given line into a new buffer
    async fn read_line(&mut self, line: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_line_raw(line, &mut buf).await?;
        Ok(buf)
    }
}

/// Allocates room for `len` more bytes in `buf` without aborting on allocation failure and
/// returns the freshly zeroed tail.
pub(crate) fn reserve_tail(buf: &mut Vec<u8>, len: usize) -> Result<&mut [u8]> {
    buf.try_reserve_exact(len)?;
    let start = buf.len();
    buf.resize(start + len, 0);
    Ok(&mut buf[start..])
}
