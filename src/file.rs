use std::{io::SeekFrom, path::Path};

use async_std::{
    fs,
    io::{prelude::*, BufReader},
};
use async_trait::async_trait;

use crate::{
    config::Config, index::LineTable, indexer, reserve_tail, Indexable, ReadByLine, Result,
};

/// A wrapper around `async_std::fs::File` which implements `ReadByLine` and holds the line table
/// of the file.
///
/// Owns the descriptor for the whole session. It's closed exactly once, when the `IndexedFile`
/// gets dropped.
#[derive(Debug)]
pub struct IndexedFile {
    inner_file: BufReader<fs::File>,
    index: LineTable,
    /// Offset the reader is positioned at, if known
    pos: Option<u64>,
}

impl IndexedFile {
    /// Open a file read-only and build its line table.
    ///
    /// The file is memory mapped while the table gets built. Once this returns, the mapping is
    /// gone and lines are read through the descriptor.
    pub fn open<P: AsRef<Path>>(path: P, config: &Config) -> Result<IndexedFile> {
        let file = std::fs::File::open(path.as_ref())?;
        let index = indexer::build(&file, config.map_timeout)?;
        Ok(Self::open_custom(file, index))
    }

    /// Use an already open file together with a custom `index`.
    /// Expects the index to be properly built for this file.
    pub fn open_custom(file: std::fs::File, index: LineTable) -> IndexedFile {
        Self {
            inner_file: BufReader::new(fs::File::from(file)),
            index,
            pos: None,
        }
    }

    /// Seeks to `offset` unless the reader is already there
    async fn seek_to(&mut self, offset: u64) -> Result<()> {
        // Reading lines sequentially leaves the reader at the start of the next line
        if self.pos == Some(offset) {
            return Ok(());
        }

        self.pos = None;
        self.inner_file.seek(SeekFrom::Start(offset)).await?;
        self.pos = Some(offset);
        Ok(())
    }
}

impl Indexable for IndexedFile {
    #[inline]
    fn get_index(&self) -> &LineTable {
        &self.index
    }
}

#[async_trait]
impl ReadByLine for IndexedFile {
    async fn read_line_raw(&mut self, line: usize, buf: &mut Vec<u8>) -> Result<usize> {
        let line_ref = self.index.checked_line_ref(line)?;
        let len = line_ref.len();
        let start = buf.len();

        self.seek_to(line_ref.start).await?;
        let tail = reserve_tail(buf, len)?;

        let res = self.inner_file.read_exact(tail).await;
        if let Err(err) = res {
            // Position is unknown after a short read
            self.pos = None;
            buf.truncate(start);
            return Err(err.into());
        }

        self.pos = Some(line_ref.end);
        Ok(len)
    }
}
