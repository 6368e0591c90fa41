use std::sync::Arc;

use async_trait::async_trait;

use crate::{index::LineTable, reserve_tail, Indexable, ReadByLine, Result};

/// Bytes held in memory which implement `ReadByLine`, using the same line table and boundary
/// math as `IndexedFile`.
#[derive(Debug, Clone)]
pub struct IndexedBytes {
    data: Arc<[u8]>,
    index: Arc<LineTable>,
}

impl IndexedBytes {
    /// Create a new `IndexedBytes` from unindexed data and build the line table.
    pub fn new<D: Into<Arc<[u8]>>>(data: D) -> Result<IndexedBytes> {
        let data = data.into();
        let index = LineTable::scan(&data)?;
        Ok(Self::new_custom(data, Arc::new(index)))
    }

    /// Create a new `IndexedBytes` using `index` as line table.
    /// Expects the index to be properly built for `data`.
    #[inline]
    pub fn new_custom<D: Into<Arc<[u8]>>>(data: D, index: Arc<LineTable>) -> IndexedBytes {
        Self {
            data: data.into(),
            index,
        }
    }

    /// The raw data, including an unterminated last line if there is one
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Indexable for IndexedBytes {
    #[inline]
    fn get_index(&self) -> &LineTable {
        &self.index
    }
}

#[async_trait]
impl ReadByLine for IndexedBytes {
    async fn read_line_raw(&mut self, line: usize, buf: &mut Vec<u8>) -> Result<usize> {
        let line_ref = self.index.checked_line_ref(line)?;
        let src = &self.data[line_ref.start as usize..line_ref.end as usize];
        reserve_tail(buf, src.len())?.copy_from_slice(src);
        Ok(src.len())
    }
}
