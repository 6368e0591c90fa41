//! Build phase: map the file, scan it for terminators and release the mapping again.

use std::{
    fs,
    io,
    os::{
        fd::{AsFd, BorrowedFd},
        unix::fs::FileExt,
    },
    time::Duration,
};

use memmap2::Mmap;
use rustix::fs::{fcntl_getfl, fcntl_setfl, OFlags};
use tracing::{debug, warn};

use crate::{
    error::Error,
    index::LineTable,
    retry::{is_would_block, retry_when_ready, wait_readable},
    Result,
};

/// Builds the line table of `file`.
///
/// The file is mapped read-only for the duration of this call only. If mapping fails because
/// the data is temporarily unavailable, waits up to `map_timeout` for the descriptor to become
/// readable and maps once more. Nothing of the mapping escapes, the returned table only holds
/// offsets.
pub fn build(file: &fs::File, map_timeout: Duration) -> Result<LineTable> {
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(Error::Unmappable("not a regular file"));
    }

    let size = metadata.len();

    // Mapping zero bytes is an error on most platforms, an empty file simply has no lines.
    // Pseudo files (procfs, sysfs) report zero length too but do have content.
    if size == 0 {
        if file.read_at(&mut [0u8; 1], 0)? != 0 {
            return Err(Error::Unmappable("file reports zero length but has content"));
        }

        debug!("empty file, nothing to index");
        return Ok(LineTable::default());
    }

    let _non_blocking = NonBlocking::enable(file)?;

    let map = retry_when_ready(
        // SAFETY: the file is opened read-only and the map is dropped before `build` returns.
        // Nothing reads through it after the scan.
        || unsafe { Mmap::map(file) },
        is_would_block,
        |bound| wait_readable(file, bound),
        map_timeout,
    )?;

    let table = LineTable::scan(&map)?;
    drop(map);

    debug!(lines = table.len(), bytes = size, "line table built");
    Ok(table)
}

/// Switches a descriptor into non-blocking mode and restores its original flags when dropped.
#[derive(Debug)]
pub struct NonBlocking<'a> {
    fd: BorrowedFd<'a>,
    old_flags: OFlags,
}

impl<'a> NonBlocking<'a> {
    pub fn enable<F: AsFd>(fd: &'a F) -> io::Result<NonBlocking<'a>> {
        let fd = fd.as_fd();
        let old_flags = fcntl_getfl(fd)?;
        fcntl_setfl(fd, old_flags | OFlags::NONBLOCK)?;
        Ok(Self { fd, old_flags })
    }
}

impl Drop for NonBlocking<'_> {
    fn drop(&mut self) {
        if let Err(err) = fcntl_setfl(self.fd, self.old_flags) {
            warn!(%err, "cannot restore descriptor flags");
        }
    }
}
