use std::{collections::TryReserveError, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Offsets handed to the line table are not strictly increasing
    #[error("malformed line index: offsets must be strictly increasing")]
    MalformedIndex,

    /// On request for a line the table doesn't know about
    #[error("line {line} is out of range, file has {lines} lines")]
    OutOfBounds { line: usize, lines: usize },

    #[error("cannot allocate memory: {0}")]
    Alloc(#[from] TryReserveError),

    /// The file can't be indexed through a memory mapping
    #[error("cannot map file: {0}")]
    Unmappable(&'static str),

    /// The file didn't become readable within the bound
    #[error("timed out after {0:?} waiting for the file to become readable")]
    Timeout(Duration),

    #[error("child exited with non zero exit code: {0}")]
    ChildExit(i32),

    #[error("child closed by signal: {0}")]
    ChildSignal(i32),

    #[error("unexpected line count output: {0:?}")]
    BadCount(String),
}

impl Error {
    /// Returns `true` for errors that only concern a single request and leave the session usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::OutOfBounds { .. } | Error::Alloc(_) | Error::Io(_)
        )
    }
}
