use std::{
    io::{self, ErrorKind},
    os::fd::AsFd,
    time::Duration,
};

use rustix::{
    event::{poll, PollFd, PollFlags, Timespec},
    io::Errno,
};
use tracing::warn;

use crate::{error::Error, Result};

/// Acquires a resource using `acquire`. If that fails with an error `is_transient` accepts,
/// blocks for at most `bound` using `wait_ready` and tries exactly once more.
///
/// Any other error, an error of the retry, or `wait_ready` reporting that the bound elapsed
/// (`Ok(false)`) is terminal.
pub fn retry_when_ready<T, A, P, W>(
    mut acquire: A,
    is_transient: P,
    wait_ready: W,
    bound: Duration,
) -> Result<T>
where
    A: FnMut() -> io::Result<T>,
    P: Fn(&io::Error) -> bool,
    W: FnOnce(Duration) -> io::Result<bool>,
{
    match acquire() {
        Ok(res) => return Ok(res),
        Err(err) if is_transient(&err) => {
            warn!(%err, ?bound, "resource temporarily unavailable, waiting before retry");
        }
        Err(err) => return Err(err.into()),
    }

    if !wait_ready(bound)? {
        return Err(Error::Timeout(bound));
    }

    Ok(acquire()?)
}

/// `EAGAIN`, the only error class worth waiting for.
#[inline]
pub fn is_would_block(err: &io::Error) -> bool {
    err.kind() == ErrorKind::WouldBlock
}

/// Blocks until `fd` is readable or `timeout` elapsed. Returns `false` on timeout.
pub fn wait_readable<Fd: AsFd>(fd: &Fd, timeout: Duration) -> io::Result<bool> {
    let timespec = Timespec {
        tv_sec: timeout.as_secs() as _,
        tv_nsec: timeout.subsec_nanos() as _,
    };

    loop {
        let mut fds = [PollFd::new(fd, PollFlags::IN)];
        match poll(&mut fds, Some(&timespec)) {
            Ok(ready) => return Ok(ready > 0),
            Err(Errno::INTR) => continue,
            Err(err) => return Err(err.into()),
        }
    }
}
