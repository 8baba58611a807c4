use std::time::Duration;

use crate::error::Result;

/// A line-oriented link to the gateway board.
///
/// Implementations own any partial-line buffering; a line returned by
/// [`LineTransport::read_line`] always ends with `\n`.
pub trait LineTransport {
    /// Write one complete line, terminator included.
    fn write_line(&mut self, line: &[u8]) -> Result<()>;

    /// Block for at most `timeout` until a full line is available.
    ///
    /// Returns [`crate::Error::Timeout`] when no complete line arrived in time.
    /// Bytes of an incomplete line are kept for the next call.
    fn read_line(&mut self, timeout: Duration) -> Result<Vec<u8>>;
}

impl<T: LineTransport + ?Sized> LineTransport for Box<T> {
    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        (**self).write_line(line)
    }

    fn read_line(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        (**self).read_line(timeout)
    }
}

#[cfg(feature = "serial")]
pub(crate) mod serial;

#[cfg(feature = "serial")]
pub use serial::SerialTransport;
