use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use serialport::SerialPort;

use crate::error::{Error, Result};
use crate::protocol::{MAX_IPMB_MESSAGE_LEN, TERMINATOR};
use crate::transport::LineTransport;

/// Bytes requested from the port per read call.
const READ_CHUNK: usize = 256;

/// Longest unterminated input kept: a full IPMB message in hex plus line noise.
const MAX_LINE_LEN: usize = 4 * MAX_IPMB_MESSAGE_LEN;

/// Blocking serial-port link to the gateway board.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    pending: LineBuffer,
}

impl SerialTransport {
    /// Open `path` at `baud_rate` (8N1, no flow control).
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(io::Error::from)?;

        Ok(Self {
            port,
            pending: LineBuffer::default(),
        })
    }
}

/// Bytes read from the port that do not form a complete line yet.
#[derive(Debug, Default)]
struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    fn extend(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Split off the oldest complete line. An unterminated tail longer than
    /// [`MAX_LINE_LEN`] is dropped.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        if let Some(end) = self.bytes.iter().position(|&b| b == TERMINATOR) {
            return Some(self.bytes.drain(..=end).collect());
        }
        if self.bytes.len() > MAX_LINE_LEN {
            crate::debug::discarded(
                &self.bytes,
                Error::MalformedFrame("line exceeds gateway line length"),
            );
            self.bytes.clear();
        }
        None
    }
}

impl LineTransport for SerialTransport {
    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.port.write_all(line)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_line(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; READ_CHUNK];

        loop {
            if let Some(line) = self.pending.take_line() {
                return Ok(line);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout);
            }
            self.port
                .set_timeout(remaining)
                .map_err(io::Error::from)?;

            match self.port.read(&mut buf) {
                Ok(0) => {
                    return Err(Error::PortIo(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "serial port closed",
                    )));
                }
                Ok(n) => self.pending.extend(&buf[..n]),
                Err(e) if is_timeout(&e) => return Err(Error::Timeout),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::PortIo(e)),
            }
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_split_across_reads() {
        let mut buffer = LineBuffer::default();
        buffer.extend(b"00 03 ");
        assert_eq!(buffer.take_line(), None);
        buffer.extend(b"80 01\n00 01");
        assert_eq!(buffer.take_line(), Some(b"00 03 80 01\n".to_vec()));
        assert_eq!(buffer.take_line(), None);
        buffer.extend(b" 80\n");
        assert_eq!(buffer.take_line(), Some(b"00 01 80\n".to_vec()));
    }

    #[test]
    fn unterminated_input_is_bounded() {
        let mut buffer = LineBuffer::default();
        buffer.extend(&[b'a'; MAX_LINE_LEN + 1]);
        assert_eq!(buffer.take_line(), None);
        assert!(buffer.bytes.is_empty());

        buffer.extend(b"00 84\n");
        assert_eq!(buffer.take_line(), Some(b"00 84\n".to_vec()));
    }

    #[test]
    fn full_message_fits_below_the_limit() {
        let mut buffer = LineBuffer::default();
        buffer.extend(&[b'a'; MAX_LINE_LEN]);
        assert_eq!(buffer.take_line(), None);
        assert_eq!(buffer.bytes.len(), MAX_LINE_LEN);
    }
}
