//! The mmctester board: serial gateway to an IPMB-attached management controller.

use std::time::{Duration, Instant};

use crate::commands::Command;
use crate::error::{Error, Result};
use crate::protocol::{Frame, FrameFilter};
use crate::transport::LineTransport;
use crate::types::{RawResponse, Target};

#[cfg(feature = "serial")]
use crate::transport::SerialTransport;

pub(crate) mod core;
mod events;
mod local;

use self::core::BoardCore;

/// Readiness probe line; the gateway echoes it back verbatim.
const READY_PROBE: &[u8] = b"00\n";

const NETFN_APP: u8 = 0x06;
const CMD_GET_DEVICE_ID: u8 = 0x01;

#[derive(Debug, Clone, Copy)]
struct BoardConfig {
    timeout: Duration,
    max_retries: u32,
    retry_backoff: Duration,
    ready_attempts: u32,
}

/// Builder for [`Board`].
#[derive(Debug, Clone)]
pub struct BoardBuilder {
    baud_rate: u32,
    address: u8,
    config: BoardConfig,
}

impl Default for BoardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardBuilder {
    /// Create a new builder with the gateway's defaults.
    pub fn new() -> Self {
        Self {
            baud_rate: 115_200,
            address: 0x20,
            config: BoardConfig {
                timeout: Duration::from_secs(1),
                max_retries: 3,
                retry_backoff: Duration::from_millis(200),
                ready_attempts: 3,
            },
        }
    }

    /// Set the serial baud rate.
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the IPMB slave address the gateway answers to (`rqSA` of requests).
    pub fn address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Set the time budget of one receive attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the number of send attempts per request (including the first attempt).
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.config.max_retries = attempts;
        self
    }

    /// Set the backoff unit; attempt `n` is followed by a pause of `n × unit`.
    pub fn retry_backoff(mut self, unit: Duration) -> Self {
        self.config.retry_backoff = unit;
        self
    }

    /// Set how many readiness probes are sent before giving up.
    pub fn ready_attempts(mut self, attempts: u32) -> Self {
        self.config.ready_attempts = attempts;
        self
    }

    /// Open the serial port at `path` and wait for the board to become ready.
    #[cfg(feature = "serial")]
    pub fn open(self, path: &str) -> Result<Board<SerialTransport>> {
        let transport = SerialTransport::open(path, self.baud_rate, self.config.timeout)?;
        self.connect(transport)
    }

    /// Wire an already opened link and wait for the board to become ready.
    pub fn connect<T: LineTransport>(self, transport: T) -> Result<Board<T>> {
        if self.address == crate::protocol::LOCAL_ADDRESS {
            return Err(Error::InvalidArgument("0x00 is reserved for the gateway"));
        }

        let mut board = Board {
            transport,
            core: BoardCore::new(self.address),
            config: self.config,
        };
        board.wait_until_ready()?;
        Ok(board)
    }
}

/// A connected mmctester board.
///
/// The board exclusively owns the serial link and the queue of unclaimed
/// frames. Exchanges are strictly sequential: every request blocks until its
/// response arrives or its retries are exhausted.
pub struct Board<T: LineTransport> {
    transport: T,
    core: BoardCore,
    config: BoardConfig,
}

impl<T: LineTransport> Board<T> {
    /// IPMB address of the board.
    pub fn address(&self) -> u8 {
        self.core.address()
    }

    /// Sequence number the next request will carry.
    pub fn next_sequence_number(&self) -> u8 {
        self.core.next_rq_seq()
    }

    /// Number of received frames no caller has claimed yet.
    pub fn pending_frames(&self) -> usize {
        self.core.pending_len()
    }

    /// Send an IPMI request to `target` and wait for the correlated response.
    ///
    /// Returns the response payload starting at the completion code, without
    /// header and trailing checksum. Timeouts and port errors are retried up
    /// to the configured limit before [`Error::Timeout`] is returned.
    pub fn send_and_receive(
        &mut self,
        target: &Target,
        lun: u8,
        netfn: u8,
        cmd: u8,
        payload: &[u8],
    ) -> Result<Vec<u8>> {
        let start = Instant::now();
        let rq_seq = self.core.next_rq_seq();
        let result = self.correlate(target, lun, netfn, cmd, payload);
        let elapsed = start.elapsed();
        match &result {
            Ok((_, attempts)) => {
                crate::observe::record_ok(netfn, cmd, rq_seq, *attempts, elapsed)
            }
            Err(err) => crate::observe::record_err(netfn, cmd, rq_seq, elapsed, err),
        }
        result.map(|(payload, _)| payload)
    }

    /// Send a raw request whose first byte is the command number.
    pub fn send_and_receive_raw(
        &mut self,
        target: &Target,
        lun: u8,
        netfn: u8,
        raw: &[u8],
    ) -> Result<Vec<u8>> {
        let (&cmd, payload) = raw
            .split_first()
            .ok_or(Error::InvalidArgument("raw request needs a command byte"))?;
        self.send_and_receive(target, lun, netfn, cmd, payload)
    }

    /// Execute a typed command (single request/response) on LUN 0.
    pub fn execute<C: Command>(&mut self, target: &Target, command: C) -> Result<C::Output> {
        let request_data = command.request_data();
        let payload = self.send_and_receive(target, 0, C::NETFN, C::CMD, &request_data)?;
        let response = RawResponse::from_payload(&payload)
            .ok_or(Error::MalformedFrame("response without completion code"))?;
        command.parse_response(response)
    }

    /// Probe `target` with `Get Device ID`; `false` when it never answers.
    pub fn is_ipmc_accessible(&mut self, target: &Target) -> Result<bool> {
        match self.send_and_receive(target, 0, NETFN_APP, CMD_GET_DEVICE_ID, &[]) {
            Ok(_) => Ok(true),
            Err(Error::Timeout) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Take every frame received so far that no caller claimed, oldest first.
    pub fn pop_unprocessed(&mut self) -> Vec<Frame> {
        self.core.drain_pending()
    }

    /// Close the link. Unclaimed frames are dropped.
    pub fn close(self) {
        if self.core.has_pending() {
            crate::observe::record_unclaimed(None, self.core.pending());
        }
    }

    /// Send the request once per attempt and wait for its response.
    ///
    /// The sequence number is allocated once, so every attempt of one call
    /// carries the same request bytes.
    fn correlate(
        &mut self,
        target: &Target,
        lun: u8,
        netfn: u8,
        cmd: u8,
        payload: &[u8],
    ) -> Result<(Vec<u8>, u32)> {
        let (header, request) =
            self.core
                .build_request(target.ipmb_address, lun, netfn, cmd, payload)?;
        let filter = FrameFilter::response_to(self.core.address(), &header);
        let max_attempts = self.config.max_retries.max(1);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match self.attempt(&request, &filter) {
                Ok(frame) => return Ok((frame.payload().to_vec(), attempt)),
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };

            if attempt >= max_attempts {
                if self.core.has_pending() {
                    crate::observe::record_unclaimed(Some(header.rq_seq), self.core.pending());
                }
                return Err(Error::Timeout);
            }

            let backoff = retry_delay(self.config.retry_backoff, attempt);
            crate::observe::record_retry(header.rq_seq, attempt, backoff, &err);
            std::thread::sleep(backoff);
        }
    }

    /// One send and wait. A delivery failure reported by the gateway fails the
    /// attempt like a timeout.
    fn attempt(&mut self, request: &[u8], filter: &FrameFilter) -> Result<Frame> {
        self.core.send(&mut self.transport, request)?;
        let frame = self
            .core
            .receive(&mut self.transport, filter, self.config.timeout)?;
        if frame.is_delivery_failure() {
            #[cfg(feature = "tracing")]
            tracing::debug!("gateway could not deliver the IPMB request");
            return Err(Error::Timeout);
        }
        Ok(frame)
    }

    /// Send the readiness probe until it is echoed back.
    ///
    /// Anything else read in between is stale traffic and is discarded.
    fn wait_until_ready(&mut self) -> Result<()> {
        for _attempt in 1..=self.config.ready_attempts.max(1) {
            self.transport.write_line(READY_PROBE)?;
            match self.transport.read_line(self.config.timeout) {
                Ok(line) if line == READY_PROBE => return Ok(()),
                Ok(line) => crate::debug::dump_line("RX", &line),
                Err(Error::Timeout) => {}
                Err(e) => return Err(e),
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(attempt = _attempt, "board did not answer readiness probe");
        }
        Err(Error::BoardNotReady)
    }
}

/// Pause after the `attempt`-th failed attempt (1-based).
pub(crate) fn retry_delay(unit: Duration, attempt: u32) -> Duration {
    unit.saturating_mul(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_linearly() {
        let unit = Duration::from_millis(200);
        assert_eq!(retry_delay(unit, 1), Duration::from_millis(200));
        assert_eq!(retry_delay(unit, 2), Duration::from_millis(400));
        assert_eq!(retry_delay(unit, 3), Duration::from_millis(600));
    }

    #[test]
    fn builder_defaults_match_gateway_firmware() {
        let builder = BoardBuilder::new();
        assert_eq!(builder.baud_rate, 115_200);
        assert_eq!(builder.address, 0x20);
        assert_eq!(builder.config.timeout, Duration::from_secs(1));
        assert_eq!(builder.config.max_retries, 3);
        assert_eq!(builder.config.retry_backoff, Duration::from_millis(200));
        assert_eq!(builder.config.ready_attempts, 3);
    }
}
