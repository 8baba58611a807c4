use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::protocol::{Frame, FrameFilter, IpmbHeader, encode_frame, hex_wire_encode, parse_line};
use crate::queue::PendingFrameQueue;
use crate::transport::LineTransport;

/// Per-board protocol state: own address, sequence counter and unclaimed frames.
#[derive(Debug)]
pub(crate) struct BoardCore {
    address: u8,
    rq_seq: u8,
    queue: PendingFrameQueue,
}

impl BoardCore {
    pub(crate) fn new(address: u8) -> Self {
        Self {
            address,
            rq_seq: 0,
            queue: PendingFrameQueue::new(),
        }
    }

    pub(crate) fn address(&self) -> u8 {
        self.address
    }

    pub(crate) fn next_rq_seq(&self) -> u8 {
        self.rq_seq
    }

    /// Build an IPMB request from this board to `rs_sa`, consuming one sequence number.
    pub(crate) fn build_request(
        &mut self,
        rs_sa: u8,
        rs_lun: u8,
        netfn: u8,
        cmd: u8,
        data: &[u8],
    ) -> Result<(IpmbHeader, Vec<u8>)> {
        let header = IpmbHeader {
            netfn,
            rs_sa,
            rs_lun: rs_lun & 0x03,
            rq_sa: self.address,
            rq_seq: self.allocate_rq_seq(),
            rq_lun: 0,
            cmd,
        };
        let frame = encode_frame(&header, data)?;
        Ok((header, frame))
    }

    /// Hex-encode `bytes` and write them as one line.
    pub(crate) fn send<T: LineTransport + ?Sized>(&self, transport: &mut T, bytes: &[u8]) -> Result<()> {
        let line = hex_wire_encode(bytes);
        crate::debug::dump_line("TX", &line);
        transport.write_line(&line)
    }

    /// Return the first frame accepted by `filter`, queued frames first.
    ///
    /// Fresh frames that do not match are queued. Malformed lines and delivery
    /// failures nobody waits for are dropped.
    /// Fails with [`Error::Timeout`] once `timeout` has elapsed.
    pub(crate) fn receive<T: LineTransport + ?Sized>(
        &mut self,
        transport: &mut T,
        filter: &FrameFilter,
        timeout: Duration,
    ) -> Result<Frame> {
        if let Some(frame) = self.queue.offer(filter) {
            return Ok(frame);
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout);
            }

            let line = transport.read_line(remaining)?;
            crate::debug::dump_line("RX", &line);

            let frame = match parse_line(&line) {
                Ok(frame) => frame,
                Err(err) => {
                    crate::debug::discarded(&line, &err);
                    continue;
                }
            };

            if filter.matches(&frame) {
                return Ok(frame);
            }
            if frame.is_delivery_failure() {
                crate::debug::discarded(&line, "delivery failure with no request waiting");
                continue;
            }
            self.queue.push(frame);
        }
    }

    pub(crate) fn drain_pending(&mut self) -> Vec<Frame> {
        self.queue.drain()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Put a claimed frame back at the head of the queue.
    pub(crate) fn requeue(&mut self, frame: Frame) {
        self.queue.push_front(frame);
    }

    pub(crate) fn pending(&self) -> &PendingFrameQueue {
        &self.queue
    }

    fn allocate_rq_seq(&mut self) -> u8 {
        // rq_seq is 6-bit. We keep a u8 and wrap at 64.
        let current = self.rq_seq;
        self.rq_seq = (self.rq_seq + 1) & 0x3F;
        current
    }
}
