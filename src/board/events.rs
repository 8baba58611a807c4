use crate::board::Board;
use crate::error::{Error, Result};
use crate::protocol::{CC_OK, FrameFilter, encode_frame};
use crate::transport::LineTransport;
use crate::types::PlatformEvent;

impl<T: LineTransport> Board<T> {
    /// Wait one receive timeout for a `Platform Event` and acknowledge it.
    ///
    /// Returns `Ok(None)` when no event arrived. Other frames read meanwhile
    /// stay queued for later requests or [`Board::pop_unprocessed`]. When the
    /// acknowledgment cannot be written the event goes back to the head of the
    /// queue, so the next poll returns it again.
    pub fn receive_and_ack(&mut self) -> Result<Option<PlatformEvent>> {
        let frame = match self.core.receive(
            &mut self.transport,
            &FrameFilter::PlatformEvent,
            self.config.timeout,
        ) {
            Ok(frame) => frame,
            Err(Error::Timeout) => return Ok(None),
            Err(e) => return Err(e),
        };

        let header = frame
            .header()
            .ok_or(Error::MalformedFrame("platform event without header"))?;
        let event = PlatformEvent::from_request(header.rq_sa, header.rq_lun, frame.payload())
            .ok_or(Error::MalformedFrame("platform event payload too short"))?;

        let ack = encode_frame(&header.response_header(), &[CC_OK])?;
        if let Err(e) = self.core.send(&mut self.transport, &ack) {
            self.core.requeue(frame);
            return Err(e);
        }

        crate::observe::record_event(
            event.generator_address,
            event.sensor_type,
            event.sensor_number,
        );
        Ok(Some(event))
    }
}
