//! Wire codec for the gateway's hex-ASCII line protocol and IPMB framing.
//!
//! A line is `"xx xx xx\n"`: lowercase two-digit hex bytes separated by
//! single spaces. The decoded bytes are either an IPMB message
//! (`[rsSA, netFn/rsLUN, csum1, rqSA, rqSeq/rqLUN, cmd, data.., csum2]`) or a
//! local gateway frame (`[0x00, command, args..]`) without checksums.

use core::fmt;

use crate::error::{Error, Result};

/// Line terminator used by the gateway.
pub(crate) const TERMINATOR: u8 = b'\n';

/// Address byte of frames to and from the gateway itself.
pub const LOCAL_ADDRESS: u8 = 0x00;

/// Network function of sensor/event requests.
pub(crate) const NETFN_SENSOR_EVENT: u8 = 0x04;

/// `Platform Event` command number.
pub(crate) const CMD_PLATFORM_EVENT: u8 = 0x02;

/// Completion code sent when acknowledging events.
pub(crate) const CC_OK: u8 = 0x00;

/// Gateway status pushed when an IPMB write got no acknowledge on the bus.
const STATUS_I2C_MAX_RETRIES: u8 = 0x84;

/// Header length before the payload: six header bytes (checksum 1 included).
const HEADER_LEN: usize = 6;

/// Largest IPMB message the gateway relays.
pub const MAX_IPMB_MESSAGE_LEN: usize = 32;

/// Largest payload that fits into one IPMB message.
pub const MAX_IPMB_PAYLOAD_LEN: usize = MAX_IPMB_MESSAGE_LEN - HEADER_LEN - 1;

/// IPMB message header, laid out from the point of view of the message sender.
///
/// Responses are encoded with the same layout after swapping requester and
/// responder fields, see [`IpmbHeader::response_header`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpmbHeader {
    /// Network function (6 bits).
    pub netfn: u8,
    /// Responder slave address.
    pub rs_sa: u8,
    /// Responder LUN (2 bits).
    pub rs_lun: u8,
    /// Requester slave address.
    pub rq_sa: u8,
    /// Requester sequence number (6 bits).
    pub rq_seq: u8,
    /// Requester LUN (2 bits).
    pub rq_lun: u8,
    /// Command number.
    pub cmd: u8,
}

impl IpmbHeader {
    /// Header of the response to a request carrying `self`.
    ///
    /// Encoding the result with [`encode_frame`] produces exactly the bytes a
    /// responder puts on the bus.
    pub fn response_header(&self) -> Self {
        Self {
            netfn: self.netfn | 1,
            rs_sa: self.rq_sa,
            rs_lun: self.rq_lun,
            rq_sa: self.rs_sa,
            rq_seq: self.rq_seq,
            rq_lun: self.rs_lun,
            cmd: self.cmd,
        }
    }

    /// Whether the network function denotes a request (even netfn).
    pub fn is_request(&self) -> bool {
        self.netfn & 1 == 0
    }
}

/// A frame as received from the wire, already hex-decoded.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame(Vec<u8>);

impl Frame {
    /// Wrap decoded bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// All frame bytes, address byte included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the frame.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// First byte of the frame.
    pub fn address(&self) -> Option<u8> {
        self.0.first().copied()
    }

    /// Whether this frame comes from the gateway rather than the IPMB bus.
    pub fn is_local(&self) -> bool {
        self.address() == Some(LOCAL_ADDRESS)
    }

    /// Whether the gateway reports that it could not deliver an IPMB request.
    pub(crate) fn is_delivery_failure(&self) -> bool {
        self.0 == [LOCAL_ADDRESS, STATUS_I2C_MAX_RETRIES]
    }

    /// IPMB header of this frame, when it is long enough to carry one.
    pub fn header(&self) -> Option<IpmbHeader> {
        if self.is_local() {
            return None;
        }
        decode_header(&self.0).ok()
    }

    /// IPMB payload between the header and the trailing checksum.
    pub fn payload(&self) -> &[u8] {
        if self.is_local() || self.0.len() <= HEADER_LEN {
            return &[];
        }
        &self.0[HEADER_LEN..self.0.len() - 1]
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({:02x?})", self.0)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Selects which frames a receive call consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameFilter {
    /// Response to the request carrying this header, addressed to `own_address`.
    ///
    /// Also accepts the gateway's delivery failure report, which ends the attempt.
    Response {
        own_address: u8,
        expected: IpmbHeader,
    },
    /// Unsolicited `Platform Event` request.
    PlatformEvent,
    /// Reply from the gateway itself.
    Local,
}

impl FrameFilter {
    pub(crate) fn response_to(own_address: u8, request: &IpmbHeader) -> Self {
        Self::Response {
            own_address,
            expected: request.response_header(),
        }
    }

    pub(crate) fn matches(&self, frame: &Frame) -> bool {
        match self {
            Self::Response {
                own_address,
                expected,
            } => {
                frame.is_delivery_failure()
                    || (frame.address() == Some(*own_address)
                        && frame.header() == Some(*expected))
            }
            Self::PlatformEvent => frame.header().is_some_and(|h| {
                h.netfn == NETFN_SENSOR_EVENT
                    && h.cmd == CMD_PLATFORM_EVENT
                    && frame.payload().len() >= 4
            }),
            Self::Local => frame.is_local() && !frame.is_delivery_failure(),
        }
    }
}

/// Compute the IPMB two's complement checksum.
pub(crate) fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    (!sum).wrapping_add(1)
}

fn sums_to_zero(bytes: &[u8]) -> bool {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)) == 0
}

/// Encode an IPMB message: header, payload and both checksums.
pub fn encode_frame(header: &IpmbHeader, payload: &[u8]) -> Result<Vec<u8>> {
    if header.rq_seq > 0x3F {
        return Err(Error::InvalidArgument("rq_seq must be 6-bit"));
    }
    if header.netfn > 0x3F {
        return Err(Error::InvalidArgument("netfn must be 6-bit"));
    }
    if payload.len() > MAX_IPMB_PAYLOAD_LEN {
        return Err(Error::InvalidArgument("payload exceeds IPMB message size"));
    }

    let netfn_lun = (header.netfn << 2) | (header.rs_lun & 0x03);
    let rq_seq_lun = (header.rq_seq << 2) | (header.rq_lun & 0x03);

    let mut msg = Vec::with_capacity(HEADER_LEN + payload.len() + 1);
    msg.push(header.rs_sa);
    msg.push(netfn_lun);
    msg.push(checksum(&msg[..2]));
    msg.push(header.rq_sa);
    msg.push(rq_seq_lun);
    msg.push(header.cmd);
    msg.extend_from_slice(payload);
    msg.push(checksum(&msg[3..]));

    Ok(msg)
}

/// Decode the header fields of an IPMB message. Checksums are not verified.
pub fn decode_header(bytes: &[u8]) -> Result<IpmbHeader> {
    let [rs_sa, netfn_lun, _csum1, rq_sa, rq_seq_lun, cmd, ..] = *bytes else {
        return Err(Error::MalformedFrame("IPMB header too short"));
    };
    Ok(IpmbHeader {
        netfn: netfn_lun >> 2,
        rs_sa,
        rs_lun: netfn_lun & 0x03,
        rq_sa,
        rq_seq: rq_seq_lun >> 2,
        rq_lun: rq_seq_lun & 0x03,
        cmd,
    })
}

/// Verify length and both checksums of an IPMB message.
pub fn validate_frame(bytes: &[u8]) -> Result<()> {
    if bytes.len() < HEADER_LEN + 1 {
        return Err(Error::MalformedFrame("IPMB message too short"));
    }
    if !sums_to_zero(&bytes[..3]) {
        return Err(Error::MalformedFrame("invalid IPMB header checksum"));
    }
    if !sums_to_zero(&bytes[3..]) {
        return Err(Error::MalformedFrame("invalid IPMB payload checksum"));
    }
    Ok(())
}

/// Decode and validate one received line into a [`Frame`].
///
/// Local frames carry no checksum but need at least a command or status byte;
/// a bare `00` is a readiness echo, not a reply.
pub(crate) fn parse_line(line: &[u8]) -> Result<Frame> {
    let bytes = hex_wire_decode(line)?;
    match bytes.as_slice() {
        [] => Err(Error::MalformedFrame("empty line")),
        [LOCAL_ADDRESS] => Err(Error::MalformedFrame("readiness echo")),
        [LOCAL_ADDRESS, ..] => Ok(Frame(bytes)),
        _ => {
            validate_frame(&bytes)?;
            Ok(Frame(bytes))
        }
    }
}

/// Render bytes as space-separated lowercase hex followed by the terminator.
pub fn hex_wire_encode(bytes: &[u8]) -> Vec<u8> {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";

    let mut line = Vec::with_capacity(bytes.len() * 3 + 1);
    for (i, &b) in bytes.iter().enumerate() {
        if i > 0 {
            line.push(b' ');
        }
        line.push(DIGITS[(b >> 4) as usize]);
        line.push(DIGITS[(b & 0x0F) as usize]);
    }
    line.push(TERMINATOR);
    line
}

/// Parse a hex line. Everything but `0-9a-f` is stripped before pairing digits.
pub fn hex_wire_decode(line: &[u8]) -> Result<Vec<u8>> {
    let nibbles: Vec<u8> = line.iter().filter_map(|&c| nibble(c)).collect();
    if nibbles.len() % 2 != 0 {
        return Err(Error::MalformedFrame("odd number of hex digits"));
    }
    Ok(nibbles
        .chunks_exact(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect())
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}
