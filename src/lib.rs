#![deny(unsafe_code)]
#![warn(missing_docs)]

//! A blocking driver for the mmctester board, a serial gateway that relays
//! IPMB traffic to and from an AMC/MMC management controller.
//!
//! The crate implements:
//! - the gateway's hex-ASCII line protocol and IPMB framing with checksums
//! - request/response correlation by 6-bit sequence number, with retries
//! - a queue preserving frames that arrive out of order or unsolicited
//! - acknowledgment of `Platform Event` messages
//! - the gateway's local pin I/O commands
//!
//! One [`Board`] owns one serial link; exchanges are strictly sequential.

mod board;
pub mod commands;
mod debug;
mod error;
mod observe;
mod protocol;
mod queue;
mod transport;
mod types;

pub use crate::board::{Board, BoardBuilder};
pub use crate::error::{Error, Result};
pub use crate::protocol::{
    Frame, IpmbHeader, LOCAL_ADDRESS, MAX_IPMB_PAYLOAD_LEN, decode_header, encode_frame,
    hex_wire_decode, hex_wire_encode, validate_frame,
};
#[cfg(feature = "serial")]
pub use crate::transport::SerialTransport;
pub use crate::transport::LineTransport;
pub use crate::types::{
    BoardStatus, EventDirection, Hop, HotSwapHandle, Level, PinMode, PlatformEvent, RawResponse,
    SENSOR_TYPE_MODULE_HOT_SWAP, Target, pins,
};
