use core::fmt;

/// One bridging hop on the way to a management controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    /// Source address of the hop.
    pub source: u8,
    /// Destination address of the hop.
    pub destination: u8,
    /// Channel used for the hop, if any.
    pub channel: Option<u8>,
}

/// A management controller reachable over IPMB.
///
/// Only [`Target::ipmb_address`] is used by the board; the routing path is
/// carried for collaborators that share targets with bridged interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Final IPMB slave address (fills `rsSA`).
    pub ipmb_address: u8,
    /// Ordered routing path.
    pub routing: Vec<Hop>,
}

impl Target {
    /// A directly attached controller.
    pub fn new(ipmb_address: u8) -> Self {
        Self {
            ipmb_address,
            routing: Vec::new(),
        }
    }

    /// Attach a routing path.
    pub fn with_routing(mut self, routing: impl Into<Vec<Hop>>) -> Self {
        self.routing = routing.into();
        self
    }
}

impl From<u8> for Target {
    fn from(ipmb_address: u8) -> Self {
        Self::new(ipmb_address)
    }
}

/// A raw IPMI response.
#[derive(Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// IPMI completion code.
    pub completion_code: u8,
    /// Payload bytes after the completion code.
    pub data: Vec<u8>,
}

impl RawResponse {
    pub(crate) fn from_payload(payload: &[u8]) -> Option<Self> {
        let (&completion_code, data) = payload.split_first()?;
        Some(Self {
            completion_code,
            data: data.to_vec(),
        })
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field(
                "completion_code",
                &format_args!("{:#04x}", self.completion_code),
            )
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// Whether a platform event reports an assertion or a deassertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDirection {
    /// Event offset asserted.
    Assertion,
    /// Event offset deasserted.
    Deassertion,
}

/// State of the module hot-swap handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotSwapHandle {
    /// Handle pushed in; the module asks to be activated.
    Closed,
    /// Handle pulled out; the module asks to be deactivated.
    Open,
}

/// Sensor type of the AMC/ATCA module hot-swap sensor.
pub const SENSOR_TYPE_MODULE_HOT_SWAP: u8 = 0xF2;

/// A decoded `Platform Event` request pushed by a management controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformEvent {
    /// IPMB address of the event generator.
    pub generator_address: u8,
    /// LUN of the event generator.
    pub generator_lun: u8,
    /// Event message format revision.
    pub event_message_rev: u8,
    /// Sensor type.
    pub sensor_type: u8,
    /// Sensor number.
    pub sensor_number: u8,
    /// Event/reading type code (7 bits).
    pub event_type: u8,
    /// Assertion or deassertion.
    pub direction: EventDirection,
    /// Event data bytes (1 to 3 in practice).
    pub event_data: Vec<u8>,
}

impl PlatformEvent {
    pub(crate) fn from_request(generator_address: u8, generator_lun: u8, data: &[u8]) -> Option<Self> {
        let [event_message_rev, sensor_type, sensor_number, type_dir, event_data @ ..] = data
        else {
            return None;
        };
        Some(Self {
            generator_address,
            generator_lun,
            event_message_rev: *event_message_rev,
            sensor_type: *sensor_type,
            sensor_number: *sensor_number,
            event_type: type_dir & 0x7F,
            direction: if type_dir & 0x80 == 0 {
                EventDirection::Assertion
            } else {
                EventDirection::Deassertion
            },
            event_data: event_data.to_vec(),
        })
    }

    /// Hot-swap handle transition reported by this event, if it is one.
    pub fn hot_swap_handle(&self) -> Option<HotSwapHandle> {
        if self.sensor_type != SENSOR_TYPE_MODULE_HOT_SWAP
            || self.direction != EventDirection::Assertion
        {
            return None;
        }
        match self.event_data.first()? & 0x0F {
            0 => Some(HotSwapHandle::Closed),
            1 => Some(HotSwapHandle::Open),
            _ => None,
        }
    }
}

/// Pin direction accepted by the gateway's `pin mode` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PinMode {
    /// Floating input.
    Input = 0x00,
    /// Push-pull output.
    Output = 0x01,
    /// Input with the internal pull-up enabled.
    InputPullup = 0x02,
}

impl PinMode {
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Digital pin level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Level {
    /// Logic low.
    Low = 0x00,
    /// Logic high.
    High = 0x01,
}

impl Level {
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        if value == 0 { Self::Low } else { Self::High }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

/// Status byte of a gateway local reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardStatus {
    /// Command executed.
    Ok,
    /// Wrong argument count for the command.
    InvalidFormat,
    /// Line could not be parsed.
    InvalidMessage,
    /// Line carried no bytes.
    NoData,
    /// IPMB transmission failed after the gateway's own retries.
    I2cMaxRetries,
    /// Unknown local command code.
    NoCommand,
    /// Line exceeded the gateway's buffer.
    TooLong,
    /// Unrecognized status value.
    Unknown(u8),
}

impl BoardStatus {
    pub(crate) const OK: u8 = 0x80;

    /// Decode a raw status byte.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x80 => Self::Ok,
            0x81 => Self::InvalidFormat,
            0x82 => Self::InvalidMessage,
            0x83 => Self::NoData,
            0x84 => Self::I2cMaxRetries,
            0x85 => Self::NoCommand,
            0x86 => Self::TooLong,
            other => Self::Unknown(other),
        }
    }
}

/// Arduino pin numbers of the analog header.
pub mod pins {
    /// Analog pin A0.
    pub const A0: u8 = 14;
    /// Analog pin A1.
    pub const A1: u8 = 15;
    /// Analog pin A2.
    pub const A2: u8 = 16;
    /// Analog pin A3.
    pub const A3: u8 = 17;
    /// Analog pin A4.
    pub const A4: u8 = 18;
    /// Analog pin A5.
    pub const A5: u8 = 19;
    /// Analog pin A6.
    pub const A6: u8 = 20;
    /// Analog pin A7.
    pub const A7: u8 = 21;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(sensor_type: u8, type_dir: u8, offset: u8) -> PlatformEvent {
        PlatformEvent::from_request(0x72, 0, &[0x04, sensor_type, 0x00, type_dir, offset, 0xFF])
            .expect("decode")
    }

    #[test]
    fn platform_event_splits_type_and_direction() {
        let e = event(0xF2, 0xEF, 0x01);
        assert_eq!(e.event_type, 0x6F);
        assert_eq!(e.direction, EventDirection::Deassertion);
        assert_eq!(e.event_data, vec![0x01, 0xFF]);
    }

    #[test]
    fn platform_event_needs_four_bytes() {
        assert!(PlatformEvent::from_request(0x72, 0, &[0x04, 0xF2, 0x00]).is_none());
    }

    #[test]
    fn hot_swap_handle_transitions() {
        assert_eq!(
            event(0xF2, 0x6F, 0x00).hot_swap_handle(),
            Some(HotSwapHandle::Closed)
        );
        assert_eq!(
            event(0xF2, 0x6F, 0x01).hot_swap_handle(),
            Some(HotSwapHandle::Open)
        );
        assert_eq!(event(0xF2, 0xEF, 0x01).hot_swap_handle(), None);
        assert_eq!(event(0x01, 0x6F, 0x00).hot_swap_handle(), None);
    }

    #[test]
    fn board_status_decodes_known_codes() {
        assert_eq!(BoardStatus::from_u8(0x80), BoardStatus::Ok);
        assert_eq!(BoardStatus::from_u8(0x84), BoardStatus::I2cMaxRetries);
        assert_eq!(BoardStatus::from_u8(0x42), BoardStatus::Unknown(0x42));
    }
}
