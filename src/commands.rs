//! Typed commands run through [`crate::Board::execute`].

use crate::error::{Error, Result};
use crate::types::RawResponse;

/// A typed IPMI command (single request/response).
pub trait Command {
    /// Parsed output type.
    type Output;

    /// Network Function (NetFn) for the request.
    const NETFN: u8;

    /// Command number.
    const CMD: u8;

    /// Encode request payload bytes (excluding NetFn/Cmd framing).
    fn request_data(&self) -> Vec<u8>;

    /// Parse a raw response into the typed output.
    fn parse_response(&self, response: RawResponse) -> Result<Self::Output>;
}

fn ok_data(response: &RawResponse) -> Result<&[u8]> {
    if response.completion_code != 0x00 {
        return Err(Error::CompletionCode {
            completion_code: response.completion_code,
        });
    }
    Ok(&response.data)
}

/// PICMG group extension identifier, first byte of every PICMG request and response.
const PICMG_IDENTIFIER: u8 = 0x00;

/// LED behaviour requested by `Set FRU LED State`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedFunction {
    /// LED off.
    Off,
    /// LED on.
    On,
    /// Short blink, used while a module is being deactivated.
    ShortBlink,
    /// Long blink, used while a module negotiates power.
    LongBlink,
    /// Custom blink with off/on times in tens of milliseconds (1..=0xFA).
    Blink {
        /// Off duration.
        off: u8,
        /// On duration.
        on: u8,
    },
}

impl LedFunction {
    fn function_and_duration(self) -> (u8, u8) {
        match self {
            Self::Off => (0x00, 0x00),
            Self::On => (0xFF, 0x00),
            Self::ShortBlink => (0x5A, 0x0A),
            Self::LongBlink => (0x0A, 0x5A),
            Self::Blink { off, on } => (off, on),
        }
    }
}

/// `Set FRU LED State` (PICMG NetFn 0x2C, cmd 0x07).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetFruLedState {
    /// FRU device id.
    pub fru_id: u8,
    /// LED id (0 is the blue hot-swap LED).
    pub led_id: u8,
    /// Requested behaviour.
    pub function: LedFunction,
    /// Color code; 0x0F keeps the LED's default color.
    pub color: u8,
}

impl SetFruLedState {
    /// Hot-swap LED of FRU 0 in its default color.
    pub fn hot_swap_led(function: LedFunction) -> Self {
        Self {
            fru_id: 0,
            led_id: 0,
            function,
            color: 0x0F,
        }
    }
}

impl Command for SetFruLedState {
    type Output = ();
    const NETFN: u8 = 0x2C;
    const CMD: u8 = 0x07;

    fn request_data(&self) -> Vec<u8> {
        let (function, on_duration) = self.function.function_and_duration();
        vec![
            PICMG_IDENTIFIER,
            self.fru_id,
            self.led_id,
            function,
            on_duration,
            self.color & 0x0F,
        ]
    }

    fn parse_response(&self, response: RawResponse) -> Result<Self::Output> {
        match ok_data(&response)? {
            [PICMG_IDENTIFIER, ..] => Ok(()),
            _ => Err(Error::MalformedFrame("missing PICMG identifier")),
        }
    }
}
