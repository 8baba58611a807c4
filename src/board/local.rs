//! Pin I/O commands executed by the gateway microcontroller itself.
//!
//! Requests are `[0x00, command, pin, (value)]`; replies echo the address and
//! command, then carry a status byte (0x80 on success) and any read value.
//! There are no sequence numbers and no retries.

use crate::board::Board;
use crate::error::{Error, Result};
use crate::protocol::{FrameFilter, LOCAL_ADDRESS};
use crate::transport::LineTransport;
use crate::types::{BoardStatus, Level, PinMode};

const COMMAND_PIN_MODE: u8 = 0x01;
const COMMAND_DIG_WRITE: u8 = 0x02;
const COMMAND_DIG_READ: u8 = 0x03;
const COMMAND_AN_WRITE: u8 = 0x04;
const COMMAND_AN_READ: u8 = 0x05;

impl<T: LineTransport> Board<T> {
    /// Configure `pin` as input, output or pulled-up input.
    pub fn pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<()> {
        self.local_command(COMMAND_PIN_MODE, &[pin, mode.as_u8()], 0)?;
        Ok(())
    }

    /// Drive a digital output pin.
    pub fn digital_write(&mut self, pin: u8, level: Level) -> Result<()> {
        self.local_command(COMMAND_DIG_WRITE, &[pin, level.as_u8()], 0)?;
        Ok(())
    }

    /// Sample a digital pin.
    pub fn digital_read(&mut self, pin: u8) -> Result<Level> {
        let value = self.local_command(COMMAND_DIG_READ, &[pin], 1)?;
        Ok(Level::from_u8(value[0]))
    }

    /// Set the PWM duty cycle of `pin` (0-255).
    pub fn analog_write(&mut self, pin: u8, duty: u8) -> Result<()> {
        self.local_command(COMMAND_AN_WRITE, &[pin, duty], 0)?;
        Ok(())
    }

    /// Read the ADC value of `pin` (10 bits on the reference board).
    pub fn analog_read(&mut self, pin: u8) -> Result<u16> {
        let value = self.local_command(COMMAND_AN_READ, &[pin], 2)?;
        Ok(u16::from_le_bytes([value[0], value[1]]))
    }

    /// Run one local command; returns the `value_len` bytes after the status byte.
    fn local_command(&mut self, command: u8, args: &[u8], value_len: usize) -> Result<Vec<u8>> {
        let mut request = Vec::with_capacity(2 + args.len());
        request.push(LOCAL_ADDRESS);
        request.push(command);
        request.extend_from_slice(args);

        self.core.send(&mut self.transport, &request)?;
        let reply = self
            .core
            .receive(&mut self.transport, &FrameFilter::Local, self.config.timeout)?
            .into_bytes();

        match reply.as_slice() {
            [_, echoed, status, value @ ..]
                if *echoed == command
                    && *status == BoardStatus::OK
                    && value.len() >= value_len =>
            {
                Ok(value[..value_len].to_vec())
            }
            _ => Err(Error::invalid_answer(command, &reply)),
        }
    }
}
