use std::io;

use thiserror::Error;

use crate::types::BoardStatus;

/// Result type used across this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A received line or frame failed length or checksum validation.
    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),

    /// No matching frame arrived within the configured budget.
    #[error("timeout waiting for response")]
    Timeout,

    /// Serial port or other transport failure.
    #[error("port io error: {0}")]
    PortIo(#[from] io::Error),

    /// The gateway answered a local command with a mismatched echo or status.
    #[error("invalid answer to local command {command:#04x}: {reply:02x?}")]
    InvalidAnswer {
        /// Local command code that was sent.
        command: u8,
        /// Raw reply bytes, address byte included.
        reply: Vec<u8>,
    },

    /// The gateway did not echo the readiness probe.
    #[error("board not ready to accept serial commands")]
    BoardNotReady,

    /// Invalid caller-supplied argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// An IPMI command completed with a non-zero completion code.
    #[error("ipmi completion code: {completion_code:#04x}")]
    CompletionCode {
        /// Raw completion code returned by the controller.
        completion_code: u8,
    },
}

impl Error {
    pub(crate) fn invalid_answer(command: u8, reply: &[u8]) -> Self {
        Self::InvalidAnswer {
            command,
            reply: reply.to_vec(),
        }
    }

    /// Status byte reported by the gateway, for [`Error::InvalidAnswer`] replies that carry one.
    pub fn board_status(&self) -> Option<BoardStatus> {
        match self {
            Self::InvalidAnswer { reply, .. } => match reply.as_slice() {
                [_, _, status, ..] => Some(BoardStatus::from_u8(*status)),
                // Unknown commands are answered without the echo byte.
                [_, status] if status & 0x80 != 0 => Some(BoardStatus::from_u8(*status)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether the Correlator retries an attempt that failed with this error.
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::PortIo(_))
    }
}
