//! Error types for the RTU slave
//!
//! Protocol-level failures (bad register range, unknown function code) are
//! answered on the wire with an exception frame and never show up here.
//! A `ModbusError` reaching the host means the configuration was rejected
//! or the injected byte source/sink failed.

use thiserror::Error;

use crate::protocol::RegisterKind;

/// Result alias used throughout the crate
pub type ModbusResult<T> = Result<T, ModbusError>;

/// Errors surfaced to the host application
#[derive(Debug, Error)]
pub enum ModbusError {
    /// Underlying I/O failure of the byte source or sink
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid startup configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Malformed frame handed to a codec function
    #[error("Frame error: {message}")]
    Frame { message: String },

    /// Transport (serial port) failure
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Invalid data value
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Function code outside the supported set
    #[error("Invalid function code: 0x{code:02X}")]
    InvalidFunction { code: u8 },

    /// Register access outside the bank
    #[error("{kind} register range out of bounds: start={start}, count={count}, size={size}")]
    OutOfRange {
        kind: RegisterKind,
        start: u16,
        count: u16,
        size: usize,
    },

    /// Output buffer cannot hold the result
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

impl ModbusError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a frame error
    pub fn frame(message: impl Into<String>) -> Self {
        Self::Frame {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create an invalid function error
    pub fn invalid_function(code: u8) -> Self {
        Self::InvalidFunction { code }
    }

    /// Whether the host may keep polling after this error.
    ///
    /// Configuration errors are startup preconditions; everything else
    /// concerns a single frame or a transient transport condition.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Configuration { .. })
    }
}
