//! # Slave Configuration
//!
//! Line and protocol settings for one slave, checked once at startup.
//!
//! The inter-frame timeout is derived from the baud rate: one character
//! is 11 bit periods on an 8E1 line, and a partial frame is abandoned after
//! as many character times as a request has payload bytes.

use std::time::Duration;

use crate::constants::{
    BITS_PER_CHARACTER, DEFAULT_BAUD_RATE, MAX_READ_REGISTERS, MAX_SLAVE_ID, REQUEST_PAYLOAD_LEN,
};
use crate::error::{ModbusError, ModbusResult};
use crate::protocol::SlaveId;

/// Slave settings.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use rtu_slave::SlaveConfig;
///
/// let config = SlaveConfig::new(17)
///     .with_baud_rate(9600)
///     .with_max_read_registers(32);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.inter_frame_timeout(), Duration::from_micros(6930));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaveConfig {
    /// Address this slave answers to (1..=247)
    pub slave_id: SlaveId,
    /// Line speed in bits per second
    pub baud_rate: u32,
    /// Largest FC03/FC04 quantity served
    pub max_read_registers: u16,
}

impl SlaveConfig {
    /// Config for `slave_id` with default line settings.
    pub fn new(slave_id: SlaveId) -> Self {
        Self {
            slave_id,
            ..Self::default()
        }
    }

    /// Set the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the maximum registers per read.
    pub fn with_max_read_registers(mut self, count: u16) -> Self {
        self.max_read_registers = count;
        self
    }

    /// Reject settings the slave cannot run with.
    pub fn validate(&self) -> ModbusResult<()> {
        if self.slave_id == 0 || self.slave_id > MAX_SLAVE_ID {
            return Err(ModbusError::configuration(format!(
                "Slave id {} outside 1..={}",
                self.slave_id, MAX_SLAVE_ID
            )));
        }
        if self.baud_rate == 0 {
            return Err(ModbusError::configuration("Baud rate must be non-zero"));
        }
        if self.max_read_registers == 0 || self.max_read_registers > MAX_READ_REGISTERS {
            return Err(ModbusError::configuration(format!(
                "Max read registers {} outside 1..={}",
                self.max_read_registers, MAX_READ_REGISTERS
            )));
        }
        Ok(())
    }

    /// Duration of one character on the line.
    ///
    /// The bit period is rounded up to whole microseconds.
    pub fn character_time(&self) -> Duration {
        let bit_us = 1_000_000u64.div_ceil(u64::from(self.baud_rate.max(1)));
        Duration::from_micros(bit_us * BITS_PER_CHARACTER)
    }

    /// Silence after which a partial frame is discarded.
    pub fn inter_frame_timeout(&self) -> Duration {
        self.character_time() * REQUEST_PAYLOAD_LEN as u32
    }
}

impl Default for SlaveConfig {
    fn default() -> Self {
        Self {
            slave_id: 1,
            baud_rate: DEFAULT_BAUD_RATE,
            max_read_registers: MAX_READ_REGISTERS,
        }
    }
}
