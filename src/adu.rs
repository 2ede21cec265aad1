//! Response frame with a stack-allocated fixed array
//!
//! Responses are assembled without heap allocation: address, function code,
//! optional byte count, payload, then the CRC appended just before
//! transmission.

use tracing::debug;

use crate::bytes::ByteOrder;
use crate::checksum;
use crate::constants::{
    CRC_LEN, EXCEPTION_FLAG, EXCEPTION_RESPONSE_LEN, MAX_RTU_FRAME_SIZE, READ_RESPONSE_BASE_LEN,
    REQUEST_PAYLOAD_LEN,
};
use crate::error::{ModbusError, ModbusResult};
use crate::protocol::{ModbusException, RequestFrame, SlaveId};

/// Outgoing RTU frame
#[derive(Debug, Clone)]
pub struct ResponseFrame {
    /// Fixed-size buffer (stack)
    data: [u8; MAX_RTU_FRAME_SIZE],
    /// Actual data length
    len: usize,
}

impl ResponseFrame {
    /// Create an empty frame
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0; MAX_RTU_FRAME_SIZE],
            len: 0,
        }
    }

    /// Exception reply: `address, function | 0x80, code`
    pub fn exception(slave_id: SlaveId, function_code: u8, exception: ModbusException) -> Self {
        let mut frame = Self::new();
        frame.data[..EXCEPTION_RESPONSE_LEN].copy_from_slice(&[
            slave_id,
            function_code | EXCEPTION_FLAG,
            exception.to_u8(),
        ]);
        frame.len = EXCEPTION_RESPONSE_LEN;
        debug!(
            "Exception response: slave={}, FC={:02X}, code={:02X} ({})",
            slave_id,
            function_code,
            exception.to_u8(),
            exception
        );
        frame
    }

    /// Read reply: `address, function, byte count, values...`.
    ///
    /// Register values go out in payload (little-endian) order.
    pub fn read_registers(
        slave_id: SlaveId,
        function_code: u8,
        values: &[u16],
    ) -> ModbusResult<Self> {
        let byte_count = u8::try_from(values.len() * 2).map_err(|_| {
            ModbusError::invalid_data(format!("Too many registers: {}", values.len()))
        })?;

        let mut frame = Self::new();
        frame.extend(&[slave_id, function_code, byte_count])?;
        debug_assert_eq!(frame.len(), READ_RESPONSE_BASE_LEN);
        for &value in values {
            frame.push_payload_u16(value)?;
        }
        Ok(frame)
    }

    /// Echo of a request payload (single-register write acknowledgement)
    pub fn echo(request: &RequestFrame) -> Self {
        let mut frame = Self::new();
        frame.data[..REQUEST_PAYLOAD_LEN].copy_from_slice(request.payload());
        frame.len = REQUEST_PAYLOAD_LEN;
        frame
    }

    /// Push a single byte
    #[inline]
    pub fn push(&mut self, byte: u8) -> ModbusResult<()> {
        if self.len >= MAX_RTU_FRAME_SIZE {
            return Err(ModbusError::BufferTooSmall {
                needed: self.len + 1,
                available: MAX_RTU_FRAME_SIZE,
            });
        }
        self.data[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    /// Push a protocol field (big-endian)
    #[inline]
    pub fn push_u16(&mut self, value: u16) -> ModbusResult<()> {
        self.extend(&ByteOrder::PROTOCOL.encode(value))
    }

    /// Push a payload word (little-endian)
    #[inline]
    pub fn push_payload_u16(&mut self, value: u16) -> ModbusResult<()> {
        self.extend(&ByteOrder::PAYLOAD.encode(value))
    }

    /// Extend with a byte slice
    #[inline]
    pub fn extend(&mut self, data: &[u8]) -> ModbusResult<()> {
        if self.len + data.len() > MAX_RTU_FRAME_SIZE {
            return Err(ModbusError::BufferTooSmall {
                needed: self.len + data.len(),
                available: MAX_RTU_FRAME_SIZE,
            });
        }
        self.data[self.len..self.len + data.len()].copy_from_slice(data);
        self.len += data.len();
        Ok(())
    }

    /// Append the CRC of everything pushed so far
    pub fn append_crc(&mut self) -> ModbusResult<()> {
        checksum::append(&mut self.data, self.len)?;
        self.len += CRC_LEN;
        Ok(())
    }

    /// Get immutable data slice
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Get current length
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Function code (second byte)
    #[inline]
    pub fn function_code(&self) -> Option<u8> {
        (self.len > 1).then(|| self.data[1])
    }

    /// Check if exception response
    #[inline]
    pub fn is_exception(&self) -> bool {
        self.function_code()
            .map(|fc| fc & EXCEPTION_FLAG != 0)
            .unwrap_or(false)
    }

    /// Get exception code
    #[inline]
    pub fn exception_code(&self) -> Option<u8> {
        if self.is_exception() && self.len > 2 {
            Some(self.data[2])
        } else {
            None
        }
    }
}

impl Default for ResponseFrame {
    fn default() -> Self {
        Self::new()
    }
}
