//! CRC-16/MODBUS engine
//!
//! Polynomial 0xA001 (reflected 0x8005), seed 0xFFFF, table-driven: each
//! byte is folded with `crc = (crc >> 8) ^ TABLE[byte ^ (crc & 0xFF)]`.
//! The checksum travels little-endian, low byte first.

use crc::{Crc, CRC_16_MODBUS};

use crate::bytes::ByteOrder;
use crate::constants::CRC_LEN;
use crate::error::{ModbusError, ModbusResult};

/// CRC calculator with its 256-entry table built at compile time
pub const CRC_MODBUS: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// What [`apply`] does with the two bytes following `length`
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcMode {
    /// Store the computed CRC at `buffer[length..length + 2]`
    Append,
    /// Compare the computed CRC with `buffer[length..length + 2]`
    Verify,
}

/// Calculate the CRC over `data`.
#[inline]
pub fn crc16(data: &[u8]) -> u16 {
    CRC_MODBUS.checksum(data)
}

/// Append or verify the CRC of `buffer[..length]`.
///
/// `Append` always reports `true`. `Verify` reports whether the stored
/// CRC matches and leaves the buffer untouched either way.
pub fn apply(buffer: &mut [u8], length: usize, mode: CrcMode) -> ModbusResult<bool> {
    match mode {
        CrcMode::Append => append(buffer, length).map(|()| true),
        CrcMode::Verify => verify(buffer, length),
    }
}

/// Write the CRC of `buffer[..length]` right after it.
pub fn append(buffer: &mut [u8], length: usize) -> ModbusResult<()> {
    check_len(buffer.len(), length)?;
    let crc = crc16(&buffer[..length]);
    ByteOrder::PAYLOAD.write(buffer, length, crc);
    Ok(())
}

/// Check the CRC stored right after `buffer[..length]`.
pub fn verify(buffer: &[u8], length: usize) -> ModbusResult<bool> {
    check_len(buffer.len(), length)?;
    let expected = crc16(&buffer[..length]);
    let received = ByteOrder::PAYLOAD.read(buffer, length);
    Ok(expected == received)
}

fn check_len(available: usize, length: usize) -> ModbusResult<()> {
    let needed = length + CRC_LEN;
    if available < needed {
        return Err(ModbusError::BufferTooSmall { needed, available });
    }
    Ok(())
}
