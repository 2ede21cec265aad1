//! Modbus RTU protocol constants for the supported request subset
//!
//! Only FC03, FC04 and FC06 are served, so every request on the wire has
//! the same fixed layout:
//! - Slave address: 1 byte
//! - Function code: 1 byte
//! - Field A (first register): 2 bytes, big-endian
//! - Field B (count or value): 2 bytes, big-endian
//! - CRC: 2 bytes, little-endian

// ============================================================================
// Frame Size Constants
// ============================================================================

/// Request length without CRC (address + function code + two 16-bit fields)
pub const REQUEST_PAYLOAD_LEN: usize = 6;

/// CRC length in bytes
pub const CRC_LEN: usize = 2;

/// Total on-wire length of every supported request
pub const REQUEST_FRAME_LEN: usize = REQUEST_PAYLOAD_LEN + CRC_LEN;

/// Read response header: address + function code + byte count
pub const READ_RESPONSE_BASE_LEN: usize = 3;

/// Exception response length without CRC: address + function code + exception code
pub const EXCEPTION_RESPONSE_LEN: usize = 3;

/// Maximum RTU ADU size (RS485 limit)
pub const MAX_RTU_FRAME_SIZE: usize = 256;

// ============================================================================
// Register Operation Limits
// ============================================================================

/// Maximum number of registers for FC03/FC04 (Read Holding/Input Registers)
///
/// Calculation for response ADU:
/// - Address + Function Code + Byte Count: 3 bytes
/// - Register Data: N × 2 bytes
/// - CRC: 2 bytes
/// - Total: 3 + (N × 2) + 2 ≤ 256
/// - The PDU limit (253 bytes) caps N at 125
pub const MAX_READ_REGISTERS: u16 = 125;

// ============================================================================
// Line Timing
// ============================================================================

/// Bits per serial character: 1 start + 8 data + 1 parity + 1 stop
pub const BITS_PER_CHARACTER: u64 = 11;

/// Default line speed
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Highest unicast slave address
pub const MAX_SLAVE_ID: u8 = 247;

// ============================================================================
// Modbus Function Codes
// ============================================================================

/// Read Holding Registers (FC03)
pub const FC_READ_HOLDING_REGISTERS: u8 = 0x03;

/// Read Input Registers (FC04)
pub const FC_READ_INPUT_REGISTERS: u8 = 0x04;

/// Write Single Register (FC06)
pub const FC_WRITE_SINGLE_REGISTER: u8 = 0x06;

/// Bit set on the function code of an exception response
pub const EXCEPTION_FLAG: u8 = 0x80;

// ============================================================================
// Modbus Exception Codes
// ============================================================================

/// Illegal Function
pub const EXCEPTION_ILLEGAL_FUNCTION: u8 = 0x01;

/// Illegal Data Address
pub const EXCEPTION_ILLEGAL_DATA_ADDRESS: u8 = 0x02;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_constants() {
        assert_eq!(REQUEST_FRAME_LEN, 8);
        assert_eq!(READ_RESPONSE_BASE_LEN, 3);
        assert_eq!(EXCEPTION_RESPONSE_LEN, 3);
    }

    #[test]
    fn test_register_limits() {
        // Largest read response must fit a single RTU ADU
        let read_adu_size = READ_RESPONSE_BASE_LEN + (MAX_READ_REGISTERS as usize * 2) + CRC_LEN;
        assert!(read_adu_size <= MAX_RTU_FRAME_SIZE);
        assert_eq!(MAX_READ_REGISTERS, 125);
    }
}
