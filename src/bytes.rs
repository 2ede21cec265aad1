//! # Byte Order Handling for RTU Frames
//!
//! Two independent 16-bit encodings appear on the wire and must never be
//! mixed up:
//!
//! - **Protocol fields** (register address, register count, the value of a
//!   single-register write) are big-endian: `0x1234` → \[0x12, 0x34\].
//! - **Payload words and CRC** (register values inside a read response, the
//!   trailing checksum) are sent as held in memory, little-endian:
//!   `0x1234` → \[0x34, 0x12\].
//!
//! The payload ordering is specific to the deployed devices this slave talks
//! to; standard Modbus sends register values big-endian.

use std::fmt;

/// Byte order of a 16-bit word on the wire.
///
/// # Example
///
/// ```rust
/// use rtu_slave::ByteOrder;
///
/// assert_eq!(ByteOrder::PROTOCOL.encode(0x1234), [0x12, 0x34]);
/// assert_eq!(ByteOrder::PAYLOAD.encode(0x1234), [0x34, 0x12]);
/// ```
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// 16-bit big-endian: AB
    ///
    /// Example: 0x1234 → \[0x12, 0x34\]
    BigEndian16,

    /// 16-bit little-endian: BA
    ///
    /// Example: 0x1234 → \[0x34, 0x12\]
    LittleEndian16,
}

impl ByteOrder {
    /// Order of header fields (addresses, counts, written value)
    pub const PROTOCOL: ByteOrder = ByteOrder::BigEndian16;

    /// Order of read-response register values and of the CRC
    pub const PAYLOAD: ByteOrder = ByteOrder::LittleEndian16;

    /// Get descriptive name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BigEndian16 => "AB (Big-Endian 16)",
            Self::LittleEndian16 => "BA (Little-Endian 16)",
        }
    }

    /// Encode a host value into its two wire bytes.
    #[inline]
    pub fn encode(self, value: u16) -> [u8; 2] {
        match self {
            Self::BigEndian16 => value.to_be_bytes(),
            Self::LittleEndian16 => value.to_le_bytes(),
        }
    }

    /// Decode two wire bytes into a host value.
    #[inline]
    pub fn decode(self, bytes: [u8; 2]) -> u16 {
        match self {
            Self::BigEndian16 => u16::from_be_bytes(bytes),
            Self::LittleEndian16 => u16::from_le_bytes(bytes),
        }
    }

    /// Read a word at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` holds fewer than `offset + 2` bytes.
    #[inline]
    pub fn read(self, buf: &[u8], offset: usize) -> u16 {
        self.decode([buf[offset], buf[offset + 1]])
    }

    /// Write a word at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` holds fewer than `offset + 2` bytes.
    #[inline]
    pub fn write(self, buf: &mut [u8], offset: usize, value: u16) {
        buf[offset..offset + 2].copy_from_slice(&self.encode(value));
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for ByteOrder {
    /// Default to the protocol field order.
    fn default() -> Self {
        Self::PROTOCOL
    }
}

// ============================================================================
// Tests
// ============================================================================
