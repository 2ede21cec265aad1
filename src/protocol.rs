//! Modbus RTU request model
//!
//! A request arrives as eight raw bytes. [`RequestFrame`] splits them into
//! named header fields once, and [`ModbusRequest`] gives the two generic
//! 16-bit fields their meaning for the function code at hand.

use std::fmt;

use crate::bytes::ByteOrder;
use crate::constants::{
    EXCEPTION_ILLEGAL_DATA_ADDRESS, EXCEPTION_ILLEGAL_FUNCTION, FC_READ_HOLDING_REGISTERS,
    FC_READ_INPUT_REGISTERS, FC_WRITE_SINGLE_REGISTER, REQUEST_FRAME_LEN, REQUEST_PAYLOAD_LEN,
};
use crate::error::{ModbusError, ModbusResult};

/// Slave (unit) address
pub type SlaveId = u8;

/// Raw request bytes as delivered by the frame synchronizer
pub type RawRequest = [u8; REQUEST_FRAME_LEN];

/// Supported function codes
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModbusFunction {
    ReadHoldingRegisters,
    ReadInputRegisters,
    WriteSingleRegister,
}

impl ModbusFunction {
    /// Map a wire function code onto a supported function
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            FC_READ_HOLDING_REGISTERS => Some(Self::ReadHoldingRegisters),
            FC_READ_INPUT_REGISTERS => Some(Self::ReadInputRegisters),
            FC_WRITE_SINGLE_REGISTER => Some(Self::WriteSingleRegister),
            _ => None,
        }
    }

    /// Wire function code
    pub fn to_u8(self) -> u8 {
        match self {
            Self::ReadHoldingRegisters => FC_READ_HOLDING_REGISTERS,
            Self::ReadInputRegisters => FC_READ_INPUT_REGISTERS,
            Self::WriteSingleRegister => FC_WRITE_SINGLE_REGISTER,
        }
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Self::ReadHoldingRegisters => "Read Holding Registers",
            Self::ReadInputRegisters => "Read Input Registers",
            Self::WriteSingleRegister => "Write Single Register",
        }
    }
}

impl TryFrom<u8> for ModbusFunction {
    type Error = ModbusError;

    fn try_from(code: u8) -> ModbusResult<Self> {
        Self::from_u8(code).ok_or_else(|| ModbusError::invalid_function(code))
    }
}

impl fmt::Display for ModbusFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.to_u8())
    }
}

/// Exception codes this slave answers with
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModbusException {
    /// Function code not supported
    IllegalFunction,
    /// Register range outside the bank or above the read limit
    IllegalDataAddress,
}

impl ModbusException {
    /// Wire exception code
    pub fn to_u8(self) -> u8 {
        match self {
            Self::IllegalFunction => EXCEPTION_ILLEGAL_FUNCTION,
            Self::IllegalDataAddress => EXCEPTION_ILLEGAL_DATA_ADDRESS,
        }
    }

    /// Parse a wire exception code
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            EXCEPTION_ILLEGAL_FUNCTION => Some(Self::IllegalFunction),
            EXCEPTION_ILLEGAL_DATA_ADDRESS => Some(Self::IllegalDataAddress),
            _ => None,
        }
    }
}

impl fmt::Display for ModbusException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalFunction => write!(f, "Illegal Function"),
            Self::IllegalDataAddress => write!(f, "Illegal Data Address"),
        }
    }
}

/// Register table addressed by a request
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterKind {
    /// Read-only from the protocol's side
    Input,
    /// Read/write
    Holding,
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Holding => write!(f, "holding"),
        }
    }
}

/// Typed request, decoded once from the header fields
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModbusRequest {
    /// FC03 / FC04
    ReadRegisters {
        kind: RegisterKind,
        first_register: u16,
        count: u16,
    },
    /// FC06
    WriteSingleRegister { register: u16, value: u16 },
    /// Any other function code
    Unsupported { function_code: u8 },
}

impl ModbusRequest {
    /// Supported function of this request, if any
    pub fn function(&self) -> Option<ModbusFunction> {
        match self {
            Self::ReadRegisters {
                kind: RegisterKind::Holding,
                ..
            } => Some(ModbusFunction::ReadHoldingRegisters),
            Self::ReadRegisters {
                kind: RegisterKind::Input,
                ..
            } => Some(ModbusFunction::ReadInputRegisters),
            Self::WriteSingleRegister { .. } => Some(ModbusFunction::WriteSingleRegister),
            Self::Unsupported { .. } => None,
        }
    }
}

/// Fixed-layout request frame.
///
/// `field_a` and `field_b` are already converted to host order; `crc` is
/// the value transmitted little-endian in the last two bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFrame {
    pub slave_id: SlaveId,
    pub function_code: u8,
    pub field_a: u16,
    pub field_b: u16,
    pub crc: u16,
    raw: RawRequest,
}

impl RequestFrame {
    /// Split raw request bytes into header fields.
    pub fn from_bytes(raw: RawRequest) -> Self {
        Self {
            slave_id: raw[0],
            function_code: raw[1],
            field_a: ByteOrder::PROTOCOL.read(&raw, 2),
            field_b: ByteOrder::PROTOCOL.read(&raw, 4),
            crc: ByteOrder::PAYLOAD.read(&raw, REQUEST_PAYLOAD_LEN),
            raw,
        }
    }

    /// Interpret the header fields for this frame's function code.
    pub fn request(&self) -> ModbusRequest {
        match ModbusFunction::from_u8(self.function_code) {
            Some(ModbusFunction::ReadHoldingRegisters) => ModbusRequest::ReadRegisters {
                kind: RegisterKind::Holding,
                first_register: self.field_a,
                count: self.field_b,
            },
            Some(ModbusFunction::ReadInputRegisters) => ModbusRequest::ReadRegisters {
                kind: RegisterKind::Input,
                first_register: self.field_a,
                count: self.field_b,
            },
            Some(ModbusFunction::WriteSingleRegister) => ModbusRequest::WriteSingleRegister {
                register: self.field_a,
                value: self.field_b,
            },
            None => ModbusRequest::Unsupported {
                function_code: self.function_code,
            },
        }
    }

    /// All eight bytes as received
    pub fn as_bytes(&self) -> &RawRequest {
        &self.raw
    }

    /// Request bytes without the CRC
    pub fn payload(&self) -> &[u8] {
        &self.raw[..REQUEST_PAYLOAD_LEN]
    }
}

impl TryFrom<&[u8]> for RequestFrame {
    type Error = ModbusError;

    /// Accepts exactly one request; CRC is not checked here.
    fn try_from(bytes: &[u8]) -> ModbusResult<Self> {
        let raw = RawRequest::try_from(bytes).map_err(|_| {
            ModbusError::frame(format!(
                "Request must be {} bytes, got {}",
                REQUEST_FRAME_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self::from_bytes(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_code_mapping() {
        for code in [0x03, 0x04, 0x06] {
            let function = ModbusFunction::from_u8(code).unwrap();
            assert_eq!(function.to_u8(), code);
        }
        assert_eq!(ModbusFunction::from_u8(0x05), None);
        assert_eq!(ModbusFunction::from_u8(0x10), None);
        assert_eq!(
            ModbusFunction::ReadInputRegisters.to_string(),
            "Read Input Registers (0x04)"
        );
    }

    #[test]
    fn test_exception_codes() {
        assert_eq!(ModbusException::IllegalFunction.to_u8(), 0x01);
        assert_eq!(ModbusException::IllegalDataAddress.to_u8(), 0x02);
        assert_eq!(
            ModbusException::from_u8(0x02),
            Some(ModbusException::IllegalDataAddress)
        );
        assert_eq!(ModbusException::from_u8(0x06), None);
    }

    #[test]
    fn test_decode_read_request() {
        let frame = RequestFrame::from_bytes([0x01, 0x03, 0x00, 0x0F, 0x00, 0x02, 0xF4, 0x08]);
        assert_eq!(frame.slave_id, 0x01);
        assert_eq!(frame.field_a, 0x000F);
        assert_eq!(frame.field_b, 0x0002);
        assert_eq!(frame.crc, 0x08F4);
        assert_eq!(
            frame.request(),
            ModbusRequest::ReadRegisters {
                kind: RegisterKind::Holding,
                first_register: 15,
                count: 2,
            }
        );
        assert_eq!(
            frame.request().function(),
            Some(ModbusFunction::ReadHoldingRegisters)
        );
    }

    #[test]
    fn test_decode_write_request() {
        let raw = [0x12, 0x06, 0x22, 0x22, 0xAB, 0xCD, 0x9F, 0xBE];
        let frame = RequestFrame::from_bytes(raw);
        assert_eq!(
            frame.request(),
            ModbusRequest::WriteSingleRegister {
                register: 0x2222,
                value: 0xABCD,
            }
        );
        assert_eq!(frame.as_bytes(), &raw);
        assert_eq!(frame.payload(), &raw[..6]);
    }

    #[test]
    fn test_decode_unsupported() {
        let frame = RequestFrame::from_bytes([0x01, 0x05, 0x00, 0x00, 0xFF, 0x00, 0x8C, 0x3A]);
        assert_eq!(
            frame.request(),
            ModbusRequest::Unsupported {
                function_code: 0x05
            }
        );
        assert_eq!(frame.request().function(), None);
    }

    #[test]
    fn test_try_from_conversions() {
        assert_eq!(
            ModbusFunction::try_from(0x04).unwrap(),
            ModbusFunction::ReadInputRegisters
        );
        assert!(matches!(
            ModbusFunction::try_from(0x2B),
            Err(ModbusError::InvalidFunction { code: 0x2B })
        ));

        let bytes = [0x01u8, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A];
        let frame = RequestFrame::try_from(&bytes[..]).unwrap();
        assert_eq!(frame.crc, 0x0A84);
        assert!(matches!(
            RequestFrame::try_from(&bytes[..7]),
            Err(ModbusError::Frame { .. })
        ));
    }
}
