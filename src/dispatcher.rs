//! # Request Dispatcher
//!
//! Routes a validated [`RequestFrame`] to its handler and builds exactly one
//! response: data, echo or exception. Address filtering and CRC checking
//! happen before a frame gets here.

use tracing::debug;

use crate::adu::ResponseFrame;
use crate::constants::MAX_READ_REGISTERS;
use crate::observer::RegisterObserver;
use crate::protocol::{ModbusException, ModbusRequest, RegisterKind, RequestFrame};
use crate::registers::RegisterBank;

/// What a handled request did, reported back to the host
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    /// No complete frame for this slave (silence, framing error, foreign address, bad CRC)
    Idle,
    /// Registers were read and returned
    Read {
        kind: RegisterKind,
        first_register: u16,
        count: u16,
    },
    /// A holding register was written
    Written { register: u16, value: u16 },
    /// The request was answered with an exception
    Exception {
        function_code: u8,
        exception: ModbusException,
    },
}

impl Transaction {
    /// Written value for FC06, `None` otherwise
    pub fn written_value(&self) -> Option<u16> {
        match self {
            Self::Written { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Whether a response was produced
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Handler output: the frame to send (without CRC) and what happened
#[derive(Debug, Clone)]
pub struct Reply {
    pub response: ResponseFrame,
    pub transaction: Transaction,
}

/// Decodes requests and applies them to a [`RegisterBank`]
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    max_read_registers: u16,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(MAX_READ_REGISTERS)
    }
}

impl Dispatcher {
    /// Dispatcher refusing reads of more than `max_read_registers`
    pub fn new(max_read_registers: u16) -> Self {
        Self {
            max_read_registers: max_read_registers.min(MAX_READ_REGISTERS),
        }
    }

    /// Handle one request addressed to this slave.
    pub fn dispatch<O: RegisterObserver + ?Sized>(
        &self,
        frame: &RequestFrame,
        registers: &mut RegisterBank<'_>,
        observer: &mut O,
    ) -> Reply {
        match frame.request() {
            ModbusRequest::ReadRegisters {
                kind,
                first_register,
                count,
            } => self.read_registers(frame, registers, observer, kind, first_register, count),
            ModbusRequest::WriteSingleRegister { register, value } => {
                Self::write_register(frame, registers, observer, register, value)
            }
            ModbusRequest::Unsupported { function_code } => {
                debug!("Unsupported function code: 0x{:02X}", function_code);
                Self::exception(frame, ModbusException::IllegalFunction)
            }
        }
    }

    fn read_registers<O: RegisterObserver + ?Sized>(
        &self,
        frame: &RequestFrame,
        registers: &RegisterBank<'_>,
        observer: &mut O,
        kind: RegisterKind,
        first_register: u16,
        count: u16,
    ) -> Reply {
        if count > self.max_read_registers {
            debug!(
                "Read of {} {} registers exceeds limit {}",
                count, kind, self.max_read_registers
            );
            return Self::exception(frame, ModbusException::IllegalDataAddress);
        }

        let values = match registers.read_range(kind, first_register, count) {
            Ok(values) => values,
            Err(e) => {
                debug!("Rejecting read: {}", e);
                return Self::exception(frame, ModbusException::IllegalDataAddress);
            }
        };

        let response =
            match ResponseFrame::read_registers(frame.slave_id, frame.function_code, values) {
                Ok(response) => response,
                Err(e) => {
                    debug!("Rejecting read: {}", e);
                    return Self::exception(frame, ModbusException::IllegalDataAddress);
                }
            };

        match kind {
            RegisterKind::Holding => observer.on_holding_read(response.as_slice()),
            RegisterKind::Input => observer.on_input_read(response.as_slice()),
        }

        Reply {
            response,
            transaction: Transaction::Read {
                kind,
                first_register,
                count,
            },
        }
    }

    fn write_register<O: RegisterObserver + ?Sized>(
        frame: &RequestFrame,
        registers: &mut RegisterBank<'_>,
        observer: &mut O,
        register: u16,
        value: u16,
    ) -> Reply {
        if usize::from(register) >= registers.size(RegisterKind::Holding) {
            debug!("Rejecting write to holding register {}", register);
            return Self::exception(frame, ModbusException::IllegalDataAddress);
        }

        observer.before_holding_write(frame.as_bytes());

        if let Err(e) = registers.write_single(register, value) {
            debug!("Rejecting write: {}", e);
            return Self::exception(frame, ModbusException::IllegalDataAddress);
        }
        debug!("Holding register {} <- 0x{:04X}", register, value);

        Reply {
            response: ResponseFrame::echo(frame),
            transaction: Transaction::Written { register, value },
        }
    }

    fn exception(frame: &RequestFrame, exception: ModbusException) -> Reply {
        Reply {
            response: ResponseFrame::exception(frame.slave_id, frame.function_code, exception),
            transaction: Transaction::Exception {
                function_code: frame.function_code,
                exception,
            },
        }
    }
}
