//! # RTU Slave - Modbus RTU Slave Core
//!
//! The slave side of Modbus RTU over an asynchronous serial line: bytes in,
//! silence-delimited frames, CRC-16 checking, a register bank, and framed
//! responses or exceptions out.
//!
//! The core never owns the line or the register memory. The host supplies a
//! non-blocking [`ByteSource`], a [`ByteSink`], a [`Clock`] and two register
//! arrays, then calls [`RtuSlave::poll`] from its own loop.
//!
//! ## Supported Function Codes
//!
//! | Code | Function | Slave |
//! |------|----------|-------|
//! | 0x03 | Read Holding Registers | ✅ |
//! | 0x04 | Read Input Registers | ✅ |
//! | 0x06 | Write Single Register | ✅ |
//!
//! Any other code is answered with exception 0x01 (Illegal Function).
//!
//! ## Byte Order
//!
//! Header fields (address, quantity, written value) are big-endian. Register
//! values in read responses and the CRC are little-endian, low byte first.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rtu_slave::{
//!     FnSink, FnSource, MonotonicClock, ModbusResult, RegisterBank, RtuSlave, SlaveConfig,
//! };
//!
//! fn main() -> ModbusResult<()> {
//!     let mut input = [0u16; 16];
//!     let mut holding = [0u16; 16];
//!     let registers = RegisterBank::new(&mut input, &mut holding)?;
//!
//!     let source = FnSource(|_buf: &mut [u8]| 0usize); // UART receive FIFO
//!     let sink = FnSink(|_frame: &[u8]| {}); // UART transmit
//!
//!     let mut slave = RtuSlave::new(
//!         SlaveConfig::new(1).with_baud_rate(19_200),
//!         registers,
//!         source,
//!         sink,
//!         MonotonicClock::new(),
//!     )?;
//!
//!     loop {
//!         if let Some(value) = slave.poll()?.written_value() {
//!             println!("holding register written: {value:#06X}");
//!         }
//!     }
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Core error types and result handling
pub mod error;

/// Modbus RTU constants
pub mod constants;

/// CRC-16/MODBUS
pub mod checksum;

/// Byte order of header fields and payload words
pub mod bytes;

/// Function codes, exception codes and request decoding
pub mod protocol;

/// Stack-allocated response frames
pub mod adu;

/// Host-owned register tables
pub mod registers;

// ============================================================================
// Line handling
// ============================================================================

/// Wrapping microsecond clock
pub mod clock;

/// Byte source and sink abstraction
pub mod transport;

/// Silence-delimited frame reassembly
pub mod framing;

// ============================================================================
// Slave
// ============================================================================

/// Host callbacks for register traffic
pub mod observer;

/// Request routing and handlers
pub mod dispatcher;

/// Slave configuration
pub mod config;

/// Polling server loop
pub mod server;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Error handling ===
pub use error::{ModbusError, ModbusResult};

// === Core types ===
pub use bytes::ByteOrder;
pub use protocol::{
    ModbusException, ModbusFunction, ModbusRequest, RawRequest, RegisterKind, RequestFrame,
    SlaveId,
};
pub use registers::RegisterBank;

// === Slave ===
pub use config::SlaveConfig;
pub use dispatcher::{Dispatcher, Reply, Transaction};
pub use observer::RegisterObserver;
pub use server::{RtuSlave, SlaveStats};

// === Line handling ===
pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use framing::{DiscardReason, FrameSynchronizer, SyncEvent, SyncState};
pub use transport::{ByteSink, ByteSource, FnSink, FnSource};

#[cfg(feature = "rtu")]
pub use transport::SerialLink;

// === Frames (advanced usage) ===
pub use adu::ResponseFrame;

// === Protocol limits (commonly needed constants) ===
pub use constants::{MAX_READ_REGISTERS, MAX_SLAVE_ID, REQUEST_FRAME_LEN};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn info() -> String {
    format!("RTU Slave v{} - Modbus RTU slave core", VERSION)
}
