//! Byte source / sink abstraction
//!
//! The slave never owns the physical line. The host injects a non-blocking
//! [`ByteSource`] and a fire-and-forget [`ByteSink`]; the `rtu` feature adds
//! [`SerialLink`], which implements both over a serial port.
//!
//! ```rust
//! use rtu_slave::{ByteSink, ByteSource, FnSink, FnSource};
//!
//! let mut source = FnSource(|_buf: &mut [u8]| 0usize);
//! let mut sent = Vec::new();
//! let mut sink = FnSink(|frame: &[u8]| sent.extend_from_slice(frame));
//!
//! let mut buf = [0u8; 8];
//! assert_eq!(source.try_read(&mut buf).unwrap(), 0);
//! sink.write_frame(&[0x01, 0x83, 0x02]).unwrap();
//! drop(sink);
//! assert_eq!(sent, vec![0x01, 0x83, 0x02]);
//! ```

use std::collections::VecDeque;

use crate::error::ModbusResult;

/// Non-blocking byte input
pub trait ByteSource {
    /// Copy up to `buf.len()` available bytes into `buf`.
    ///
    /// Returns `Ok(0)` when nothing is available; never waits.
    fn try_read(&mut self, buf: &mut [u8]) -> ModbusResult<usize>;
}

/// Frame output
pub trait ByteSink {
    /// Transmit a complete frame.
    fn write_frame(&mut self, frame: &[u8]) -> ModbusResult<()>;
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn try_read(&mut self, buf: &mut [u8]) -> ModbusResult<usize> {
        (**self).try_read(buf)
    }
}

impl<T: ByteSink + ?Sized> ByteSink for &mut T {
    fn write_frame(&mut self, frame: &[u8]) -> ModbusResult<()> {
        (**self).write_frame(frame)
    }
}

/// Drains queued bytes; handy for simulations and tests.
impl ByteSource for VecDeque<u8> {
    fn try_read(&mut self, buf: &mut [u8]) -> ModbusResult<usize> {
        let n = buf.len().min(self.len());
        for (slot, byte) in buf.iter_mut().zip(self.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

/// Collects every transmitted frame back to back.
impl ByteSink for Vec<u8> {
    fn write_frame(&mut self, frame: &[u8]) -> ModbusResult<()> {
        self.extend_from_slice(frame);
        Ok(())
    }
}

/// Host read function used as a [`ByteSource`]
pub struct FnSource<F>(pub F);

impl<F> ByteSource for FnSource<F>
where
    F: FnMut(&mut [u8]) -> usize,
{
    fn try_read(&mut self, buf: &mut [u8]) -> ModbusResult<usize> {
        Ok((self.0)(buf))
    }
}

/// Host write function used as a [`ByteSink`]
pub struct FnSink<F>(pub F);

impl<F> ByteSink for FnSink<F>
where
    F: FnMut(&[u8]),
{
    fn write_frame(&mut self, frame: &[u8]) -> ModbusResult<()> {
        (self.0)(frame);
        Ok(())
    }
}

#[cfg(feature = "rtu")]
pub use serial::SerialLink;

#[cfg(feature = "rtu")]
mod serial {
    use std::io::{Read, Write};
    use std::time::Duration;

    use tokio_serial::SerialPort;
    use tracing::info;

    use super::{ByteSink, ByteSource};
    use crate::error::{ModbusError, ModbusResult};

    /// Serial port configured 8E1 (8 data bits, even parity, 1 stop bit)
    pub struct SerialLink {
        port: Box<dyn SerialPort>,
        port_name: String,
    }

    impl SerialLink {
        /// Open `port_name` at `baud_rate`.
        pub fn open(port_name: &str, baud_rate: u32) -> ModbusResult<Self> {
            let port = tokio_serial::new(port_name, baud_rate)
                .data_bits(tokio_serial::DataBits::Eight)
                .parity(tokio_serial::Parity::Even)
                .stop_bits(tokio_serial::StopBits::One)
                .timeout(Duration::ZERO)
                .open()
                .map_err(|e| {
                    ModbusError::transport(format!(
                        "Failed to open serial port {}: {}",
                        port_name, e
                    ))
                })?;

            info!("Opened serial port {} at {} baud (8E1)", port_name, baud_rate);

            Ok(Self {
                port,
                port_name: port_name.to_string(),
            })
        }

        /// Port name/path
        pub fn port_name(&self) -> &str {
            &self.port_name
        }
    }

    impl ByteSource for SerialLink {
        fn try_read(&mut self, buf: &mut [u8]) -> ModbusResult<usize> {
            let available = self.port.bytes_to_read().map_err(|e| {
                ModbusError::transport(format!("{}: failed to poll input: {}", self.port_name, e))
            })? as usize;
            if available == 0 {
                return Ok(0);
            }
            let n = available.min(buf.len());
            Ok(self.port.read(&mut buf[..n])?)
        }
    }

    impl ByteSink for SerialLink {
        fn write_frame(&mut self, frame: &[u8]) -> ModbusResult<()> {
            self.port.write_all(frame)?;
            Ok(())
        }
    }
}
