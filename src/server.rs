//! # Server Loop
//!
//! [`RtuSlave`] ties the pieces together. Each call to [`RtuSlave::poll`]
//! pulls available bytes, and when a full request is assembled:
//!
//! 1. drops it silently unless it is addressed to this slave,
//! 2. drops it silently if the CRC does not match,
//! 3. dispatches it and appends the CRC to the response,
//! 4. writes the response to the sink.
//!
//! `poll` never waits. An `Err` only means the injected source or sink
//! failed; protocol problems become exception frames or silence.
//!
//! ```rust
//! use std::collections::VecDeque;
//! use rtu_slave::{ManualClock, RegisterBank, RtuSlave, SlaveConfig, Transaction};
//!
//! let mut input = [0u16; 8];
//! let mut holding = [0x1234u16; 8];
//! let registers = RegisterBank::new(&mut input, &mut holding)?;
//!
//! let line: VecDeque<u8> = [0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A].into();
//! let mut slave = RtuSlave::new(
//!     SlaveConfig::new(1),
//!     registers,
//!     line,
//!     Vec::<u8>::new(),
//!     ManualClock::default(),
//! )?;
//!
//! assert!(matches!(slave.poll()?, Transaction::Read { count: 1, .. }));
//! assert_eq!(slave.sink(), &vec![0x01, 0x03, 0x02, 0x34, 0x12, 0x2E, 0x89]);
//! # Ok::<(), rtu_slave::ModbusError>(())
//! ```

use tracing::{debug, info, trace};

use crate::checksum;
use crate::clock::Clock;
use crate::config::SlaveConfig;
use crate::constants::REQUEST_PAYLOAD_LEN;
use crate::dispatcher::{Dispatcher, Reply, Transaction};
use crate::error::ModbusResult;
use crate::framing::{FrameSynchronizer, SyncEvent};
use crate::observer::RegisterObserver;
use crate::protocol::{RawRequest, RegisterKind, RequestFrame, SlaveId};
use crate::registers::RegisterBank;
use crate::transport::{ByteSink, ByteSource};

/// Traffic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlaveStats {
    /// Complete frames assembled, any address
    pub frames_received: u64,
    /// Responses written to the sink
    pub responses_sent: u64,
    /// Of those, exception responses
    pub exceptions_sent: u64,
    /// Frames for this slave dropped on CRC mismatch
    pub crc_errors: u64,
    /// Frames for other slaves
    pub address_mismatches: u64,
    /// Partial frames discarded (timeout or overrun)
    pub framing_errors: u64,
    /// Bytes read from the source
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

/// Modbus RTU slave over an injected byte source and sink
pub struct RtuSlave<'r, S, W, C, O = ()>
where
    C: Clock,
{
    config: SlaveConfig,
    registers: RegisterBank<'r>,
    source: S,
    sink: W,
    synchronizer: FrameSynchronizer<C>,
    dispatcher: Dispatcher,
    observer: O,
    stats: SlaveStats,
    packet_logging: bool,
}

impl<'r, S, W, C> RtuSlave<'r, S, W, C>
where
    S: ByteSource,
    W: ByteSink,
    C: Clock,
{
    /// Create a slave; fails if `config` does not validate.
    pub fn new(
        config: SlaveConfig,
        registers: RegisterBank<'r>,
        source: S,
        sink: W,
        clock: C,
    ) -> ModbusResult<Self> {
        config.validate()?;
        let timeout = config.inter_frame_timeout();
        info!(
            "RTU slave {} ready: {} baud, inter-frame timeout {}us, {} input / {} holding registers",
            config.slave_id,
            config.baud_rate,
            timeout.as_micros(),
            registers.size(RegisterKind::Input),
            registers.size(RegisterKind::Holding),
        );

        Ok(Self {
            config,
            registers,
            source,
            sink,
            synchronizer: FrameSynchronizer::new(clock, timeout),
            dispatcher: Dispatcher::new(config.max_read_registers),
            observer: (),
            stats: SlaveStats::default(),
            packet_logging: false,
        })
    }
}

impl<'r, S, W, C, O> RtuSlave<'r, S, W, C, O>
where
    S: ByteSource,
    W: ByteSink,
    C: Clock,
    O: RegisterObserver,
{
    /// Replace the observer receiving register hooks.
    pub fn with_observer<P: RegisterObserver>(self, observer: P) -> RtuSlave<'r, S, W, C, P> {
        RtuSlave {
            config: self.config,
            registers: self.registers,
            source: self.source,
            sink: self.sink,
            synchronizer: self.synchronizer,
            dispatcher: self.dispatcher,
            observer,
            stats: self.stats,
            packet_logging: self.packet_logging,
        }
    }

    /// Enable or disable hex logging of every frame in and out
    pub fn set_packet_logging(&mut self, enabled: bool) {
        self.packet_logging = enabled;
    }

    /// Process whatever has arrived since the last call.
    ///
    /// Returns [`Transaction::Idle`] unless a request for this slave was
    /// answered during this call.
    pub fn poll(&mut self) -> ModbusResult<Transaction> {
        let event = self.synchronizer.poll(&mut self.source)?;
        self.stats.bytes_received = self.synchronizer.bytes_received();
        self.stats.framing_errors = self.synchronizer.framing_errors();

        let SyncEvent::FrameReady(raw) = event else {
            return Ok(Transaction::Idle);
        };

        self.stats.frames_received += 1;
        if self.packet_logging {
            log_packet("receive", &raw, raw[0]);
        }

        let Some(frame) = self.accept(raw)? else {
            return Ok(Transaction::Idle);
        };

        let Reply {
            mut response,
            transaction,
        } = self
            .dispatcher
            .dispatch(&frame, &mut self.registers, &mut self.observer);
        response.append_crc()?;

        if self.packet_logging {
            log_packet("send", response.as_slice(), frame.slave_id);
        }
        self.sink.write_frame(response.as_slice())?;

        self.stats.responses_sent += 1;
        self.stats.bytes_sent += response.len() as u64;
        if response.is_exception() {
            self.stats.exceptions_sent += 1;
        }

        Ok(transaction)
    }

    /// Address filter then integrity check; `None` means drop silently.
    fn accept(&mut self, raw: RawRequest) -> ModbusResult<Option<RequestFrame>> {
        if raw[0] != self.config.slave_id {
            self.stats.address_mismatches += 1;
            trace!(
                "Ignoring frame for slave {} (we are {})",
                raw[0],
                self.config.slave_id
            );
            return Ok(None);
        }

        if !checksum::verify(&raw, REQUEST_PAYLOAD_LEN)? {
            self.stats.crc_errors += 1;
            debug!("CRC mismatch, dropping frame {:02X?}", raw);
            return Ok(None);
        }

        Ok(Some(RequestFrame::from_bytes(raw)))
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.synchronizer.reset();
    }

    /// Register tables
    pub fn registers(&self) -> &RegisterBank<'r> {
        &self.registers
    }

    /// Register tables, for host-side updates between polls
    pub fn registers_mut(&mut self) -> &mut RegisterBank<'r> {
        &mut self.registers
    }

    pub fn config(&self) -> &SlaveConfig {
        &self.config
    }

    pub fn stats(&self) -> &SlaveStats {
        &self.stats
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    pub fn clock(&self) -> &C {
        self.synchronizer.clock()
    }
}

/// Format raw bytes as hex string for packet logging
fn format_hex_packet(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn log_packet(direction: &str, data: &[u8], slave_id: SlaveId) {
    info!(
        "[MODBUS-RTU] {} slave:{} {}",
        direction,
        slave_id,
        format_hex_packet(data)
    );
}
