//! # Frame Synchronizer
//!
//! RTU has no length prefix and no delimiter; a frame ends when the line
//! goes quiet. Every supported request is exactly [`REQUEST_FRAME_LEN`]
//! bytes, so the synchronizer collects bytes until it has that many, and
//! throws away a partial frame once the line has been silent for the
//! inter-frame timeout.
//!
//! ```text
//!            first byte              8 bytes collected
//!   Idle ───────────────▶ Accumulating ───────────────▶ FrameReady ─▶ Idle
//!    ▲                        │
//!    └────────────────────────┘
//!      silence ≥ timeout, or more than 8 bytes (discarded)
//! ```
//!
//! Silence is measured from the last byte observed, using a wrapping
//! [`Clock`]. The host must call [`FrameSynchronizer::poll`] more often than
//! the timeout; bytes are timestamped when they are observed, not when they
//! hit the wire.

use std::time::Duration;

use heapless::Vec as FrameBuffer;
use tracing::{trace, warn};

use crate::clock::{Clock, Timestamp};
use crate::constants::{MAX_RTU_FRAME_SIZE, REQUEST_FRAME_LEN};
use crate::error::ModbusResult;
use crate::protocol::RawRequest;
use crate::transport::ByteSource;

/// Synchronizer state between polls
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No bytes pending
    Idle,
    /// Part of a frame received
    Accumulating,
}

/// Why pending bytes were thrown away
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Line went silent before the frame was complete
    Timeout,
    /// More bytes arrived than a request can hold
    Overrun,
}

/// Result of one synchronizer poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// Nothing pending, nothing arrived
    Idle,
    /// Partial frame held; `pending` bytes so far
    Accumulating { pending: usize },
    /// A complete request
    FrameReady(RawRequest),
    /// Pending bytes dropped as a framing error
    Discarded { bytes: usize, reason: DiscardReason },
}

/// Reassembles fixed-length requests from a byte stream
#[derive(Debug)]
pub struct FrameSynchronizer<C: Clock> {
    clock: C,
    inter_frame_timeout: Duration,
    last_activity: Timestamp,
    pending: FrameBuffer<u8, REQUEST_FRAME_LEN>,
    bytes_received: u64,
    framing_errors: u64,
}

impl<C: Clock> FrameSynchronizer<C> {
    /// Create a synchronizer that gives up on partial frames after `inter_frame_timeout` of silence.
    pub fn new(clock: C, inter_frame_timeout: Duration) -> Self {
        let last_activity = clock.now();
        Self {
            clock,
            inter_frame_timeout,
            last_activity,
            pending: FrameBuffer::new(),
            bytes_received: 0,
            framing_errors: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> SyncState {
        if self.pending.is_empty() {
            SyncState::Idle
        } else {
            SyncState::Accumulating
        }
    }

    /// Silence after which a partial frame is dropped
    pub fn inter_frame_timeout(&self) -> Duration {
        self.inter_frame_timeout
    }

    /// Number of bytes held for the frame in progress
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The clock driving the timeout
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Total bytes read from the source
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Partial frames discarded so far, for any reason
    pub fn framing_errors(&self) -> u64 {
        self.framing_errors
    }

    /// Pull whatever the source has and advance the state machine.
    ///
    /// Never blocks. Reads at most one maximum-size burst per call.
    pub fn poll<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> ModbusResult<SyncEvent> {
        let mut chunk = [0u8; MAX_RTU_FRAME_SIZE];
        let received = source.try_read(&mut chunk)?;
        let now = self.clock.now();

        if received == 0 {
            return Ok(self.check_silence(now));
        }

        // Bytes after a long gap start a new frame
        let mut stale = None;
        if !self.pending.is_empty() && self.silence_expired(now) {
            stale = Some(self.discard(DiscardReason::Timeout));
        }

        self.last_activity = now;
        self.bytes_received += received as u64;
        let bytes = &chunk[..received];

        if self.pending.extend_from_slice(bytes).is_err() {
            let dropped = self.pending.len() + bytes.len();
            self.pending.clear();
            self.framing_errors += 1;
            warn!(
                "Discarding {} bytes: more than a {}-byte request",
                dropped, REQUEST_FRAME_LEN
            );
            return Ok(SyncEvent::Discarded {
                bytes: dropped,
                reason: DiscardReason::Overrun,
            });
        }

        if self.pending.len() == REQUEST_FRAME_LEN {
            let mut frame = [0u8; REQUEST_FRAME_LEN];
            frame.copy_from_slice(&self.pending);
            self.pending.clear();
            trace!("Frame ready: {:02X?}", frame);
            return Ok(SyncEvent::FrameReady(frame));
        }

        // A stale fragment outranks the progress report; the new bytes stay pending
        Ok(stale.unwrap_or(SyncEvent::Accumulating {
            pending: self.pending.len(),
        }))
    }

    /// Drop any partial frame immediately.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.last_activity = self.clock.now();
    }

    fn check_silence(&mut self, now: Timestamp) -> SyncEvent {
        if self.pending.is_empty() {
            self.last_activity = now;
            return SyncEvent::Idle;
        }
        if self.silence_expired(now) {
            self.last_activity = now;
            return self.discard(DiscardReason::Timeout);
        }
        SyncEvent::Accumulating {
            pending: self.pending.len(),
        }
    }

    fn silence_expired(&self, now: Timestamp) -> bool {
        now.elapsed_since(self.last_activity) >= self.inter_frame_timeout
    }

    fn discard(&mut self, reason: DiscardReason) -> SyncEvent {
        let bytes = self.pending.len();
        self.pending.clear();
        self.framing_errors += 1;
        warn!("Discarding {} pending bytes ({:?})", bytes, reason);
        SyncEvent::Discarded { bytes, reason }
    }
}
