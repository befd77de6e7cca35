//! Shared state-machine contract for the concrete framings in this module.
//!
//! Every framing follows the same arc: **Idle → WaitStart → WaitBody →
//! Process → WaitStart | Error**. `Process` is implicit — it is the instant
//! a complete frame is recognized and `ParserEvent::FrameReady` is returned,
//! after which the framing resets straight to `WaitStart` for the next
//! frame. A parser that has been sitting in `WaitBody` for the reception
//! timeout without progress reports `ParserEvent::ReceptionTimeout` and
//! also resets to `WaitStart`, without ever entering `Error` — framing is
//! still intact, only this particular frame was abandoned. Only a byte
//! sequence that violates the framing itself moves to `Error`, which
//! requires an explicit `reset_error()` to leave.

use crate::config::PARSER_RECEPTION_TIMEOUT_MS;

/// Where one concrete framing's internal state machine currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Not yet bound to a stream, or deliberately idle.
    Idle,
    /// Waiting for the first byte of a new frame.
    WaitStart,
    /// A frame has begun; waiting for the rest of it to arrive.
    WaitBody,
    /// A framing violation occurred; stuck until `reset_error()`.
    Error,
}

/// Something a framing's `feed_byte`/`poll_timeout` call wants the caller
/// to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserEvent {
    /// A full frame is ready; read it via the framing's `frame()` accessor.
    FrameReady,
    /// No progress for the reception timeout with a frame open.
    ReceptionTimeout,
    /// The byte stream itself reported a failure.
    IoException,
    /// Bytes were received but did not satisfy the framing.
    MalformedPacket,
}

/// Tracks the deadline for the "no progress while a frame is open" timeout,
/// shared verbatim by every concrete framing.
#[derive(Debug, Clone, Copy)]
pub struct ReceptionTimeout {
    last_progress_ms: u64,
}

impl ReceptionTimeout {
    pub const fn new() -> Self {
        Self {
            last_progress_ms: 0,
        }
    }

    pub fn mark_progress(&mut self, now_ms: u64) {
        self.last_progress_ms = now_ms;
    }

    /// `true` once `PARSER_RECEPTION_TIMEOUT_MS` have elapsed since the
    /// last `mark_progress`.
    pub fn has_elapsed(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_progress_ms) >= u64::from(PARSER_RECEPTION_TIMEOUT_MS)
    }
}

impl Default for ReceptionTimeout {
    fn default() -> Self {
        Self::new()
    }
}
