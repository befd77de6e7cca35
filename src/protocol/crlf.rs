//! Line-oriented framing: bytes accumulate until a `\r\n` sequence; the
//! delivered frame has the CRLF stripped and a trailing NUL appended so it
//! can be treated as a C string by callers that want that.
//!
//! Supports a paused mode that suspends byte consumption without
//! discarding whatever partial line has already been buffered — useful
//! when a higher layer needs to switch a shared stream to binary mode
//! mid-session and resume line framing later.

use crate::config::CRLF_MAX_LINE_BYTES;
use crate::containers::ByteBuffer;

use super::base::{ParserEvent, ParserState, ReceptionTimeout};

pub struct CrlfParser {
    recv: ByteBuffer<CRLF_MAX_LINE_BYTES>,
    state: ParserState,
    timeout: ReceptionTimeout,
    paused: bool,
    saw_cr: bool,
}

impl CrlfParser {
    pub const fn new() -> Self {
        Self {
            recv: ByteBuffer::new(),
            state: ParserState::WaitStart,
            timeout: ReceptionTimeout::new(),
            paused: false,
            saw_cr: false,
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// The line most recently completed, CRLF-stripped, NUL-terminated.
    /// Valid until the next `feed_byte` call.
    pub fn frame(&self) -> &[u8] {
        self.recv.as_slice()
    }

    pub fn reset_error(&mut self) {
        if self.state == ParserState::Error {
            self.state = ParserState::WaitStart;
            self.recv.clear();
            self.saw_cr = false;
        }
    }

    pub fn poll_timeout(&mut self, now_ms: u64) -> Option<ParserEvent> {
        if self.state == ParserState::WaitBody && self.timeout.has_elapsed(now_ms) {
            self.state = ParserState::WaitStart;
            self.recv.clear();
            self.saw_cr = false;
            return Some(ParserEvent::ReceptionTimeout);
        }
        None
    }

    /// Feed one byte. No-op while paused or in `Error`.
    pub fn feed_byte(&mut self, byte: u8, now_ms: u64) -> Option<ParserEvent> {
        if self.paused || self.state == ParserState::Error {
            return None;
        }

        if self.state == ParserState::WaitStart {
            self.recv.clear();
            self.state = ParserState::WaitBody;
        }
        self.timeout.mark_progress(now_ms);

        if self.saw_cr {
            self.saw_cr = false;
            if byte == b'\n' {
                self.recv.append_u8(0); // NUL-terminate for C-string-style consumers
                self.state = ParserState::WaitStart;
                return Some(ParserEvent::FrameReady);
            }
            // Lone CR not followed by LF: treat as ordinary data byte.
            if !self.recv.append_bytes(&[b'\r']) {
                self.state = ParserState::Error;
                return Some(ParserEvent::MalformedPacket);
            }
        }

        if byte == b'\r' {
            self.saw_cr = true;
            return None;
        }

        if !self.recv.append_u8(byte) {
            self.state = ParserState::Error;
            return Some(ParserEvent::MalformedPacket);
        }
        None
    }
}

impl Default for CrlfParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame `payload` (which must not itself contain `\r\n`) by appending the
/// CRLF terminator.
pub fn encode_frame<const N: usize>(payload: &[u8]) -> Option<heapless::Vec<u8, N>> {
    let mut out = heapless::Vec::new();
    out.extend_from_slice(payload).ok()?;
    out.extend_from_slice(b"\r\n").ok()?;
    Some(out)
}
