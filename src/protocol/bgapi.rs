//! BGAPI binary framing used by BlueGiga/Silicon Labs BLE radio modules:
//! a 4-byte header whose first byte's high nibble is the message class
//! (always 0 for the framing layer) and whose low 3 bits, combined with
//! the second byte, give an 11-bit little-endian payload length.

use crate::config::BGAPI_MAX_PAYLOAD_BYTES;
use crate::containers::ByteBuffer;

use super::base::{ParserEvent, ParserState, ReceptionTimeout};

#[derive(Clone, Copy, PartialEq, Eq)]
enum SubState {
    WaitHeaderByte(u8),
    WaitPayload,
}

pub struct BgapiParser {
    recv: ByteBuffer<BGAPI_MAX_PAYLOAD_BYTES>,
    header: [u8; 4],
    state: ParserState,
    sub: SubState,
    timeout: ReceptionTimeout,
    declared_len: usize,
}

impl BgapiParser {
    pub const fn new() -> Self {
        Self {
            recv: ByteBuffer::new(),
            header: [0; 4],
            state: ParserState::WaitStart,
            sub: SubState::WaitHeaderByte(0),
            timeout: ReceptionTimeout::new(),
            declared_len: 0,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// The 4-byte header, for callers that need the message-class/id bits.
    pub fn header(&self) -> &[u8; 4] {
        &self.header
    }

    pub fn frame(&self) -> &[u8] {
        self.recv.as_slice()
    }

    pub fn reset_error(&mut self) {
        if self.state == ParserState::Error {
            self.to_wait_start();
        }
    }

    pub fn poll_timeout(&mut self, now_ms: u64) -> Option<ParserEvent> {
        if self.state == ParserState::WaitBody && self.timeout.has_elapsed(now_ms) {
            self.to_wait_start();
            return Some(ParserEvent::ReceptionTimeout);
        }
        None
    }

    fn to_wait_start(&mut self) {
        self.state = ParserState::WaitStart;
        self.sub = SubState::WaitHeaderByte(0);
        self.recv.clear();
        self.declared_len = 0;
    }

    pub fn feed_byte(&mut self, byte: u8, now_ms: u64) -> Option<ParserEvent> {
        if self.state == ParserState::Error {
            return None;
        }

        match self.sub {
            SubState::WaitHeaderByte(idx) => {
                if idx == 0 && byte >> 4 != 0 {
                    // High nibble of the first byte must be the (always-zero)
                    // message-class marker; anything else is noise before a
                    // frame, not a framing violation.
                    return None;
                }
                self.state = ParserState::WaitBody;
                self.timeout.mark_progress(now_ms);
                self.header[idx as usize] = byte;
                if idx < 3 {
                    self.sub = SubState::WaitHeaderByte(idx + 1);
                    None
                } else {
                    let len = (u16::from(self.header[0] & 0x07) << 8) | u16::from(self.header[1]);
                    self.declared_len = len as usize;
                    if self.declared_len > BGAPI_MAX_PAYLOAD_BYTES {
                        self.state = ParserState::Error;
                        return Some(ParserEvent::MalformedPacket);
                    }
                    self.recv.clear();
                    if self.declared_len == 0 {
                        self.state = ParserState::WaitStart;
                        self.sub = SubState::WaitHeaderByte(0);
                        return Some(ParserEvent::FrameReady);
                    }
                    self.sub = SubState::WaitPayload;
                    None
                }
            }
            SubState::WaitPayload => {
                self.timeout.mark_progress(now_ms);
                if !self.recv.append_u8(byte) {
                    self.state = ParserState::Error;
                    return Some(ParserEvent::MalformedPacket);
                }
                if self.recv.len() == self.declared_len {
                    self.state = ParserState::WaitStart;
                    self.sub = SubState::WaitHeaderByte(0);
                    return Some(ParserEvent::FrameReady);
                }
                None
            }
        }
    }
}

impl Default for BgapiParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame `payload` with a BGAPI header whose `msg_id`/class byte is
/// `header_byte0` as supplied by the caller (the radio SDK defines its
/// meaning; this framing only owns the length encoding).
pub fn encode_frame<const N: usize>(
    header_byte0: u8,
    header_byte1: u8,
    payload: &[u8],
) -> Option<heapless::Vec<u8, N>> {
    if payload.len() > BGAPI_MAX_PAYLOAD_BYTES {
        return None;
    }
    let len = payload.len() as u16;
    let mut out: heapless::Vec<u8, N> = heapless::Vec::new();
    out.push((header_byte0 & 0xF8) | ((len >> 8) as u8 & 0x07))
        .ok()?;
    out.push((len & 0xFF) as u8).ok()?;
    out.push(header_byte1).ok()?;
    out.push(0).ok()?;
    out.extend_from_slice(payload).ok()?;
    Some(out)
}
