//! CLE-proto: `0x80 0x81 <len-LSB> <len-MSB> <payload...> 0x82`, where `len`
//! counts the payload plus the one-byte footer.

use crate::config::CLE_PROTO_MAX_PAYLOAD_BYTES;
use crate::containers::ByteBuffer;

use super::base::{ParserEvent, ParserState, ReceptionTimeout};

const HEADER_BYTE_0: u8 = 0x80;
const HEADER_BYTE_1: u8 = 0x81;
const FOOTER_BYTE: u8 = 0x82;

#[derive(Clone, Copy, PartialEq, Eq)]
enum SubState {
    WaitHeader0,
    WaitHeader1,
    WaitLenLo,
    WaitLenHi,
    WaitPayload,
    WaitFooter,
}

pub struct CleProtoParser {
    recv: ByteBuffer<CLE_PROTO_MAX_PAYLOAD_BYTES>,
    state: ParserState,
    sub: SubState,
    timeout: ReceptionTimeout,
    declared_len: u16,
    len_lo: u8,
}

impl CleProtoParser {
    pub const fn new() -> Self {
        Self {
            recv: ByteBuffer::new(),
            state: ParserState::WaitStart,
            sub: SubState::WaitHeader0,
            timeout: ReceptionTimeout::new(),
            declared_len: 0,
            len_lo: 0,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
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
        self.sub = SubState::WaitHeader0;
        self.recv.clear();
        self.declared_len = 0;
    }

    pub fn feed_byte(&mut self, byte: u8, now_ms: u64) -> Option<ParserEvent> {
        if self.state == ParserState::Error {
            return None;
        }
        if self.state == ParserState::WaitStart && self.sub != SubState::WaitHeader0 {
            self.sub = SubState::WaitHeader0;
        }

        match self.sub {
            SubState::WaitHeader0 => {
                if byte == HEADER_BYTE_0 {
                    self.state = ParserState::WaitBody;
                    self.timeout.mark_progress(now_ms);
                    self.sub = SubState::WaitHeader1;
                    None
                } else {
                    None // ignore noise before a frame starts
                }
            }
            SubState::WaitHeader1 => {
                self.timeout.mark_progress(now_ms);
                if byte == HEADER_BYTE_1 {
                    self.sub = SubState::WaitLenLo;
                    None
                } else {
                    self.state = ParserState::Error;
                    Some(ParserEvent::MalformedPacket)
                }
            }
            SubState::WaitLenLo => {
                self.timeout.mark_progress(now_ms);
                self.len_lo = byte;
                self.sub = SubState::WaitLenHi;
                None
            }
            SubState::WaitLenHi => {
                self.timeout.mark_progress(now_ms);
                self.declared_len = u16::from_le_bytes([self.len_lo, byte]);
                if self.declared_len == 0 {
                    self.state = ParserState::Error;
                    return Some(ParserEvent::MalformedPacket);
                }
                let payload_len = (self.declared_len - 1) as usize;
                if payload_len > CLE_PROTO_MAX_PAYLOAD_BYTES {
                    self.state = ParserState::Error;
                    return Some(ParserEvent::MalformedPacket);
                }
                self.recv.clear();
                self.sub = if payload_len == 0 {
                    SubState::WaitFooter
                } else {
                    SubState::WaitPayload
                };
                None
            }
            SubState::WaitPayload => {
                self.timeout.mark_progress(now_ms);
                if !self.recv.append_u8(byte) {
                    self.state = ParserState::Error;
                    return Some(ParserEvent::MalformedPacket);
                }
                if self.recv.len() == (self.declared_len - 1) as usize {
                    self.sub = SubState::WaitFooter;
                }
                None
            }
            SubState::WaitFooter => {
                self.timeout.mark_progress(now_ms);
                if byte != FOOTER_BYTE {
                    self.state = ParserState::Error;
                    return Some(ParserEvent::MalformedPacket);
                }
                self.state = ParserState::WaitStart;
                self.sub = SubState::WaitHeader0;
                Some(ParserEvent::FrameReady)
            }
        }
    }
}

impl Default for CleProtoParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame `payload` with the CLE-proto header/length/footer. Fails if
/// `payload` exceeds [`CLE_PROTO_MAX_PAYLOAD_BYTES`] or does not fit `N`.
pub fn encode_frame<const N: usize>(payload: &[u8]) -> Option<heapless::Vec<u8, N>> {
    if payload.len() > CLE_PROTO_MAX_PAYLOAD_BYTES {
        return None;
    }
    let declared_len = (payload.len() + 1) as u16;
    let mut out: heapless::Vec<u8, N> = heapless::Vec::new();
    out.push(HEADER_BYTE_0).ok()?;
    out.push(HEADER_BYTE_1).ok()?;
    out.extend_from_slice(&declared_len.to_le_bytes()).ok()?;
    out.extend_from_slice(payload).ok()?;
    out.push(FOOTER_BYTE).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(p: &mut CleProtoParser, bytes: &[u8]) -> Option<ParserEvent> {
        let mut last = None;
        for &b in bytes {
            if let Some(ev) = p.feed_byte(b, 0) {
                last = Some(ev);
            }
        }
        last
    }

    #[test]
    fn round_trip_through_encode_and_parse() {
        let frame: heapless::Vec<u8, 32> = encode_frame(b"hi").unwrap();
        let mut p = CleProtoParser::new();
        assert_eq!(feed_all(&mut p, &frame), Some(ParserEvent::FrameReady));
        assert_eq!(p.frame(), b"hi");
    }

    #[test]
    fn empty_payload_round_trips() {
        let frame: heapless::Vec<u8, 32> = encode_frame(b"").unwrap();
        let mut p = CleProtoParser::new();
        assert_eq!(feed_all(&mut p, &frame), Some(ParserEvent::FrameReady));
        assert_eq!(p.frame(), b"");
    }

    #[test]
    fn bad_second_header_byte_is_malformed() {
        let mut p = CleProtoParser::new();
        assert_eq!(p.feed_byte(0x80, 0), None);
        assert_eq!(
            p.feed_byte(0x00, 0),
            Some(ParserEvent::MalformedPacket)
        );
        assert_eq!(p.state(), ParserState::Error);
    }

    #[test]
    fn bad_footer_is_malformed() {
        let mut p = CleProtoParser::new();
        let mut frame: heapless::Vec<u8, 32> = encode_frame(b"x").unwrap();
        *frame.last_mut().unwrap() = 0x00;
        assert_eq!(feed_all(&mut p, &frame), Some(ParserEvent::MalformedPacket));
    }

    #[test]
    fn reset_error_returns_to_wait_start() {
        let mut p = CleProtoParser::new();
        p.feed_byte(0x80, 0);
        p.feed_byte(0x00, 0);
        assert_eq!(p.state(), ParserState::Error);
        p.reset_error();
        assert_eq!(p.state(), ParserState::WaitStart);
    }

    #[test]
    fn noise_before_header_is_ignored() {
        let mut p = CleProtoParser::new();
        let mut bytes: heapless::Vec<u8, 32> = heapless::Vec::new();
        bytes.extend_from_slice(&[0x01, 0x02]).unwrap();
        bytes
            .extend_from_slice(&encode_frame::<16>(b"ok").unwrap())
            .unwrap();
        assert_eq!(feed_all(&mut p, &bytes), Some(ParserEvent::FrameReady));
        assert_eq!(p.frame(), b"ok");
    }
}
