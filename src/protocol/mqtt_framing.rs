//! MQTT 3.1.1 wire framing: fixed header (packet type + flags byte),
//! continuation-bit remaining-length, then that many payload bytes. This
//! module only recognizes frame boundaries; decoding a frame's fields into
//! a concrete message type is [`crate::mqtt::message`]'s job.

use crate::config::{MQTT_MAX_MESSAGE_BYTES, MQTT_REMAINING_LENGTH_MAX_BYTES};
use crate::containers::ByteBuffer;
use crate::mqtt::varint;

use super::base::{ParserEvent, ParserState, ReceptionTimeout};

#[derive(Clone, Copy, PartialEq, Eq)]
enum SubState {
    WaitHeader,
    WaitRemainingLength,
    WaitPayload,
}

pub struct MqttFramingParser {
    recv: ByteBuffer<MQTT_MAX_MESSAGE_BYTES>,
    state: ParserState,
    sub: SubState,
    timeout: ReceptionTimeout,
    header_byte: u8,
    remlen_bytes: heapless::Vec<u8, MQTT_REMAINING_LENGTH_MAX_BYTES>,
    remaining_length: usize,
}

impl MqttFramingParser {
    pub const fn new() -> Self {
        Self {
            recv: ByteBuffer::new(),
            state: ParserState::WaitStart,
            sub: SubState::WaitHeader,
            timeout: ReceptionTimeout::new(),
            header_byte: 0,
            remlen_bytes: heapless::Vec::new(),
            remaining_length: 0,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// The complete frame: fixed header byte, remaining-length bytes, then
    /// payload — exactly the bytes `mqtt::message` expects to validate.
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
        self.sub = SubState::WaitHeader;
        self.recv.clear();
        self.remlen_bytes.clear();
        self.remaining_length = 0;
    }

    pub fn feed_byte(&mut self, byte: u8, now_ms: u64) -> Option<ParserEvent> {
        if self.state == ParserState::Error {
            return None;
        }

        match self.sub {
            SubState::WaitHeader => {
                self.state = ParserState::WaitBody;
                self.timeout.mark_progress(now_ms);
                self.header_byte = byte;
                if !validate_type_and_flags(byte) {
                    self.state = ParserState::Error;
                    return Some(ParserEvent::MalformedPacket);
                }
                self.recv.clear();
                self.recv.append_u8(byte);
                self.remlen_bytes.clear();
                self.sub = SubState::WaitRemainingLength;
                None
            }
            SubState::WaitRemainingLength => {
                self.timeout.mark_progress(now_ms);
                let has_more = byte & 0x80 != 0;
                if self.remlen_bytes.push(byte).is_err() {
                    self.state = ParserState::Error;
                    return Some(ParserEvent::MalformedPacket);
                }
                self.recv.append_u8(byte);

                if has_more {
                    if self.remlen_bytes.len() == MQTT_REMAINING_LENGTH_MAX_BYTES {
                        // Fourth byte still has the continuation bit set: malformed.
                        self.state = ParserState::Error;
                        return Some(ParserEvent::MalformedPacket);
                    }
                    return None;
                }

                match varint::decode(&self.remlen_bytes) {
                    Some((value, consumed)) if consumed == self.remlen_bytes.len() => {
                        self.remaining_length = value as usize;
                        if self.remaining_length == 0 {
                            self.state = ParserState::WaitStart;
                            self.sub = SubState::WaitHeader;
                            return Some(ParserEvent::FrameReady);
                        }
                        if self.recv.free_len() < self.remaining_length {
                            self.state = ParserState::Error;
                            return Some(ParserEvent::MalformedPacket);
                        }
                        self.sub = SubState::WaitPayload;
                        None
                    }
                    _ => {
                        self.state = ParserState::Error;
                        Some(ParserEvent::MalformedPacket)
                    }
                }
            }
            SubState::WaitPayload => {
                self.timeout.mark_progress(now_ms);
                if !self.recv.append_u8(byte) {
                    self.state = ParserState::Error;
                    return Some(ParserEvent::MalformedPacket);
                }
                let header_len = 1 + self.remlen_bytes.len();
                if self.recv.len() == header_len + self.remaining_length {
                    self.state = ParserState::WaitStart;
                    self.sub = SubState::WaitHeader;
                    return Some(ParserEvent::FrameReady);
                }
                None
            }
        }
    }
}

impl Default for MqttFramingParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Mask out the packet-type nibble and flags nibble and check the flags
/// are legal for that type. Unknown types are rejected outright.
fn validate_type_and_flags(header_byte: u8) -> bool {
    let packet_type = header_byte >> 4;
    let flags = header_byte & 0x0F;
    match packet_type {
        1 | 2 | 12 | 13 | 14 => flags == 0, // CONNECT, CONNACK, PINGREQ, PINGRESP, DISCONNECT
        3 => true,                          // PUBLISH: DUP/QoS/RETAIN bits, any combination
        6 | 8 | 10 => flags == 0b0010,       // PUBREL, SUBSCRIBE, UNSUBSCRIBE
        4 | 5 | 7 | 9 | 11 => flags == 0,    // PUBACK, PUBREC, PUBCOMP, SUBACK, UNSUBACK
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(p: &mut MqttFramingParser, bytes: &[u8]) -> Option<ParserEvent> {
        let mut last = None;
        for &b in bytes {
            if let Some(ev) = p.feed_byte(b, 0) {
                last = Some(ev);
            }
        }
        last
    }

    #[test]
    fn pingreq_zero_payload_frame() {
        let mut p = MqttFramingParser::new();
        assert_eq!(feed_all(&mut p, &[0xC0, 0x00]), Some(ParserEvent::FrameReady));
        assert_eq!(p.frame(), &[0xC0, 0x00]);
    }

    #[test]
    fn publish_with_payload_frames_correctly() {
        let mut p = MqttFramingParser::new();
        let bytes = [0x30, 0x05, b'a', b'b', b'c', b'd', b'e'];
        assert_eq!(feed_all(&mut p, &bytes), Some(ParserEvent::FrameReady));
        assert_eq!(p.frame(), &bytes[..]);
    }

    #[test]
    fn subscribe_requires_flags_0010() {
        let mut p = MqttFramingParser::new();
        assert_eq!(
            p.feed_byte(0x80, 0), // SUBSCRIBE with flags 0, invalid
            Some(ParserEvent::MalformedPacket)
        );
    }

    #[test]
    fn reception_timeout_mid_frame_resets_to_wait_start() {
        let mut p = MqttFramingParser::new();
        // PUBLISH declaring 5 bytes, only 2 supplied
        p.feed_byte(0x30, 0);
        p.feed_byte(0x05, 0);
        p.feed_byte(b'a', 0);
        p.feed_byte(b'b', 0);
        assert_eq!(p.state(), ParserState::WaitBody);
        assert_eq!(p.poll_timeout(5_000), Some(ParserEvent::ReceptionTimeout));
        assert_eq!(p.state(), ParserState::WaitStart);
    }

    #[test]
    fn malformed_remaining_length_all_continuation_bits_set() {
        let mut p = MqttFramingParser::new();
        p.feed_byte(0x30, 0);
        assert_eq!(p.feed_byte(0xFF, 0), None);
        assert_eq!(p.feed_byte(0xFF, 0), None);
        assert_eq!(p.feed_byte(0xFF, 0), None);
        assert_eq!(p.feed_byte(0xFF, 0), Some(ParserEvent::MalformedPacket));
    }
}
