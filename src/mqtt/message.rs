//! MQTT message envelope shared by every concrete packet type: a fixed
//! header byte, a remaining-length field, and a content blob, all held as
//! linked fields over one backing buffer so no packet's bytes are ever
//! copied between encode/decode and the wire.

use crate::config::MQTT_MAX_MESSAGE_BYTES;
use crate::containers::linked_field::{LinkedField, LinkedFieldChain};
use crate::error::MqttError;

use super::varint;

const MAX_ENVELOPE_FIELDS: usize = 3; // header, remaining-length, content

/// The MQTT 3.1.1 control packet types this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Connect = 1,
    Connack = 2,
    Publish = 3,
    Puback = 4,
    Pubrec = 5,
    Pubrel = 6,
    Pubcomp = 7,
    Subscribe = 8,
    Suback = 9,
    Unsubscribe = 10,
    Unsuback = 11,
    Pingreq = 12,
    Pingresp = 13,
    Disconnect = 14,
}

impl PacketType {
    pub const fn from_nibble(nibble: u8) -> Option<Self> {
        Some(match nibble {
            1 => Self::Connect,
            2 => Self::Connack,
            3 => Self::Publish,
            4 => Self::Puback,
            5 => Self::Pubrec,
            6 => Self::Pubrel,
            7 => Self::Pubcomp,
            8 => Self::Subscribe,
            9 => Self::Suback,
            10 => Self::Unsubscribe,
            11 => Self::Unsuback,
            12 => Self::Pingreq,
            13 => Self::Pingresp,
            14 => Self::Disconnect,
            _ => return None,
        })
    }
}

/// The envelope: a 3-field chain (header byte, remaining-length, content)
/// over one backing buffer of `N` bytes. Concrete types in
/// [`super::messages`] read/write their own fields out of `content()`.
pub struct MqttMessage<const N: usize> {
    chain: LinkedFieldChain<N, MAX_ENVELOPE_FIELDS>,
    packet_type: Option<PacketType>,
    flags: u8,
    content_field: Option<LinkedField>,
    configured: bool,
}

impl<const N: usize> MqttMessage<N> {
    pub const fn new() -> Self {
        Self {
            chain: LinkedFieldChain::new(),
            packet_type: None,
            flags: 0,
            content_field: None,
            configured: false,
        }
    }

    pub fn reset(&mut self) {
        self.chain.reset();
        self.packet_type = None;
        self.flags = 0;
        self.content_field = None;
        self.configured = false;
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn packet_type(&self) -> Option<PacketType> {
        self.packet_type
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn content(&self) -> &[u8] {
        self.content_field
            .and_then(|f| self.chain.field_slice(f))
            .unwrap_or(&[])
    }

    /// The complete wire bytes: header byte + remaining-length + content.
    pub fn wire_bytes(&self) -> &[u8] {
        self.chain.backing_buffer().as_slice()
    }

    /// Build the envelope for an outgoing message: header byte, computed
    /// remaining-length, and `content` verbatim. Used by every `init_*`
    /// encoder in [`super::messages`].
    pub fn encode_envelope(
        &mut self,
        packet_type: PacketType,
        flags: u8,
        content: &[u8],
    ) -> Result<(), MqttError> {
        self.reset();
        let type_and_flags = ((packet_type as u8) << 4) | (flags & 0x0F);
        let remlen_bytes =
            varint::encode(content.len() as u32).ok_or(MqttError::FieldTooLong)?;

        let header = self
            .chain
            .init_root(&[type_and_flags])
            .ok_or(MqttError::MalformedMessage)?;
        let remlen = self
            .chain
            .init_child(header, &remlen_bytes)
            .ok_or(MqttError::MalformedMessage)?;
        let content_field = self
            .chain
            .init_child(remlen, content)
            .ok_or(MqttError::FieldTooLong)?;

        self.packet_type = Some(packet_type);
        self.flags = flags & 0x0F;
        self.content_field = Some(content_field);
        self.configured = true;
        Ok(())
    }

    /// Parse `bytes` (a complete frame as delivered by
    /// [`crate::protocol::mqtt_framing`]) into the envelope. Does not
    /// interpret `content` — that is each concrete type's job.
    pub fn validate_received_bytes(&mut self, bytes: &[u8]) -> Result<(), MqttError> {
        self.reset();
        let &[header_byte, ref rest @ ..] = bytes else {
            return Err(MqttError::MalformedMessage);
        };
        let packet_type =
            PacketType::from_nibble(header_byte >> 4).ok_or(MqttError::ProtocolViolation)?;
        let (remaining_length, remlen_len) =
            varint::decode(rest).ok_or(MqttError::MalformedMessage)?;
        let remaining_length = remaining_length as usize;
        if bytes.len() != 1 + remlen_len + remaining_length {
            return Err(MqttError::MalformedMessage);
        }

        let header = self
            .chain
            .init_root(&[header_byte])
            .ok_or(MqttError::MalformedMessage)?;
        let remlen = self
            .chain
            .init_child(header, &bytes[1..1 + remlen_len])
            .ok_or(MqttError::MalformedMessage)?;
        let content_field = self
            .chain
            .init_child(remlen, &bytes[1 + remlen_len..])
            .ok_or(MqttError::MalformedMessage)?;

        self.packet_type = Some(packet_type);
        self.flags = header_byte & 0x0F;
        self.content_field = Some(content_field);
        self.configured = true;
        Ok(())
    }
}

impl<const N: usize> Default for MqttMessage<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a u16-big-endian-length-prefixed string at `offset` in `content`.
/// Returns the string and the total bytes consumed (2 + len).
pub fn read_length_prefixed_str(content: &[u8], offset: usize) -> Option<(&str, usize)> {
    let len_bytes: [u8; 2] = content.get(offset..offset + 2)?.try_into().ok()?;
    let len = u16::from_be_bytes(len_bytes) as usize;
    let data = content.get(offset + 2..offset + 2 + len)?;
    let s = core::str::from_utf8(data).ok()?;
    Some((s, 2 + len))
}

/// Append a u16-big-endian-length-prefixed string to `out`. Returns `false`
/// if it would not fit or `s` is longer than `u16::MAX`.
pub fn append_length_prefixed_str<const N: usize>(out: &mut heapless::Vec<u8, N>, s: &str) -> bool {
    if s.len() > u16::MAX as usize {
        return false;
    }
    if out.extend_from_slice(&(s.len() as u16).to_be_bytes()).is_err() {
        return false;
    }
    out.extend_from_slice(s.as_bytes()).is_ok()
}

/// Scratch buffer type concrete encoders build their content into before
/// handing it to [`MqttMessage::encode_envelope`].
pub type ContentScratch = heapless::Vec<u8, MQTT_MAX_MESSAGE_BYTES>;
