//! CONNACK: a single acknowledgement flags byte (only bit 0, session
//! present, is defined) and a one-byte return code.

use crate::error::MqttError;

use super::super::message::{ContentScratch, MqttMessage, PacketType};

/// CONNACK return codes, MQTT 3.1.1 section 3.2.2.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnackReturnCode {
    Accepted = 0,
    UnacceptableProtocolVersion = 1,
    IdentifierRejected = 2,
    ServerUnavailable = 3,
    BadUsernameOrPassword = 4,
    NotAuthorized = 5,
}

impl ConnackReturnCode {
    const fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Accepted,
            1 => Self::UnacceptableProtocolVersion,
            2 => Self::IdentifierRejected,
            3 => Self::ServerUnavailable,
            4 => Self::BadUsernameOrPassword,
            5 => Self::NotAuthorized,
            _ => return None,
        })
    }
}

pub fn init_connack<const N: usize>(
    msg: &mut MqttMessage<N>,
    session_present: bool,
    return_code: ConnackReturnCode,
) -> Result<(), MqttError> {
    let mut content: ContentScratch = heapless::Vec::new();
    content
        .push(if session_present { 0x01 } else { 0x00 })
        .map_err(|_| MqttError::MalformedMessage)?;
    content
        .push(return_code as u8)
        .map_err(|_| MqttError::MalformedMessage)?;
    msg.encode_envelope(PacketType::Connack, 0, &content)
}

pub fn decode_connack<const N: usize>(
    msg: &MqttMessage<N>,
) -> Result<(bool, ConnackReturnCode), MqttError> {
    if msg.packet_type() != Some(PacketType::Connack) {
        return Err(MqttError::ProtocolViolation);
    }
    let content = msg.content();
    let &[ack_flags, return_code_byte] = content else {
        return Err(MqttError::MalformedMessage);
    };
    if ack_flags & 0xFE != 0 {
        return Err(MqttError::ProtocolViolation);
    }
    let return_code =
        ConnackReturnCode::from_byte(return_code_byte).ok_or(MqttError::ProtocolViolation)?;
    Ok((ack_flags & 0x01 != 0, return_code))
}
