//! SUBACK: a packet id followed by one return code per filter in the
//! corresponding SUBSCRIBE, in the same order.

use crate::config::MQTT_MAX_SUBSCRIPTIONS_PER_PACKET;
use crate::containers::FixedArray;
use crate::error::MqttError;

use super::super::message::{ContentScratch, MqttMessage, PacketType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubackResult {
    GrantedQos(u8),
    Failure,
}

impl SubackResult {
    const fn to_byte(self) -> u8 {
        match self {
            Self::GrantedQos(qos) => qos & 0x03,
            Self::Failure => 0x80,
        }
    }

    const fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x00..=0x02 => Self::GrantedQos(byte),
            0x80 => Self::Failure,
            _ => return None,
        })
    }
}

pub fn init_suback<const N: usize>(
    msg: &mut MqttMessage<N>,
    packet_id: u16,
    results: &[SubackResult],
) -> Result<(), MqttError> {
    if results.is_empty() || results.len() > MQTT_MAX_SUBSCRIPTIONS_PER_PACKET {
        return Err(MqttError::ProtocolViolation);
    }
    let mut content: ContentScratch = heapless::Vec::new();
    content
        .extend_from_slice(&packet_id.to_be_bytes())
        .map_err(|_| MqttError::MalformedMessage)?;
    for result in results {
        content
            .push(result.to_byte())
            .map_err(|_| MqttError::FieldTooLong)?;
    }
    msg.encode_envelope(PacketType::Suback, 0, &content)
}

pub fn decode_suback<const N: usize>(
    msg: &MqttMessage<N>,
) -> Result<(u16, FixedArray<SubackResult, MQTT_MAX_SUBSCRIPTIONS_PER_PACKET>), MqttError> {
    if msg.packet_type() != Some(PacketType::Suback) {
        return Err(MqttError::ProtocolViolation);
    }
    let content = msg.content();
    let id_bytes: [u8; 2] = content
        .get(0..2)
        .ok_or(MqttError::MalformedMessage)?
        .try_into()
        .map_err(|_| MqttError::MalformedMessage)?;
    let packet_id = u16::from_be_bytes(id_bytes);

    let mut results: FixedArray<SubackResult, MQTT_MAX_SUBSCRIPTIONS_PER_PACKET> =
        FixedArray::new();
    for &byte in &content[2..] {
        let result = SubackResult::from_byte(byte).ok_or(MqttError::ProtocolViolation)?;
        if !results.append(result) {
            return Err(MqttError::ProtocolViolation);
        }
    }
    if results.is_empty() {
        return Err(MqttError::MalformedMessage);
    }
    Ok((packet_id, results))
}
