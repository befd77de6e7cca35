//! SUBSCRIBE: a packet id followed by one or more (topic filter,
//! requested QoS) pairs. The reserved flags nibble (0b0010) is checked by
//! [`crate::protocol::mqtt_framing`] before this module ever sees the bytes.

use crate::config::MQTT_MAX_SUBSCRIPTIONS_PER_PACKET;
use crate::containers::FixedArray;
use crate::error::MqttError;

use super::super::message::{
    append_length_prefixed_str, read_length_prefixed_str, ContentScratch, MqttMessage, PacketType,
};

#[derive(Debug, Clone, Copy)]
pub struct TopicFilter<'a> {
    pub filter: &'a str,
    pub requested_qos: u8,
}

pub fn init_subscribe<const N: usize>(
    msg: &mut MqttMessage<N>,
    packet_id: u16,
    filters: &[TopicFilter<'_>],
) -> Result<(), MqttError> {
    if filters.is_empty() || filters.len() > MQTT_MAX_SUBSCRIPTIONS_PER_PACKET {
        return Err(MqttError::ProtocolViolation);
    }
    let mut content: ContentScratch = heapless::Vec::new();
    content
        .extend_from_slice(&packet_id.to_be_bytes())
        .map_err(|_| MqttError::MalformedMessage)?;
    for filter in filters {
        if !append_length_prefixed_str(&mut content, filter.filter) {
            return Err(MqttError::FieldTooLong);
        }
        content
            .push(filter.requested_qos & 0x03)
            .map_err(|_| MqttError::FieldTooLong)?;
    }
    msg.encode_envelope(PacketType::Subscribe, 0b0010, &content)
}

pub fn decode_subscribe<const N: usize>(
    msg: &MqttMessage<N>,
) -> Result<(u16, FixedArray<TopicFilter<'_>, MQTT_MAX_SUBSCRIPTIONS_PER_PACKET>), MqttError> {
    if msg.packet_type() != Some(PacketType::Subscribe) {
        return Err(MqttError::ProtocolViolation);
    }
    let content = msg.content();
    let id_bytes: [u8; 2] = content
        .get(0..2)
        .ok_or(MqttError::MalformedMessage)?
        .try_into()
        .map_err(|_| MqttError::MalformedMessage)?;
    let packet_id = u16::from_be_bytes(id_bytes);

    let mut offset = 2usize;
    let mut filters: FixedArray<TopicFilter<'_>, MQTT_MAX_SUBSCRIPTIONS_PER_PACKET> =
        FixedArray::new();
    while offset < content.len() {
        let (filter, consumed) =
            read_length_prefixed_str(content, offset).ok_or(MqttError::MalformedMessage)?;
        offset += consumed;
        let qos = *content.get(offset).ok_or(MqttError::MalformedMessage)?;
        offset += 1;
        if qos > 2 {
            return Err(MqttError::ProtocolViolation);
        }
        if !filters.append(TopicFilter {
            filter,
            requested_qos: qos,
        }) {
            return Err(MqttError::ProtocolViolation);
        }
    }
    if filters.is_empty() {
        return Err(MqttError::MalformedMessage);
    }
    Ok((packet_id, filters))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_two_filters() {
        let mut msg: MqttMessage<128> = MqttMessage::new();
        init_subscribe(
            &mut msg,
            7,
            &[
                TopicFilter {
                    filter: "sensors/+/temperature",
                    requested_qos: 0,
                },
                TopicFilter {
                    filter: "devices/dev-01/cmd",
                    requested_qos: 1,
                },
            ],
        )
        .unwrap();

        let (packet_id, filters) = decode_subscribe(&msg).unwrap();
        assert_eq!(packet_id, 7);
        assert_eq!(filters.len(), 2);
        assert_eq!(filters.get(0).unwrap().filter, "sensors/+/temperature");
        assert_eq!(filters.get(1).unwrap().requested_qos, 1);
    }

    #[test]
    fn empty_filter_list_rejected() {
        let mut msg: MqttMessage<128> = MqttMessage::new();
        let err = init_subscribe(&mut msg, 1, &[]).unwrap_err();
        assert_eq!(err, MqttError::ProtocolViolation);
    }
}
