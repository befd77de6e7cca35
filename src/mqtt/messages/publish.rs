//! PUBLISH: topic name, an optional packet id (present for QoS 1/2, which
//! this crate does not originate but must still be able to parse and
//! re-frame), and an opaque payload.
//!
//! Topic rewriting for the bridge (§ rpc::bridge) is done by decoding the
//! current content, substituting the topic, and re-encoding the envelope
//! in the same [`MqttMessage`] — the backing buffer is reused, so no heap
//! allocation occurs, even though the field layout is rebuilt rather than
//! shifted in place.

use crate::error::MqttError;

use super::super::message::{
    append_length_prefixed_str, read_length_prefixed_str, ContentScratch, MqttMessage, PacketType,
};

pub fn qos_from_flags(flags: u8) -> u8 {
    (flags >> 1) & 0x03
}

pub fn dup_from_flags(flags: u8) -> bool {
    flags & 0x08 != 0
}

pub fn retain_from_flags(flags: u8) -> bool {
    flags & 0x01 != 0
}

pub fn flags_for(qos: u8, dup: bool, retain: bool) -> u8 {
    let mut flags = (qos & 0x03) << 1;
    if dup {
        flags |= 0x08;
    }
    if retain {
        flags |= 0x01;
    }
    flags
}

#[derive(Debug, Clone, Copy)]
pub struct PublishFields<'a> {
    pub topic: &'a str,
    pub packet_id: Option<u16>,
    pub payload: &'a [u8],
    pub qos: u8,
    pub dup: bool,
    pub retain: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct PublishView<'a> {
    pub topic: &'a str,
    pub packet_id: Option<u16>,
    pub payload: &'a [u8],
    pub qos: u8,
    pub dup: bool,
    pub retain: bool,
}

/// '+'/'#' are subscription-filter wildcards; a published topic must be a
/// concrete name.
fn reject_wildcard_topic(topic: &str) -> Result<(), MqttError> {
    if topic.contains('+') || topic.contains('#') {
        return Err(MqttError::ProtocolViolation);
    }
    Ok(())
}

fn build_content(
    content: &mut ContentScratch,
    topic: &str,
    packet_id: Option<u16>,
    payload: &[u8],
) -> Result<(), MqttError> {
    if !append_length_prefixed_str(content, topic) {
        return Err(MqttError::FieldTooLong);
    }
    if let Some(id) = packet_id {
        content
            .extend_from_slice(&id.to_be_bytes())
            .map_err(|_| MqttError::FieldTooLong)?;
    }
    content
        .extend_from_slice(payload)
        .map_err(|_| MqttError::FieldTooLong)?;
    Ok(())
}

pub fn init_publish<const N: usize>(
    msg: &mut MqttMessage<N>,
    fields: &PublishFields<'_>,
) -> Result<(), MqttError> {
    if fields.qos > 0 && fields.packet_id.is_none() {
        return Err(MqttError::ProtocolViolation);
    }
    if fields.qos == 0 && fields.packet_id.is_some() {
        return Err(MqttError::ProtocolViolation);
    }
    reject_wildcard_topic(fields.topic)?;
    let mut content: ContentScratch = heapless::Vec::new();
    build_content(&mut content, fields.topic, fields.packet_id, fields.payload)?;
    let flags = flags_for(fields.qos, fields.dup, fields.retain);
    msg.encode_envelope(PacketType::Publish, flags, &content)
}

pub fn decode_publish<const N: usize>(msg: &MqttMessage<N>) -> Result<PublishView<'_>, MqttError> {
    if msg.packet_type() != Some(PacketType::Publish) {
        return Err(MqttError::ProtocolViolation);
    }
    let flags = msg.flags();
    let qos = qos_from_flags(flags);
    if qos > 2 {
        return Err(MqttError::ProtocolViolation);
    }
    let content = msg.content();
    let (topic, mut offset) =
        read_length_prefixed_str(content, 0).ok_or(MqttError::MalformedMessage)?;

    let packet_id = if qos > 0 {
        let bytes: [u8; 2] = content
            .get(offset..offset + 2)
            .ok_or(MqttError::MalformedMessage)?
            .try_into()
            .map_err(|_| MqttError::MalformedMessage)?;
        offset += 2;
        Some(u16::from_be_bytes(bytes))
    } else {
        None
    };

    let payload = content.get(offset..).ok_or(MqttError::MalformedMessage)?;

    Ok(PublishView {
        topic,
        packet_id,
        payload,
        qos,
        dup: dup_from_flags(flags),
        retain: retain_from_flags(flags),
    })
}

/// Rewrite the topic of a decoded PUBLISH in place, keeping packet id,
/// payload, qos, dup and retain bits unchanged. Used by the bridge to
/// remap an incoming topic to its internal name before forwarding.
pub fn rewrite_topic<const N: usize>(
    msg: &mut MqttMessage<N>,
    new_topic: &str,
) -> Result<(), MqttError> {
    reject_wildcard_topic(new_topic)?;
    let view = decode_publish(msg)?;
    let packet_id = view.packet_id;
    let qos = view.qos;
    let dup = view.dup;
    let retain = view.retain;

    let mut payload_scratch: ContentScratch = heapless::Vec::new();
    payload_scratch
        .extend_from_slice(view.payload)
        .map_err(|_| MqttError::FieldTooLong)?;

    let mut content: ContentScratch = heapless::Vec::new();
    build_content(&mut content, new_topic, packet_id, &payload_scratch)?;
    let flags = flags_for(qos, dup, retain);
    msg.encode_envelope(PacketType::Publish, flags, &content)
}
