//! CONNECT: client id, clean-session, keep-alive, and optional will,
//! username and password fields. Will fields are present on the wire if
//! and only if the will flag bit is set — unconditional decoding of a will
//! here would silently accept malformed packets.

use crate::config::MQTT_MAX_CLIENT_ID_LEN;
use crate::error::MqttError;

use super::super::message::{
    append_length_prefixed_str, read_length_prefixed_str, ContentScratch, MqttMessage, PacketType,
};

const PROTOCOL_NAME: &str = "MQTT";
const PROTOCOL_LEVEL: u8 = 4;

const FLAG_USERNAME: u8 = 0b1000_0000;
const FLAG_PASSWORD: u8 = 0b0100_0000;
const FLAG_WILL_RETAIN: u8 = 0b0010_0000;
const FLAG_WILL_QOS_MASK: u8 = 0b0001_1000;
const FLAG_WILL: u8 = 0b0000_0100;
const FLAG_CLEAN_SESSION: u8 = 0b0000_0010;

/// A last-will-and-testament declaration, present only when the client
/// asked for one.
#[derive(Debug, Clone, Copy)]
pub struct Will<'a> {
    pub topic: &'a str,
    pub message: &'a [u8],
    pub qos: u8,
    pub retain: bool,
}

/// Fields the caller supplies to build an outgoing CONNECT.
#[derive(Debug, Clone, Copy)]
pub struct ConnectFields<'a> {
    pub client_id: &'a str,
    pub clean_session: bool,
    pub keep_alive_secs: u16,
    pub will: Option<Will<'a>>,
    pub username: Option<&'a str>,
    pub password: Option<&'a [u8]>,
}

/// Fields decoded from a received CONNECT, borrowed from the message's
/// backing buffer.
#[derive(Debug, Clone, Copy)]
pub struct ConnectView<'a> {
    pub client_id: &'a str,
    pub clean_session: bool,
    pub keep_alive_secs: u16,
    pub will: Option<Will<'a>>,
    pub username: Option<&'a str>,
    pub password: Option<&'a [u8]>,
}

pub fn init_connect<const N: usize>(
    msg: &mut MqttMessage<N>,
    fields: &ConnectFields<'_>,
) -> Result<(), MqttError> {
    if fields.client_id.is_empty() || fields.client_id.len() > MQTT_MAX_CLIENT_ID_LEN {
        return Err(MqttError::FieldTooLong);
    }

    let mut connect_flags = 0u8;
    if fields.clean_session {
        connect_flags |= FLAG_CLEAN_SESSION;
    }
    if let Some(will) = &fields.will {
        connect_flags |= FLAG_WILL;
        connect_flags |= (will.qos << 3) & FLAG_WILL_QOS_MASK;
        if will.retain {
            connect_flags |= FLAG_WILL_RETAIN;
        }
    }
    if fields.username.is_some() {
        connect_flags |= FLAG_USERNAME;
    }
    if fields.password.is_some() {
        connect_flags |= FLAG_PASSWORD;
    }

    let mut content: ContentScratch = heapless::Vec::new();
    if !append_length_prefixed_str(&mut content, PROTOCOL_NAME) {
        return Err(MqttError::MalformedMessage);
    }
    content.push(PROTOCOL_LEVEL).map_err(|_| MqttError::MalformedMessage)?;
    content.push(connect_flags).map_err(|_| MqttError::MalformedMessage)?;
    content
        .extend_from_slice(&fields.keep_alive_secs.to_be_bytes())
        .map_err(|_| MqttError::MalformedMessage)?;
    if !append_length_prefixed_str(&mut content, fields.client_id) {
        return Err(MqttError::FieldTooLong);
    }
    if let Some(will) = &fields.will {
        if !append_length_prefixed_str(&mut content, will.topic) {
            return Err(MqttError::FieldTooLong);
        }
        let len = will.message.len() as u16;
        content
            .extend_from_slice(&len.to_be_bytes())
            .map_err(|_| MqttError::FieldTooLong)?;
        content
            .extend_from_slice(will.message)
            .map_err(|_| MqttError::FieldTooLong)?;
    }
    if let Some(username) = fields.username {
        if !append_length_prefixed_str(&mut content, username) {
            return Err(MqttError::FieldTooLong);
        }
    }
    if let Some(password) = fields.password {
        let len = password.len() as u16;
        content
            .extend_from_slice(&len.to_be_bytes())
            .map_err(|_| MqttError::FieldTooLong)?;
        content
            .extend_from_slice(password)
            .map_err(|_| MqttError::FieldTooLong)?;
    }

    msg.encode_envelope(PacketType::Connect, 0, &content)
}

pub fn decode_connect<'a, const N: usize>(
    msg: &'a MqttMessage<N>,
) -> Result<ConnectView<'a>, MqttError> {
    if msg.packet_type() != Some(PacketType::Connect) {
        return Err(MqttError::ProtocolViolation);
    }
    let content = msg.content();
    let mut offset = 0usize;

    let (protocol_name, consumed) =
        read_length_prefixed_str(content, offset).ok_or(MqttError::MalformedMessage)?;
    if protocol_name != PROTOCOL_NAME {
        return Err(MqttError::ProtocolViolation);
    }
    offset += consumed;

    let protocol_level = *content.get(offset).ok_or(MqttError::MalformedMessage)?;
    if protocol_level != PROTOCOL_LEVEL {
        return Err(MqttError::ProtocolViolation);
    }
    offset += 1;

    let connect_flags = *content.get(offset).ok_or(MqttError::MalformedMessage)?;
    offset += 1;

    let keep_alive_bytes: [u8; 2] = content
        .get(offset..offset + 2)
        .ok_or(MqttError::MalformedMessage)?
        .try_into()
        .map_err(|_| MqttError::MalformedMessage)?;
    let keep_alive_secs = u16::from_be_bytes(keep_alive_bytes);
    offset += 2;

    let (client_id, consumed) =
        read_length_prefixed_str(content, offset).ok_or(MqttError::MalformedMessage)?;
    if client_id.is_empty() || client_id.len() > MQTT_MAX_CLIENT_ID_LEN {
        return Err(MqttError::FieldTooLong);
    }
    offset += consumed;

    let will = if connect_flags & FLAG_WILL != 0 {
        let (topic, consumed) =
            read_length_prefixed_str(content, offset).ok_or(MqttError::MalformedMessage)?;
        offset += consumed;
        let len_bytes: [u8; 2] = content
            .get(offset..offset + 2)
            .ok_or(MqttError::MalformedMessage)?
            .try_into()
            .map_err(|_| MqttError::MalformedMessage)?;
        let len = u16::from_be_bytes(len_bytes) as usize;
        offset += 2;
        let message = content
            .get(offset..offset + len)
            .ok_or(MqttError::MalformedMessage)?;
        offset += len;
        Some(Will {
            topic,
            message,
            qos: (connect_flags & FLAG_WILL_QOS_MASK) >> 3,
            retain: connect_flags & FLAG_WILL_RETAIN != 0,
        })
    } else {
        None
    };

    let username = if connect_flags & FLAG_USERNAME != 0 {
        let (username, consumed) =
            read_length_prefixed_str(content, offset).ok_or(MqttError::MalformedMessage)?;
        offset += consumed;
        Some(username)
    } else {
        None
    };

    let password = if connect_flags & FLAG_PASSWORD != 0 {
        let len_bytes: [u8; 2] = content
            .get(offset..offset + 2)
            .ok_or(MqttError::MalformedMessage)?
            .try_into()
            .map_err(|_| MqttError::MalformedMessage)?;
        let len = u16::from_be_bytes(len_bytes) as usize;
        offset += 2;
        let password = content
            .get(offset..offset + len)
            .ok_or(MqttError::MalformedMessage)?;
        offset += len;
        Some(password)
    } else {
        None
    };

    Ok(ConnectView {
        client_id,
        clean_session: connect_flags & FLAG_CLEAN_SESSION != 0,
        keep_alive_secs,
        will,
        username,
        password,
    })
}
