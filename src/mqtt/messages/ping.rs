//! PINGREQ and PINGRESP: fixed two-byte packets with no content.

use crate::error::MqttError;

use super::super::message::{MqttMessage, PacketType};

pub fn init_pingreq<const N: usize>(msg: &mut MqttMessage<N>) -> Result<(), MqttError> {
    msg.encode_envelope(PacketType::Pingreq, 0, &[])
}

pub fn init_pingresp<const N: usize>(msg: &mut MqttMessage<N>) -> Result<(), MqttError> {
    msg.encode_envelope(PacketType::Pingresp, 0, &[])
}

pub fn is_pingreq<const N: usize>(msg: &MqttMessage<N>) -> bool {
    msg.packet_type() == Some(PacketType::Pingreq) && msg.content().is_empty()
}

pub fn is_pingresp<const N: usize>(msg: &MqttMessage<N>) -> bool {
    msg.packet_type() == Some(PacketType::Pingresp) && msg.content().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pingreq_round_trips_as_two_bytes() {
        let mut msg: MqttMessage<8> = MqttMessage::new();
        init_pingreq(&mut msg).unwrap();
        assert_eq!(msg.wire_bytes(), &[0xC0, 0x00]);
        assert!(is_pingreq(&msg));
    }

    #[test]
    fn pingresp_round_trips_as_two_bytes() {
        let mut msg: MqttMessage<8> = MqttMessage::new();
        init_pingresp(&mut msg).unwrap();
        assert_eq!(msg.wire_bytes(), &[0xD0, 0x00]);
        assert!(is_pingresp(&msg));
    }
}
