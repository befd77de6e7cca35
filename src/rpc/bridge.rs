//! The bridge node: terminates MQTT from downstream clients speaking over
//! their own framed byte stream, authenticates them into a
//! `{client_id -> mapped_name}` table, and forwards their publishes
//! upstream with the topic rewritten from `<mapped_name>/…` to
//! `~/<client_id>/…`.

use heapless::String;

use crate::config::{
    BRIDGE_CLIENT_ID_MAX_LEN, BRIDGE_MAPPED_NAME_MAX_LEN, MAX_BRIDGE_REMOTE_NODES,
    MQTT_MAX_MESSAGE_BYTES, MQTT_MAX_TOPIC_LEN,
};
use crate::containers::FixedArray;
use crate::io::{ByteStream, ReadStatus};
use crate::mqtt::message::{MqttMessage, PacketType};
use crate::mqtt::messages::connack::{self, ConnackReturnCode};
use crate::mqtt::messages::connect;
use crate::mqtt::messages::publish::{self, PublishFields};
use crate::mqtt::MqttClient;
use crate::protocol::mqtt_framing::MqttFramingParser;
use crate::protocol::ParserEvent;

/// Invoked for a downstream client not already in the table. Returns
/// `true` and fills `mapped_name_out` to accept; `false` to reject
/// (`bad_credentials`).
pub type BridgeAuthFn = fn(
    client_id: &str,
    username: Option<&str>,
    password: Option<&[u8]>,
    mapped_name_out: &mut String<BRIDGE_MAPPED_NAME_MAX_LEN>,
) -> bool;

struct RemoteEntry {
    client_id: String<BRIDGE_CLIENT_ID_MAX_LEN>,
    mapped_name: String<BRIDGE_MAPPED_NAME_MAX_LEN>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeEvent {
    ClientAccepted,
    ClientRejected(ConnackReturnCode),
    MessageForwarded,
    Dropped,
}

pub struct BridgeNode<S: ByteStream> {
    downstream: S,
    framing: MqttFramingParser,
    table: FixedArray<RemoteEntry, MAX_BRIDGE_REMOTE_NODES>,
    auth: BridgeAuthFn,
}

impl<S: ByteStream> BridgeNode<S> {
    pub fn new(downstream: S, auth: BridgeAuthFn) -> Self {
        Self {
            downstream,
            framing: MqttFramingParser::new(),
            table: FixedArray::new(),
            auth,
        }
    }

    fn mapped_name_for(&self, client_id: &str) -> Option<&str> {
        self.table
            .iter()
            .find(|e| e.client_id.as_str() == client_id)
            .map(|e| e.mapped_name.as_str())
    }

    fn client_id_for(&self, mapped_name: &str) -> Option<&str> {
        self.table
            .iter()
            .find(|e| e.mapped_name.as_str() == mapped_name)
            .map(|e| e.client_id.as_str())
    }

    /// Read one frame, if complete, from the downstream stream and react
    /// to it. Upstream publishes (topic already rewritten) are pushed
    /// through `forward`, which the caller binds to its own MQTT client.
    pub fn poll<U: ByteStream>(
        &mut self,
        now_ms: u64,
        upstream: &mut MqttClient<U>,
    ) -> Option<BridgeEvent> {
        if self.framing.poll_timeout(now_ms).is_some() {
            self.framing.reset_error();
            return Some(BridgeEvent::Dropped);
        }

        loop {
            match self.downstream.read_byte() {
                ReadStatus::NoData => return None,
                ReadStatus::Error => return Some(BridgeEvent::Dropped),
                ReadStatus::GotData(byte) => match self.framing.feed_byte(byte, now_ms) {
                    None => continue,
                    Some(ParserEvent::FrameReady) => {
                        let frame: heapless::Vec<u8, MQTT_MAX_MESSAGE_BYTES> =
                            heapless::Vec::from_slice(self.framing.frame()).unwrap_or_default();
                        return Some(self.handle_frame(&frame, upstream));
                    }
                    Some(ParserEvent::MalformedPacket) | Some(ParserEvent::ReceptionTimeout) => {
                        self.framing.reset_error();
                        return Some(BridgeEvent::Dropped);
                    }
                    Some(ParserEvent::IoException) => return Some(BridgeEvent::Dropped),
                },
            }
        }
    }

    fn handle_frame<U: ByteStream>(
        &mut self,
        frame: &[u8],
        upstream: &mut MqttClient<U>,
    ) -> BridgeEvent {
        let mut msg: MqttMessage<MQTT_MAX_MESSAGE_BYTES> = MqttMessage::new();
        if msg.validate_received_bytes(frame).is_err() {
            return BridgeEvent::Dropped;
        }

        match msg.packet_type() {
            Some(PacketType::Connect) => self.handle_connect(&msg),
            Some(PacketType::Publish) => self.handle_publish(&mut msg, upstream),
            _ => BridgeEvent::Dropped,
        }
    }

    fn handle_connect(&mut self, msg: &MqttMessage<MQTT_MAX_MESSAGE_BYTES>) -> BridgeEvent {
        let Ok(view) = connect::decode_connect(msg) else {
            return BridgeEvent::Dropped;
        };

        if self.mapped_name_for(view.client_id).is_some() {
            self.send_connack(false, ConnackReturnCode::Accepted);
            return BridgeEvent::ClientAccepted;
        }

        let mut mapped_name: String<BRIDGE_MAPPED_NAME_MAX_LEN> = String::new();
        let accepted = (self.auth)(view.client_id, view.username, view.password, &mut mapped_name);
        if !accepted {
            self.send_connack(false, ConnackReturnCode::BadUsernameOrPassword);
            return BridgeEvent::ClientRejected(ConnackReturnCode::BadUsernameOrPassword);
        }

        let Ok(client_id) = String::try_from(view.client_id) else {
            self.send_connack(false, ConnackReturnCode::ServerUnavailable);
            return BridgeEvent::ClientRejected(ConnackReturnCode::ServerUnavailable);
        };
        if !self.table.append(RemoteEntry {
            client_id,
            mapped_name,
        }) {
            self.send_connack(false, ConnackReturnCode::ServerUnavailable);
            return BridgeEvent::ClientRejected(ConnackReturnCode::ServerUnavailable);
        }

        self.send_connack(false, ConnackReturnCode::Accepted);
        BridgeEvent::ClientAccepted
    }

    fn send_connack(&mut self, session_present: bool, code: ConnackReturnCode) {
        let mut msg: MqttMessage<16> = MqttMessage::new();
        if connack::init_connack(&mut msg, session_present, code).is_ok() {
            self.downstream.write_bytes(msg.wire_bytes());
        }
    }

    fn handle_publish<U: ByteStream>(
        &mut self,
        msg: &mut MqttMessage<MQTT_MAX_MESSAGE_BYTES>,
        upstream: &mut MqttClient<U>,
    ) -> BridgeEvent {
        let (mapped_name, rest) = {
            let Ok(view) = publish::decode_publish(msg) else {
                return BridgeEvent::Dropped;
            };
            let Some((mapped_name, rest)) = split_first_segment(view.topic) else {
                return BridgeEvent::Dropped;
            };
            let Ok(mapped_name) = String::<BRIDGE_MAPPED_NAME_MAX_LEN>::try_from(mapped_name)
            else {
                return BridgeEvent::Dropped;
            };
            let Ok(rest) = String::<MQTT_MAX_TOPIC_LEN>::try_from(rest) else {
                return BridgeEvent::Dropped;
            };
            (mapped_name, rest)
        };
        let Some(client_id) = self.client_id_for(&mapped_name) else {
            return BridgeEvent::Dropped;
        };

        let mut new_topic: String<MQTT_MAX_TOPIC_LEN> = String::new();
        if new_topic.push_str("~/").is_err()
            || new_topic.push_str(client_id).is_err()
            || new_topic.push('/').is_err()
            || new_topic.push_str(&rest).is_err()
        {
            return BridgeEvent::Dropped;
        }

        if publish::rewrite_topic(msg, &new_topic).is_err() {
            return BridgeEvent::Dropped;
        }

        let view = publish::decode_publish(msg).expect("just rewrote a valid publish");
        let _ = upstream.publish(&PublishFields {
            topic: view.topic,
            packet_id: view.packet_id,
            payload: view.payload,
            qos: view.qos,
            dup: view.dup,
            retain: view.retain,
        });
        BridgeEvent::MessageForwarded
    }
}

/// Split `"sensor/temp"` into `("sensor", "temp")`.
fn split_first_segment(topic: &str) -> Option<(&str, &str)> {
    topic.split_once('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::fifo::OnFullPolicy;
    use crate::containers::Fifo;
    use crate::mqtt::messages::connect::ConnectFields;

    struct MemStream {
        rx: Fifo<u8, 512>,
        tx: heapless::Vec<u8, 512>,
    }

    impl MemStream {
        fn new() -> Self {
            Self {
                rx: Fifo::new(OnFullPolicy::DropNewest),
                tx: heapless::Vec::new(),
            }
        }

        fn inject(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.rx.enqueue(b);
            }
        }
    }

    impl ByteStream for MemStream {
        fn read_byte(&mut self) -> ReadStatus {
            match self.rx.dequeue() {
                Some(b) => ReadStatus::GotData(b),
                None => ReadStatus::NoData,
            }
        }

        fn write_byte(&mut self, byte: u8) -> bool {
            self.tx.push(byte).is_ok()
        }
    }

    fn accept_as_sensor(
        _client_id: &str,
        _username: Option<&str>,
        _password: Option<&[u8]>,
        mapped_name_out: &mut String<BRIDGE_MAPPED_NAME_MAX_LEN>,
    ) -> bool {
        mapped_name_out.push_str("sensor").is_ok()
    }

    fn reject_all(
        _client_id: &str,
        _username: Option<&str>,
        _password: Option<&[u8]>,
        _mapped_name_out: &mut String<BRIDGE_MAPPED_NAME_MAX_LEN>,
    ) -> bool {
        false
    }

    #[test]
    fn new_client_is_authenticated_and_mapped() {
        let mut bridge = BridgeNode::new(MemStream::new(), accept_as_sensor);
        let mut upstream = MqttClient::new(MemStream::new());

        let mut connect_msg: MqttMessage<128> = MqttMessage::new();
        connect::init_connect(
            &mut connect_msg,
            &ConnectFields {
                client_id: "abc123",
                clean_session: true,
                keep_alive_secs: 30,
                will: None,
                username: None,
                password: None,
            },
        )
        .unwrap();
        bridge.downstream.inject(connect_msg.wire_bytes());

        let event = bridge.poll(0, &mut upstream);
        assert_eq!(event, Some(BridgeEvent::ClientAccepted));
        assert_eq!(bridge.mapped_name_for("abc123"), Some("sensor"));
    }

    #[test]
    fn rejected_client_gets_bad_credentials_connack() {
        let mut bridge = BridgeNode::new(MemStream::new(), reject_all);
        let mut upstream = MqttClient::new(MemStream::new());

        let mut connect_msg: MqttMessage<128> = MqttMessage::new();
        connect::init_connect(
            &mut connect_msg,
            &ConnectFields {
                client_id: "xyz",
                clean_session: true,
                keep_alive_secs: 30,
                will: None,
                username: None,
                password: None,
            },
        )
        .unwrap();
        bridge.downstream.inject(connect_msg.wire_bytes());

        let event = bridge.poll(0, &mut upstream);
        assert_eq!(
            event,
            Some(BridgeEvent::ClientRejected(ConnackReturnCode::BadUsernameOrPassword))
        );
        assert!(bridge.mapped_name_for("xyz").is_none());
    }

    #[test]
    fn publish_from_mapped_client_is_rewritten_and_forwarded() {
        let mut bridge = BridgeNode::new(MemStream::new(), accept_as_sensor);
        let mut upstream = MqttClient::new(MemStream::new());

        let mut connect_msg: MqttMessage<128> = MqttMessage::new();
        connect::init_connect(
            &mut connect_msg,
            &ConnectFields {
                client_id: "abc123",
                clean_session: true,
                keep_alive_secs: 30,
                will: None,
                username: None,
                password: None,
            },
        )
        .unwrap();
        bridge.downstream.inject(connect_msg.wire_bytes());
        bridge.poll(0, &mut upstream);

        let mut publish_msg: MqttMessage<128> = MqttMessage::new();
        publish::init_publish(
            &mut publish_msg,
            &PublishFields {
                topic: "sensor/temp",
                packet_id: None,
                payload: b"23.5",
                qos: 0,
                dup: false,
                retain: false,
            },
        )
        .unwrap();
        bridge.downstream.inject(publish_msg.wire_bytes());

        let event = bridge.poll(0, &mut upstream);
        assert_eq!(event, Some(BridgeEvent::MessageForwarded));
        assert_eq!(upstream.inbound().packet_type(), None);
    }
}
