//! Drives `MqttClient` against a hand-rolled single-packet "broker" on the
//! other end of an in-memory duplex stream, exercising the wire format end
//! to end rather than against a loopback fixture.

use embedcore::mqtt::message::{MqttMessage, PacketType};
use embedcore::mqtt::messages::connack::{self, ConnackReturnCode};
use embedcore::mqtt::messages::publish::{self, PublishFields};
use embedcore::mqtt::{ClientEvent, ClientState, MqttClient};
use embedcore::protocol::mqtt_framing::MqttFramingParser;
use embedcore::protocol::ParserEvent;

use crate::mem_stream::MemStream;

type Scratch = MqttMessage<512>;

fn read_one_frame(stream: &mut MemStream, parser: &mut MqttFramingParser) -> heapless::Vec<u8, 512> {
    use embedcore::io::{ByteStream, ReadStatus};
    loop {
        match stream.read_byte() {
            ReadStatus::NoData | ReadStatus::Error => panic!("stream starved before a frame completed"),
            ReadStatus::GotData(byte) => {
                if let Some(ParserEvent::FrameReady) = parser.feed_byte(byte, 0) {
                    return heapless::Vec::from_slice(parser.frame()).unwrap();
                }
            }
        }
    }
}

#[test]
fn connect_connack_publish_round_trip_over_duplex_stream() {
    use embedcore::io::ByteStream;

    let (client_stream, mut broker_stream) = MemStream::pair();
    let mut client = MqttClient::new(client_stream);

    client
        .send_connect(&embedcore::mqtt::messages::connect::ConnectFields {
            client_id: "dev-01",
            clean_session: true,
            keep_alive_secs: 60,
            will: None,
            username: None,
            password: None,
        })
        .unwrap();

    let mut broker_parser = MqttFramingParser::new();
    let connect_frame = read_one_frame(&mut broker_stream, &mut broker_parser);
    assert_eq!(connect_frame[0] >> 4, PacketType::Connect as u8);

    let mut connack_msg: Scratch = MqttMessage::new();
    connack::init_connack(&mut connack_msg, false, ConnackReturnCode::Accepted).unwrap();
    broker_stream.write_bytes(connack_msg.wire_bytes());

    assert_eq!(
        client.poll(0),
        Some(ClientEvent::Connected {
            session_present: false
        })
    );
    assert_eq!(client.state(), ClientState::Connected);

    client
        .publish(&PublishFields {
            topic: "sensors/temp",
            packet_id: None,
            payload: b"21.5",
            qos: 0,
            dup: false,
            retain: false,
        })
        .unwrap();

    let publish_frame = read_one_frame(&mut broker_stream, &mut broker_parser);
    let mut decoded: Scratch = MqttMessage::new();
    decoded.validate_received_bytes(&publish_frame).unwrap();
    let view = publish::decode_publish(&decoded).unwrap();
    assert_eq!(view.topic, "sensors/temp");
    assert_eq!(view.payload, b"21.5");
    assert_eq!(view.qos, 0);
}

#[test]
fn bad_username_password_connack_transitions_to_rejected() {
    use embedcore::io::ByteStream;

    let (client_stream, mut broker_stream) = MemStream::pair();
    let mut client = MqttClient::new(client_stream);

    let mut connack_msg: Scratch = MqttMessage::new();
    connack::init_connack(
        &mut connack_msg,
        false,
        ConnackReturnCode::BadUsernameOrPassword,
    )
    .unwrap();
    broker_stream.write_bytes(connack_msg.wire_bytes());

    assert_eq!(
        client.poll(0),
        Some(ClientEvent::ConnectRejected(
            ConnackReturnCode::BadUsernameOrPassword
        ))
    );
    assert_eq!(
        client.state(),
        ClientState::Rejected(ConnackReturnCode::BadUsernameOrPassword)
    );
}
