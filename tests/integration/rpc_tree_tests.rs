//! Drives a full request/response cycle through `RpcRoot`: a raw PUBLISH
//! frame injected on the wire dispatches to a registered method, and the
//! response is read back off the same duplex stream.

use embedcore::error::RpcError;
use embedcore::io::ByteStream;
use embedcore::mqtt::message::MqttMessage;
use embedcore::mqtt::messages::publish;
use embedcore::mqtt::ClientEvent;
use embedcore::protocol::mqtt_framing::MqttFramingParser;
use embedcore::protocol::ParserEvent;
use embedcore::rpc::{ReturnParams, RpcRoot};

use crate::mem_stream::MemStream;

fn double_method(params: &[u8], out: &mut ReturnParams) -> Result<(), RpcError> {
    let value = *params.first().ok_or(RpcError::Internal)?;
    out.push(value.wrapping_mul(2)).map_err(|_| RpcError::Internal)
}

fn read_one_frame(stream: &mut MemStream, parser: &mut MqttFramingParser) -> heapless::Vec<u8, 512> {
    use embedcore::io::ReadStatus;
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
fn method_dispatch_publishes_response_with_status_zero() {
    let (client_stream, mut broker_stream) = MemStream::pair();
    let mut root = RpcRoot::new(client_stream, "home", "dev").unwrap();
    let sensors = root.add_child(root.root_id(), "sensors").unwrap();
    root.register_method(sensors, "double", double_method).unwrap();

    let mut payload: heapless::Vec<u8, 8> = heapless::Vec::new();
    payload.extend_from_slice(&7u16.to_be_bytes()).unwrap(); // request id
    payload.push(21).unwrap(); // param to double

    let mut request: MqttMessage<256> = MqttMessage::new();
    publish::init_publish(
        &mut request,
        &publish::PublishFields {
            topic: "home/dev/sensors/::double",
            packet_id: None,
            payload: &payload,
            qos: 0,
            dup: false,
            retain: false,
        },
    )
    .unwrap();
    broker_stream.write_bytes(request.wire_bytes());

    assert_eq!(root.poll(0), Some(ClientEvent::PublishReceived));

    let mut broker_parser = MqttFramingParser::new();
    let response_frame = read_one_frame(&mut broker_stream, &mut broker_parser);
    let mut decoded: MqttMessage<256> = MqttMessage::new();
    decoded.validate_received_bytes(&response_frame).unwrap();
    let view = publish::decode_publish(&decoded).unwrap();

    assert_eq!(view.topic, "/rpcResp/home/dev/sensors/::double/7/0");
    assert_eq!(view.payload, &[42]);
}

#[test]
fn unknown_method_publishes_nonzero_status() {
    let (client_stream, mut broker_stream) = MemStream::pair();
    let mut root = RpcRoot::new(client_stream, "home", "dev").unwrap();

    let mut payload: heapless::Vec<u8, 8> = heapless::Vec::new();
    payload.extend_from_slice(&3u16.to_be_bytes()).unwrap();

    let mut request: MqttMessage<256> = MqttMessage::new();
    publish::init_publish(
        &mut request,
        &publish::PublishFields {
            topic: "home/dev/::missing",
            packet_id: None,
            payload: &payload,
            qos: 0,
            dup: false,
            retain: false,
        },
    )
    .unwrap();
    broker_stream.write_bytes(request.wire_bytes());
    root.poll(0);

    let mut broker_parser = MqttFramingParser::new();
    let response_frame = read_one_frame(&mut broker_stream, &mut broker_parser);
    let mut decoded: MqttMessage<256> = MqttMessage::new();
    decoded.validate_received_bytes(&response_frame).unwrap();
    let view = publish::decode_publish(&decoded).unwrap();

    assert_eq!(view.topic, "/rpcResp/home/dev/::missing/3/3");
}
