//! A minimal MQTT 3.1.1 client: a framing parser over a [`ByteStream`], a
//! small pool of pre-allocated [`MqttMessage`] scratch buffers (no
//! allocation on the publish/subscribe/connect hot paths), and a
//! monotonically increasing packet id counter for QoS 1/2 traffic this
//! crate parses but does not originate by default.

use crate::config::{MQTT_MAX_MESSAGE_BYTES, MQTT_MESSAGE_POOL_SIZE};
use crate::error::MqttError;
use crate::io::{ByteStream, ReadStatus};
use crate::protocol::mqtt_framing::MqttFramingParser;
use crate::protocol::ParserEvent;

use super::message::{MqttMessage, PacketType};
use super::messages::connack::ConnackReturnCode;
use super::messages::connect::ConnectFields;
use super::messages::publish::PublishFields;
use super::messages::subscribe::TopicFilter;
use super::messages::{connack, connect, ping, publish, subscribe};

/// One scratch message, sized by [`MQTT_MAX_MESSAGE_BYTES`].
type Scratch = MqttMessage<MQTT_MAX_MESSAGE_BYTES>;

/// Connection lifecycle state, driven by CONNECT/CONNACK and transport
/// events. Deliberately separate from [`crate::runloop::fsm::Fsm`] — a
/// client only ever has these four states and never needs dynamic
/// registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    ConnectSent,
    Connected,
    Rejected(ConnackReturnCode),
}

/// An event surfaced by [`MqttClient::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    Connected { session_present: bool },
    ConnectRejected(ConnackReturnCode),
    PublishReceived,
    PingResponse,
    ProtocolError(MqttError),
    TransportError,
}

/// Round-robin pool of scratch message buffers. Not a true allocator:
/// callers that need to inspect a previously acquired message past the
/// next `acquire()` call must finish with it first.
struct MessagePool {
    slots: [Scratch; MQTT_MESSAGE_POOL_SIZE],
    next: usize,
}

impl MessagePool {
    fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Scratch::new()),
            next: 0,
        }
    }

    fn acquire(&mut self) -> &mut Scratch {
        let idx = self.next;
        self.next = (self.next + 1) % MQTT_MESSAGE_POOL_SIZE;
        self.slots[idx].reset();
        &mut self.slots[idx]
    }
}

pub struct MqttClient<S: ByteStream> {
    stream: S,
    framing: MqttFramingParser,
    pool: MessagePool,
    inbound: Scratch,
    state: ClientState,
    next_packet_id: u16,
}

impl<S: ByteStream> MqttClient<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            framing: MqttFramingParser::new(),
            pool: MessagePool::new(),
            inbound: Scratch::new(),
            state: ClientState::Disconnected,
            next_packet_id: 1,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Last message successfully decoded from the wire by `poll`.
    pub fn inbound(&self) -> &Scratch {
        &self.inbound
    }

    fn next_id(&mut self) -> u16 {
        let id = self.next_packet_id;
        self.next_packet_id = self.next_packet_id.wrapping_add(1).max(1);
        id
    }

    pub fn send_connect(&mut self, fields: &ConnectFields<'_>) -> Result<(), MqttError> {
        let msg = self.pool.acquire();
        connect::init_connect(msg, fields)?;
        self.stream.write_bytes(msg.wire_bytes());
        self.state = ClientState::ConnectSent;
        Ok(())
    }

    pub fn publish(&mut self, fields: &PublishFields<'_>) -> Result<(), MqttError> {
        let msg = self.pool.acquire();
        publish::init_publish(msg, fields)?;
        self.stream.write_bytes(msg.wire_bytes());
        Ok(())
    }

    pub fn subscribe(&mut self, filters: &[TopicFilter<'_>]) -> Result<u16, MqttError> {
        let packet_id = self.next_id();
        let msg = self.pool.acquire();
        subscribe::init_subscribe(msg, packet_id, filters)?;
        self.stream.write_bytes(msg.wire_bytes());
        Ok(packet_id)
    }

    pub fn ping(&mut self) -> Result<(), MqttError> {
        let msg = self.pool.acquire();
        ping::init_pingreq(msg)?;
        self.stream.write_bytes(msg.wire_bytes());
        Ok(())
    }

    /// Drain available bytes from the transport, feeding the framing
    /// parser, and react to at most one complete frame. Call repeatedly
    /// until it returns `None` to drain a burst.
    pub fn poll(&mut self, now_ms: u64) -> Option<ClientEvent> {
        if let Some(event) = self.framing.poll_timeout(now_ms) {
            let _ = event;
            self.framing.reset_error();
            return Some(ClientEvent::TransportError);
        }

        loop {
            match self.stream.read_byte() {
                ReadStatus::NoData => return None,
                ReadStatus::Error => return Some(ClientEvent::TransportError),
                ReadStatus::GotData(byte) => match self.framing.feed_byte(byte, now_ms) {
                    None => continue,
                    Some(ParserEvent::FrameReady) => {
                        let frame: heapless::Vec<u8, MQTT_MAX_MESSAGE_BYTES> =
                            heapless::Vec::from_slice(self.framing.frame())
                                .unwrap_or_default();
                        return Some(self.handle_frame(&frame));
                    }
                    Some(ParserEvent::ReceptionTimeout) => return Some(ClientEvent::TransportError),
                    Some(ParserEvent::MalformedPacket) => {
                        self.framing.reset_error();
                        return Some(ClientEvent::ProtocolError(MqttError::MalformedMessage));
                    }
                    Some(ParserEvent::IoException) => return Some(ClientEvent::TransportError),
                },
            }
        }
    }

    fn handle_frame(&mut self, frame: &[u8]) -> ClientEvent {
        if let Err(err) = self.inbound.validate_received_bytes(frame) {
            return ClientEvent::ProtocolError(err);
        }
        match self.inbound.packet_type() {
            Some(PacketType::Connack) => match connack::decode_connack(&self.inbound) {
                Ok((session_present, ConnackReturnCode::Accepted)) => {
                    self.state = ClientState::Connected;
                    ClientEvent::Connected { session_present }
                }
                Ok((_, code)) => {
                    self.state = ClientState::Rejected(code);
                    ClientEvent::ConnectRejected(code)
                }
                Err(err) => ClientEvent::ProtocolError(err),
            },
            Some(PacketType::Publish) => ClientEvent::PublishReceived,
            Some(PacketType::Pingresp) => ClientEvent::PingResponse,
            _ => ClientEvent::ProtocolError(MqttError::ProtocolViolation),
        }
    }
}
