//! MQTT 3.1.1 message model and a minimal client: packet envelope and
//! per-type field layouts in [`message`]/[`messages`], the remaining-length
//! codec in [`varint`], and [`client::MqttClient`] tying them to a
//! [`crate::io::ByteStream`] via [`crate::protocol::mqtt_framing`].

pub mod client;
pub mod message;
pub mod messages;
pub mod varint;

pub use client::{ClientEvent, ClientState, MqttClient};
pub use message::{MqttMessage, PacketType};
