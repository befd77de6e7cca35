//! Per-packet-type field layouts built on top of [`super::message::MqttMessage`]'s
//! shared header/remaining-length/content envelope.

pub mod connack;
pub mod connect;
pub mod ping;
pub mod publish;
pub mod suback;
pub mod subscribe;
