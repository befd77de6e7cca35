//! BTLE central-role stack: advertisement parsing ([`advert`]), the radio
//! driver seam ([`backend`]), and the connection pool FSM that drives it
//! ([`central`]). This crate does not manage a peripheral-role GATT
//! database; see the `backend` doc comment for the line this crate draws.

pub mod advert;
pub mod backend;
pub mod central;

pub use advert::{AdField, AdType, AdvertPacket, Uuid128};
pub use backend::{BtleAddr, BtleBackend, BtleEvent, GattOp};
pub use central::{Central, CentralEvent};
