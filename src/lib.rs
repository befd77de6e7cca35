//! Portable core for devices that speak MQTT 3.1.1 and drive a BTLE central
//! role, built on a single-threaded cooperative run-loop.
//!
//! Every subsystem here assumes a `no_std`-friendly capacity discipline:
//! fixed-size containers, no dynamic allocation on any hot path, no
//! preemptive multitasking. Platform integration (GPIO, I2C, a byte stream,
//! a monotonic clock) is consumed through the traits in [`capability`] and
//! [`time`]; concrete drivers for a given MCU live outside this crate.

#![deny(unused_must_use)]

pub mod btle;
pub mod capability;
pub mod config;
pub mod containers;
pub mod error;
pub mod io;
pub mod mqtt;
pub mod protocol;
pub mod rpc;
pub mod runloop;
pub mod time;

pub use error::{Error, Result};
