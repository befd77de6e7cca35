//! Unified error types for this crate.
//!
//! A single `Error` enum that every subsystem converts into, keeping
//! higher-layer error handling uniform. Variants are `Copy` so they can be
//! passed through the run-loop and FSM without allocation. Fallible
//! container/field operations (§4.1) keep returning `bool`/`Option` per
//! their own contract; this type is for operations with a richer failure
//! taxonomy (parser exceptions, RPC dispatch failures, bridge auth).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level crate error
// ---------------------------------------------------------------------------

/// Every fallible operation above the container layer funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A byte container operation failed (pool exhaustion, bounds).
    Container(ContainerError),
    /// A protocol parser hit an unrecoverable framing condition.
    Protocol(ProtocolError),
    /// An MQTT message failed to encode or decode.
    Mqtt(MqttError),
    /// An RPC tree dispatch failed.
    Rpc(RpcError),
    /// A BTLE central operation failed.
    Btle(BtleError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container(e) => write!(f, "container: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Mqtt(e) => write!(f, "mqtt: {e}"),
            Self::Rpc(e) => write!(f, "rpc: {e}"),
            Self::Btle(e) => write!(f, "btle: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Container errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerError {
    /// A fixed-capacity container has no room for the requested insert.
    Full,
    /// An index was outside the container's current size.
    OutOfBounds,
    /// A linked-field chain would extend past its backing buffer.
    ChainOverrun,
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "container full"),
            Self::OutOfBounds => write!(f, "index out of bounds"),
            Self::ChainOverrun => write!(f, "linked field chain overrun"),
        }
    }
}

impl From<ContainerError> for Error {
    fn from(e: ContainerError) -> Self {
        Self::Container(e)
    }
}

// ---------------------------------------------------------------------------
// Protocol parser errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// The underlying byte stream reported an I/O exception.
    IoException,
    /// No progress for the reception timeout window with a frame open.
    ReceptionTimeout,
    /// A frame's length or header bytes did not satisfy the framing.
    MalformedPacket,
    /// The parser is in its `Error` state and needs `reset_error()`.
    NeedsReset,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoException => write!(f, "I/O exception"),
            Self::ReceptionTimeout => write!(f, "reception timeout"),
            Self::MalformedPacket => write!(f, "malformed packet"),
            Self::NeedsReset => write!(f, "parser needs reset_error()"),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// MQTT message errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MqttError {
    /// Fixed header type/flags combination is not valid for the type.
    ProtocolViolation,
    /// A declared field did not fit inside the message buffer.
    MalformedMessage,
    /// Client id, topic or payload exceeded its maximum length.
    FieldTooLong,
    /// The message pool has no free slots.
    PoolExhausted,
}

impl fmt::Display for MqttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtocolViolation => write!(f, "protocol violation"),
            Self::MalformedMessage => write!(f, "malformed message"),
            Self::FieldTooLong => write!(f, "field too long"),
            Self::PoolExhausted => write!(f, "message pool exhausted"),
        }
    }
}

impl From<MqttError> for Error {
    fn from(e: MqttError) -> Self {
        Self::Mqtt(e)
    }
}

// ---------------------------------------------------------------------------
// RPC tree errors
// ---------------------------------------------------------------------------

/// Mirrors the numeric status codes carried on the wire in `/rpcResp/.../<status>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RpcError {
    MalformedPath = 1,
    NodeDoesNotExist = 2,
    MethodDoesNotExist = 3,
    InvalidParams = 4,
    BadState = 5,
    AuthenticationFailed = 6,
    Internal = 255,
}

impl RpcError {
    /// The numeric status code placed in the response topic.
    pub const fn status_code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPath => write!(f, "malformed path"),
            Self::NodeDoesNotExist => write!(f, "node does not exist"),
            Self::MethodDoesNotExist => write!(f, "method does not exist"),
            Self::InvalidParams => write!(f, "invalid params"),
            Self::BadState => write!(f, "bad state"),
            Self::AuthenticationFailed => write!(f, "authentication failed"),
            Self::Internal => write!(f, "internal error"),
        }
    }
}

impl From<RpcError> for Error {
    fn from(e: RpcError) -> Self {
        Self::Rpc(e)
    }
}

// ---------------------------------------------------------------------------
// BTLE central errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BtleError {
    /// The connection pool has no free slots.
    PoolExhausted,
    /// No connection matches the given address or handle.
    NoSuchConnection,
    /// A GATT procedure was requested while one was already in flight.
    ProcedureBusy,
    /// The backend reported a GATT procedure failure.
    GattProcedureFailed,
}

impl fmt::Display for BtleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolExhausted => write!(f, "connection pool exhausted"),
            Self::NoSuchConnection => write!(f, "no such connection"),
            Self::ProcedureBusy => write!(f, "GATT procedure already in flight"),
            Self::GattProcedureFailed => write!(f, "GATT procedure failed"),
        }
    }
}

impl From<BtleError> for Error {
    fn from(e: BtleError) -> Self {
        Self::Btle(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
