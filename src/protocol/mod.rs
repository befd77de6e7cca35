//! Streaming protocol parsers, one per supported wire framing, all sharing
//! the [`base`] state contract: `Idle → WaitStart → WaitBody → (FrameReady
//! | ReceptionTimeout) → WaitStart`, with a separate `Error` state for
//! framing violations requiring `reset_error()`.

pub mod base;
pub mod bgapi;
pub mod cle;
pub mod crlf;
pub mod mqtt_framing;

pub use base::{ParserEvent, ParserState, ReceptionTimeout};
