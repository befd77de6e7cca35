//! Non-blocking byte stream abstraction used by every protocol parser.

pub mod stream;

pub use stream::{ByteStream, PeekableStream, ReadStatus};
