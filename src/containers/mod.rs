//! Fixed-capacity containers. These are the only allocation strategy used
//! above this layer: every higher subsystem sizes its storage from a
//! [`crate::config`] constant and never asks an allocator at run time.

pub mod array;
pub mod buffer;
pub mod fifo;
pub mod linked_field;

pub use array::FixedArray;
pub use buffer::ByteBuffer;
pub use fifo::Fifo;
pub use linked_field::{LinkedField, LinkedFieldChain};
