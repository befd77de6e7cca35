//! A byte stream is a non-blocking source-and-sink pair. Implementations
//! wrap a concrete transport (UART, TCP socket, a BTLE GATT pipe); none of
//! this crate's parser logic depends on which.

/// Outcome of a single non-blocking read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// A byte was available and is returned alongside this status.
    GotData(u8),
    /// No byte was available this call; try again later.
    NoData,
    /// The underlying transport reported an unrecoverable error.
    Error,
}

/// Non-blocking byte transport. `read_byte` must never block; if no byte
/// is ready it returns [`ReadStatus::NoData`] immediately.
pub trait ByteStream {
    fn read_byte(&mut self) -> ReadStatus;

    /// Write one byte; returns `false` if the transport rejected it
    /// (e.g. its outgoing buffer is full).
    fn write_byte(&mut self, byte: u8) -> bool;

    /// Write a full slice. The default implementation calls `write_byte`
    /// per byte and stops at the first failure, returning how many bytes
    /// were actually written.
    fn write_bytes(&mut self, data: &[u8]) -> usize {
        let mut written = 0;
        for &b in data {
            if !self.write_byte(b) {
                break;
            }
            written += 1;
        }
        written
    }
}

/// Wraps a [`ByteStream`] with a one-byte lookahead buffer.
pub struct PeekableStream<S: ByteStream> {
    inner: S,
    stashed: Option<u8>,
}

impl<S: ByteStream> PeekableStream<S> {
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            stashed: None,
        }
    }

    /// Look at the next byte without consuming it. Repeated calls without
    /// an intervening `read_byte` return the same byte.
    pub fn peek(&mut self) -> ReadStatus {
        if let Some(b) = self.stashed {
            return ReadStatus::GotData(b);
        }
        match self.inner.read_byte() {
            ReadStatus::GotData(b) => {
                self.stashed = Some(b);
                ReadStatus::GotData(b)
            }
            other => other,
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ByteStream> ByteStream for PeekableStream<S> {
    fn read_byte(&mut self) -> ReadStatus {
        if let Some(b) = self.stashed.take() {
            return ReadStatus::GotData(b);
        }
        self.inner.read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> bool {
        self.inner.write_byte(byte)
    }

    fn write_bytes(&mut self, data: &[u8]) -> usize {
        self.inner.write_bytes(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::Fifo;
    use crate::containers::fifo::OnFullPolicy;

    /// An in-memory stream backed by a FIFO, for host tests.
    struct MemStream {
        rx: Fifo<u8, 64>,
        tx: heapless::Vec<u8, 64>,
    }

    impl MemStream {
        fn with_input(data: &[u8]) -> Self {
            let mut rx = Fifo::new(OnFullPolicy::DropNewest);
            for &b in data {
                rx.enqueue(b);
            }
            Self {
                rx,
                tx: heapless::Vec::new(),
            }
        }
    }

    impl ByteStream for MemStream {
        fn read_byte(&mut self) -> ReadStatus {
            match self.rx.dequeue() {
                Some(b) => ReadStatus::GotData(b),
                None => ReadStatus::NoData,
            }
        }

        fn write_byte(&mut self, byte: u8) -> bool {
            self.tx.push(byte).is_ok()
        }
    }

    #[test]
    fn read_drains_in_order_then_no_data() {
        let mut s = MemStream::with_input(&[1, 2, 3]);
        assert_eq!(s.read_byte(), ReadStatus::GotData(1));
        assert_eq!(s.read_byte(), ReadStatus::GotData(2));
        assert_eq!(s.read_byte(), ReadStatus::GotData(3));
        assert_eq!(s.read_byte(), ReadStatus::NoData);
    }

    #[test]
    fn write_bytes_stops_at_first_rejection() {
        struct TinyStream {
            remaining: usize,
        }
        impl ByteStream for TinyStream {
            fn read_byte(&mut self) -> ReadStatus {
                ReadStatus::NoData
            }
            fn write_byte(&mut self, _byte: u8) -> bool {
                if self.remaining == 0 {
                    return false;
                }
                self.remaining -= 1;
                true
            }
        }
        let mut s = TinyStream { remaining: 2 };
        assert_eq!(s.write_bytes(&[1, 2, 3, 4]), 2);
    }

    #[test]
    fn peek_does_not_consume_until_read() {
        let mut s = PeekableStream::new(MemStream::with_input(&[42]));
        assert_eq!(s.peek(), ReadStatus::GotData(42));
        assert_eq!(s.peek(), ReadStatus::GotData(42));
        assert_eq!(s.read_byte(), ReadStatus::GotData(42));
        assert_eq!(s.read_byte(), ReadStatus::NoData);
    }
}
