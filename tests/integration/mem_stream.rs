//! A duplex in-memory `ByteStream` pair for driving an `MqttClient` against
//! a hand-rolled broker/bridge in host tests, without a real socket.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedcore::io::{ByteStream, ReadStatus};

#[derive(Clone)]
struct Pipe(Rc<RefCell<VecDeque<u8>>>);

impl Pipe {
    fn new() -> Self {
        Self(Rc::new(RefCell::new(VecDeque::new())))
    }
}

/// One end of a duplex byte pipe: reads what the other end wrote.
pub struct MemStream {
    inbound: Pipe,
    outbound: Pipe,
}

impl MemStream {
    /// Build a connected pair: bytes written to `.0` are read by `.1` and
    /// vice versa.
    pub fn pair() -> (MemStream, MemStream) {
        let a_to_b = Pipe::new();
        let b_to_a = Pipe::new();
        (
            MemStream {
                inbound: b_to_a.clone(),
                outbound: a_to_b.clone(),
            },
            MemStream {
                inbound: a_to_b,
                outbound: b_to_a,
            },
        )
    }
}

impl ByteStream for MemStream {
    fn read_byte(&mut self) -> ReadStatus {
        match self.inbound.0.borrow_mut().pop_front() {
            Some(b) => ReadStatus::GotData(b),
            None => ReadStatus::NoData,
        }
    }

    fn write_byte(&mut self, byte: u8) -> bool {
        self.outbound.0.borrow_mut().push_back(byte);
        true
    }
}
