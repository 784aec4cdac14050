//! Host-side test doubles shared by the unit tests.

use heapless::{Deque, String, Vec};

use crate::io::{ByteSink, ByteSource};

/// Operator console that keeps everything written to it.
pub type Console = String<4096>;

/// Full-duplex link with a scripted receive side and a captured send side.
pub struct MockLink {
    rx: Deque<u8, 512>,
    pub tx: Vec<u8, 1024>,
}

impl MockLink {
    pub fn new() -> Self {
        Self { rx: Deque::new(), tx: Vec::new() }
    }

    /// Queue bytes for the next reads.
    pub fn feed(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.rx.push_back(*b).unwrap();
        }
    }

    pub fn sent(&self) -> &[u8] {
        &self.tx
    }
}

impl ByteSource for MockLink {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}

impl ByteSink for MockLink {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.tx.extend_from_slice(bytes).unwrap();
    }
}
