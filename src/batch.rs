//! Size-triggered buffering of built records.

use crate::record::ParsedRecord;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug)]
pub struct BatchAccumulator {
    buffer: Vec<ParsedRecord>,
    capacity: usize,
}

impl BatchAccumulator {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&mut self, record: ParsedRecord) {
        self.buffer.push(record);
    }

    pub fn should_flush(&self) -> bool {
        self.buffer.len() >= self.capacity
    }

    /// Returns every buffered record, leaving the buffer empty.
    pub fn drain_all(&mut self) -> Vec<ParsedRecord> {
        std::mem::replace(&mut self.buffer, Vec::with_capacity(self.capacity))
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for BatchAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}
