//! Command bytes that could not be written without blocking.

use std::collections::VecDeque;

#[derive(Debug)]
struct PendingBlock {
    data: Vec<u8>,
    /// Bytes of `data` already written.
    offset: usize,
}

/// FIFO of unsent command bytes.
///
/// Blocks are flushed strictly in append order and a block is dropped only
/// once every byte of it has been written.
#[derive(Debug, Default)]
pub struct PendingWriteQueue {
    blocks: VecDeque<PendingBlock>,
    queued: usize,
}

impl PendingWriteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block. Empty blocks are ignored.
    pub fn push(&mut self, data: Vec<u8>) {
        if data.is_empty() {
            return;
        }
        self.queued += data.len();
        self.blocks.push_back(PendingBlock { data, offset: 0 });
    }

    /// Unsent bytes of the head block.
    pub fn head(&self) -> Option<&[u8]> {
        self.blocks.front().map(|b| &b.data[b.offset..])
    }

    /// Record that `n` bytes of the head block were written.
    pub fn advance(&mut self, mut n: usize) {
        while n > 0 {
            let Some(block) = self.blocks.front_mut() else {
                return;
            };
            let remaining = block.data.len() - block.offset;
            let step = n.min(remaining);
            block.offset += step;
            self.queued -= step;
            n -= step;
            if block.offset == block.data.len() {
                self.blocks.pop_front();
            }
        }
    }

    /// Total unsent bytes.
    pub const fn len(&self) -> usize {
        self.queued
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.queued = 0;
    }
}
