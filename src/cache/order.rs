//! Insertion Order Module
//!
//! Tracks the order in which keys were written to a partition.

use std::collections::VecDeque;

use crate::message::RequestKey;

// == Insertion Order ==
/// Tracks write order for FIFO eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest write
/// - Back = Newest write
///
/// Reads never touch the order. Rewriting a key moves it to the back.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    order: VecDeque<RequestKey>,
}

impl InsertionOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record Write ==
    /// Appends a key as the newest write, dropping any earlier position.
    pub fn record_write(&mut self, key: &RequestKey) {
        self.remove(key);
        self.order.push_back(key.clone());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &RequestKey) {
        self.order.retain(|k| k != key);
    }

    // == Iterate ==
    /// All keys, oldest first.
    pub fn keys(&self) -> Vec<RequestKey> {
        self.order.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
