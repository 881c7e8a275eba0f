use std::collections::VecDeque;

use super::error::FaultKind;
use super::value::Value;

/// The single FIFO channel shared by arguments, return addresses and return
/// values. Nothing tags the entries; callers and callees must agree on how
/// many values each side enqueues and dequeues.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    queue: VecDeque<Value>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, val: Value) {
        self.queue.push_back(val);
    }

    pub fn pop(&mut self) -> Result<Value, FaultKind> {
        self.queue.pop_front().ok_or(FaultKind::MailboxUnderflow)
    }

    pub fn front(&self) -> Option<&Value> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.queue.iter()
    }
}
