use super::constants::{DEFAULT_HEAP_CAPACITY, MAX_CALL_DEPTH};

/// Limits fixed when a [`VM`](super::VM) is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Number of objects that may be live at once.
    pub heap_capacity: usize,
    /// Deepest call depth a CALL may enter.
    pub max_call_depth: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            heap_capacity: DEFAULT_HEAP_CAPACITY,
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}

impl VmConfig {
    pub fn with_heap_capacity(mut self, heap_capacity: usize) -> Self {
        self.heap_capacity = heap_capacity;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }
}
