//! Runtime configuration constants for the ivm interpreter
//!
//! This module centralizes the fixed sizes and default limits used by the VM.

/// Number of cells in the global register file.
pub const REGISTER_COUNT: usize = 50;

/// Heap capacity used when a VM is built without an explicit configuration.
pub const DEFAULT_HEAP_CAPACITY: usize = 256;

/// Maximum call depth before CALL faults.
///
/// Frames are never popped, so unbounded recursion would otherwise grow the
/// frame stack and the mailbox until memory runs out.
pub const MAX_CALL_DEPTH: usize = 1000;

/// Largest program that can be loaded. Addresses are single 16 bit words, so
/// anything past this could never be the target of a CALL or a return.
pub const MAX_PROGRAM_LEN: usize = u16::MAX as usize + 1;

/// Type tag naming the integer cast kind. It is the only tag defined.
pub const TYPE_INT: u16 = 0;
