//! The interpreter: a fetch-decode-execute loop over 16 bit words.
//!
//! State is split the way the instruction set sees it:
//!
//! - a global [`RegisterFile`] of 50 dynamically typed cells
//! - a [`FrameStack`] with one sparse register snapshot per call depth,
//!   written by ADDL, SETL, LOAD and PROP and replayed into the register
//!   file by SEND
//! - a single FIFO [`Mailbox`] carrying call arguments, return addresses
//!   and return values
//! - a fixed capacity [`Heap`] of property-bearing objects
//!
//! Every fault is fatal. [`VM::run`] stops at the faulting instruction and
//! leaves the machine inspectable through [`VM::dump`].

mod bytecode;
mod config;
mod constants;
mod dump;
mod error;
mod frame;
mod heap;
mod mailbox;
mod program;
mod registers;
mod value;
mod vm;

#[cfg(test)]
mod tests;

pub use bytecode::{Addr, Instruction, Opcode, Reg, Tag, Word};
pub use config::VmConfig;
pub use constants::{DEFAULT_HEAP_CAPACITY, MAX_CALL_DEPTH, MAX_PROGRAM_LEN, REGISTER_COUNT, TYPE_INT};
pub use dump::Dump;
pub use error::{Fault, FaultKind, LoadError};
pub use frame::{Frame, FrameStack};
pub use heap::{Heap, Object};
pub use mailbox::Mailbox;
pub use program::Program;
pub use registers::RegisterFile;
pub use value::{cast, ObjectRef, TypeTag, Value};
pub use vm::{Status, VM};
