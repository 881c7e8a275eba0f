pub mod driver;
pub mod runtime;

pub use runtime::{Fault, FaultKind, Program, Status, Value, VmConfig, VM};
