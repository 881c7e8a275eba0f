use thiserror::Error;

/// Which component invariant an instruction violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaultKind {
    #[error("invalid opcode {opcode}")]
    InvalidOpcode { opcode: u16 },
    #[error("{operand} index {index} out of range (limit {limit})")]
    OperandOutOfRange {
        operand: &'static str,
        index: usize,
        limit: usize,
    },
    #[error("mailbox underflow")]
    MailboxUnderflow,
    #[error("heap exhausted (capacity {capacity})")]
    HeapExhausted { capacity: usize },
    #[error("unsupported cast to type tag {tag}")]
    UnsupportedCast { tag: u16 },
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("unexpected end of program")]
    UnexpectedEndOfProgram,
    #[error("return without call")]
    ReturnWithoutCall,
    #[error("call depth exceeded (limit {limit})")]
    CallDepthExceeded { limit: usize },
    #[error("failed to write output: {message}")]
    Output { message: String },
}

impl FaultKind {
    /// Process exit code reported for this fault. HALT owns 0.
    pub fn code(&self) -> i32 {
        match self {
            FaultKind::InvalidOpcode { .. } => 1,
            FaultKind::OperandOutOfRange { .. } => 2,
            FaultKind::MailboxUnderflow => 3,
            FaultKind::HeapExhausted { .. } => 4,
            FaultKind::UnsupportedCast { .. } => 5,
            FaultKind::TypeMismatch { .. } => 6,
            FaultKind::UnexpectedEndOfProgram => 7,
            FaultKind::ReturnWithoutCall => 8,
            FaultKind::CallDepthExceeded { .. } => 9,
            FaultKind::Output { .. } => 10,
        }
    }
}

/// A fatal contract violation, tagged with the address of the instruction
/// that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fault at ip {ip}: {kind}")]
pub struct Fault {
    pub kind: FaultKind,
    pub ip: usize,
}

impl Fault {
    pub fn new(kind: FaultKind, ip: usize) -> Self {
        Self { kind, ip }
    }
}

/// Errors raised while turning text or words into a [`Program`](super::Program).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("program is {len} words long, the limit is {limit}")]
    ProgramTooLarge { len: usize, limit: usize },
    #[error("line {line}: unknown mnemonic `{token}`")]
    UnknownMnemonic { line: usize, token: String },
    #[error("line {line}: invalid word `{token}`")]
    InvalidWord { line: usize, token: String },
    #[error("line {line}: {mnemonic} takes {expected} operands, got {actual}")]
    ArityMismatch {
        line: usize,
        mnemonic: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("line {line}: duplicate label `{label}`")]
    DuplicateLabel { line: usize, label: String },
    #[error("line {line}: undefined label `{label}`")]
    UndefinedLabel { line: usize, label: String },
}
