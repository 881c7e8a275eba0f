use super::bytecode::Reg;
use super::constants::REGISTER_COUNT;
use super::error::FaultKind;
use super::value::Value;

/// The global register file. Every cell starts as integer 0.
#[derive(Debug, Clone)]
pub struct RegisterFile {
    regs: [Value; REGISTER_COUNT],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            regs: [Value::default(); REGISTER_COUNT],
        }
    }

    /// Checks that `reg` names a register without reading it.
    pub fn check(reg: Reg) -> Result<usize, FaultKind> {
        let idx = reg as usize;

        if idx < REGISTER_COUNT {
            Ok(idx)
        } else {
            Err(FaultKind::OperandOutOfRange {
                operand: "register",
                index: idx,
                limit: REGISTER_COUNT,
            })
        }
    }

    pub fn get(&self, reg: Reg) -> Result<Value, FaultKind> {
        Ok(self.regs[Self::check(reg)?])
    }

    pub fn get_int(&self, reg: Reg) -> Result<u16, FaultKind> {
        self.get(reg)?.as_int()
    }

    pub fn set(&mut self, reg: Reg, val: Value) -> Result<(), FaultKind> {
        self.regs[Self::check(reg)?] = val;
        Ok(())
    }

    /// Writes a value recorded by a frame. Frame entries only exist for
    /// indexes that already passed [`RegisterFile::check`].
    pub(crate) fn restore(&mut self, idx: usize, val: Value) {
        self.regs[idx] = val;
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.regs
    }
}
